//! The role hierarchy for users.
//!
//! Roles form a strict hierarchy (`Admin > Manager > User`) and a role
//! implies every role below it. The hierarchy is an explicit lookup so that
//! a caller holding only a user's highest role can recover the full set.
//! Nothing in the transfer core branches on roles yet; they exist so that
//! role-gated transfer limits can be added without a schema change.

use serde::{Deserialize, Serialize};

/// A user's role within the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Elevated access below [Role::Admin].
    Manager,
    /// The default role given to every registered user.
    User,
}

impl Role {
    /// The full set of roles implied by holding this role, highest first.
    ///
    /// A role always implies itself.
    pub fn implied(self) -> &'static [Role] {
        match self {
            Role::Admin => &[Role::Admin, Role::Manager, Role::User],
            Role::Manager => &[Role::Manager, Role::User],
            Role::User => &[Role::User],
        }
    }

    /// The highest role in `roles`, or [Role::User] if the slice is empty.
    pub fn highest(roles: &[Role]) -> Role {
        if roles.contains(&Role::Admin) {
            Role::Admin
        } else if roles.contains(&Role::Manager) {
            Role::Manager
        } else {
            Role::User
        }
    }

    /// The name stored in the database for this role.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Parse a role from its stored name.
    pub(crate) fn from_str(text: &str) -> Option<Role> {
        match text {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[cfg(test)]
mod role_tests {
    use super::Role;

    #[test]
    fn admin_implies_all_roles() {
        assert_eq!(
            Role::Admin.implied(),
            &[Role::Admin, Role::Manager, Role::User]
        );
    }

    #[test]
    fn manager_implies_user() {
        assert_eq!(Role::Manager.implied(), &[Role::Manager, Role::User]);
    }

    #[test]
    fn user_implies_only_itself() {
        assert_eq!(Role::User.implied(), &[Role::User]);
    }

    #[test]
    fn highest_picks_admin_over_manager() {
        assert_eq!(
            Role::highest(&[Role::User, Role::Manager, Role::Admin]),
            Role::Admin
        );
        assert_eq!(Role::highest(&[Role::Manager, Role::User]), Role::Manager);
    }

    #[test]
    fn highest_defaults_to_user() {
        assert_eq!(Role::highest(&[]), Role::User);
    }

    #[test]
    fn stored_names_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::User] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }

        assert_eq!(Role::from_str("superuser"), None);
    }
}
