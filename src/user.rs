//! Code for creating the user table, onboarding users, and deleting them.
//!
//! Onboarding is atomic: a user row and its zero-balance account are
//! created in one transaction, so a user visible to the rest of the
//! application always owns an account. Deletion is the mirror image, and
//! also removes every relation edge that references the user from either
//! side.

use std::fmt::Display;

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{Error, account::ensure_account, relation::remove_user_cascade, role::Role};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to
/// better compile time errors, and more flexible generics that can have
/// distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, unique across the application.
    pub email: String,
    /// The display name shown to the user's relations.
    pub username: String,
    /// The user's highest role.
    pub role: Role,
}

/// Create the user table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub(crate) fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user'
        )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let id = UserID::new(row.get(0)?);
    let email = row.get(1)?;
    let username = row.get(2)?;
    let role_text: String = row.get(3)?;

    let role = Role::from_str(&role_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown role \"{role_text}\"").into(),
        )
    })?;

    Ok(User {
        id,
        email,
        username,
        role,
    })
}

/// Onboard a new user: insert the user row and attach a zero-balance
/// account, atomically.
///
/// New users get the [Role::User] role.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateEmail] if `email` is already registered,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn create_user(email: &str, username: &str, connection: &Connection) -> Result<User, Error> {
    let tx = connection.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO user (email, username, role) VALUES (?1, ?2, ?3)",
        (email, username, Role::User.as_str()),
    )?;
    let id = UserID::new(tx.last_insert_rowid());

    ensure_account(id, &tx)?;

    tx.commit()?;

    tracing::debug!("user {} created", id);

    Ok(User {
        id,
        email: email.to_owned(),
        username: username.to_owned(),
        role: Role::User,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, username, role FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if no user is registered with `email`,
/// - or [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, username, role FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_row_to_user)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound(email.to_owned()),
            error => error.into(),
        })
}

/// Delete `user_id` along with their account and every relation edge that
/// references them, as one atomic unit.
///
/// Transfer records are kept: they reference accounts by a non-owning
/// association and serve as an audit trail.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let tx = connection.unchecked_transaction()?;

    remove_user_cascade(user_id, &tx)?;

    tx.execute(
        "DELETE FROM account WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;

    let rows_deleted = tx.execute("DELETE FROM user WHERE id = ?1", (user_id.as_i64(),))?;
    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    tx.commit()?;

    tracing::debug!("user {} deleted", user_id);

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, account::get_account_for_user, db::initialize, role::Role, user::UserID,
    };

    use super::{create_user, delete_user, get_user_by_email, get_user_by_id};

    fn get_test_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        connection
    }

    #[test]
    fn create_user_attaches_zero_balance_account() {
        let connection = get_test_connection();

        let user = create_user("alice@example.com", "alice", &connection).unwrap();

        assert!(user.id.as_i64() > 0);
        assert_eq!(user.role, Role::User);

        let account = get_account_for_user(user.id, &connection).unwrap();
        assert_eq!(account.user_id, user.id);
        assert_eq!(account.balance, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn create_user_rejects_duplicate_email() {
        let connection = get_test_connection();
        create_user("alice@example.com", "alice", &connection).unwrap();

        let result = create_user("alice@example.com", "alice2", &connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let connection = get_test_connection();
        let test_user = create_user("alice@example.com", "alice", &connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_reports_missing_target() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_email("nobody@example.com", &connection),
            Err(Error::UserNotFound("nobody@example.com".to_owned()))
        );
    }

    #[test]
    fn delete_user_removes_user_and_account() {
        let connection = get_test_connection();
        let user = create_user("alice@example.com", "alice", &connection).unwrap();

        delete_user(user.id, &connection).unwrap();

        assert_eq!(get_user_by_id(user.id, &connection), Err(Error::NotFound));
        assert_eq!(
            get_account_for_user(user.id, &connection),
            Err(Error::AccountNotFound(user.id))
        );
    }

    #[test]
    fn delete_user_fails_with_non_existent_id() {
        let connection = get_test_connection();

        assert_eq!(
            delete_user(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }
}
