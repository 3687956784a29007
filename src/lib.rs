//! Paymate is the storage and transfer core for a peer-to-peer money
//! transfer app: users link a single balance-bearing account, add other
//! users as relations, and move funds to them with a fixed 5% fee deducted
//! on receipt.
//!
//! This library owns the data model, the SQLite persistence, and the
//! transfer invariants. Routing, templating, and authentication live in the
//! server that embeds it; every operation here takes the caller's identity
//! as an explicit [UserID].

#![warn(missing_docs)]

mod account;
mod database_id;
mod db;
mod money;
mod relation;
mod role;
mod transfer;
mod user;

pub use account::{Account, AccountId, ensure_account, get_account_for_user};
pub use database_id::DatabaseID;
pub use db::initialize;
pub use money::{amount_received, fee_rate};
pub use relation::{
    Contact, Relation, add_relation, get_contacts, get_relations, remove_relation,
    remove_user_cascade, resolve_contact,
};
pub use role::Role;
pub use transfer::{
    DEFAULT_CURRENCY, Transfer, TransferForm, execute_transfer, get_transfers_for_account,
    submit_transfer,
};
pub use user::{User, UserID, create_user, delete_user, get_user_by_email, get_user_by_id};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The sender's balance is less than the amount they tried to send.
    ///
    /// The transfer is rejected before any balance is touched; the caller
    /// should retry with a smaller amount.
    #[error("the amount to send exceeds the account balance")]
    InsufficientFunds,

    /// A negative amount was passed to the transfer engine.
    #[error("cannot transfer a negative amount")]
    NegativeAmount,

    /// A transfer form was submitted with an amount of zero or less.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// A transfer form was submitted with a blank description.
    #[error("a description is required")]
    EmptyDescription,

    /// The transfer names a relation that is not in the sender's relation
    /// set.
    #[error("no relation with the username \"{0}\"")]
    RelationNotFound(String),

    /// The email given when adding a relation does not belong to any user.
    #[error("no user with the email \"{0}\"")]
    UserNotFound(String),

    /// A user that should own an account does not.
    ///
    /// Onboarding always attaches an account, so this indicates corrupt
    /// data rather than bad input. It should be logged and reported as an
    /// internal error, never shown as a user-correctable problem.
    #[error("no account exists for user {0}")]
    AccountNotFound(UserID),

    /// A user tried to add themselves as a relation.
    #[error("users cannot add themselves as a relation")]
    SelfRelation,

    /// The relation being added already exists.
    #[error("the relation already exists")]
    DuplicateRelation,

    /// A transfer named the sender's own account as the receiver.
    #[error("an account cannot transfer funds to itself")]
    SelfTransfer,

    /// The email used to register a user is already taken.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("relation.") =>
            {
                Error::DuplicateRelation
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
