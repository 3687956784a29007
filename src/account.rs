//! Code for creating the account table and managing account lifecycles.
//!
//! Each user owns at most one account, created with a zero balance when the
//! user is onboarded. Balances are only ever mutated by the transfer engine
//! in [crate::transfer].

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, money::decimal_from_row, user::UserID};

/// Alias for the integer type used for account IDs.
pub type AccountId = i64;

/// A balance-bearing account owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The ID of the user who owns the account.
    pub user_id: UserID,
    /// The funds available to the owner.
    pub balance: Decimal,
}

/// Create the account table.
///
/// The `UNIQUE` constraint on `user_id` is what enforces the one account
/// per user rule at the storage level.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub(crate) fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL UNIQUE REFERENCES user(id),
            balance TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let balance = decimal_from_row(row, 2)?;

    Ok(Account {
        id,
        user_id,
        balance,
    })
}

/// Ensure `user_id` owns an account, creating one with a zero balance if
/// they do not.
///
/// Calling this twice for the same user is a no-op the second time; the
/// existing account is returned untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn ensure_account(user_id: UserID, connection: &Connection) -> Result<Account, Error> {
    match get_account_for_user(user_id, connection) {
        Ok(account) => Ok(account),
        Err(Error::AccountNotFound(_)) => {
            connection.execute(
                "INSERT INTO account (user_id, balance) VALUES (?1, ?2)",
                (user_id.as_i64(), Decimal::ZERO.to_string()),
            )?;

            Ok(Account {
                id: connection.last_insert_rowid(),
                user_id,
                balance: Decimal::ZERO,
            })
        }
        Err(error) => Err(error),
    }
}

/// Get the account owned by `user_id`.
///
/// # Errors
/// This function will return an:
/// - [Error::AccountNotFound] if `user_id` has never been given an account.
///   Onboarding always attaches one, so this is a data-integrity error
///   rather than a normal user-facing error.
/// - [Error::SqlError] if there was an error trying to access the store.
pub fn get_account_for_user(user_id: UserID, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, user_id, balance FROM account WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound(user_id),
            error => error.into(),
        })
}

/// Get an account by its ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an account,
/// - or [Error::SqlError] if there was an error trying to access the store.
pub(crate) fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, user_id, balance FROM account WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| error.into())
}

/// Overwrite the balance of account `id`.
///
/// Only the transfer engine writes balances, and only from within its
/// transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an account,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub(crate) fn set_balance(
    id: AccountId,
    balance: Decimal,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (balance.to_string(), id),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
