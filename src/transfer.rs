//! The transfer engine: validating and atomically applying funds movements
//! between two accounts.
//!
//! A transfer debits the gross amount from the sender, credits the net
//! amount (after the 5% fee) to the receiver, and appends an immutable
//! [Transfer] record, all inside a single SQLite transaction. The fee is
//! not credited anywhere; it is simply the gap between the two amounts.
//!
//! Balances are re-read inside the engine's transaction so that the
//! sufficient-funds check can never pass against a stale snapshot, and both
//! balance updates are applied in ascending account-id order.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    DatabaseID, Error,
    account::{Account, AccountId, get_account, get_account_for_user, set_balance},
    money::{amount_received, decimal_from_row},
    relation::resolve_contact,
    user::UserID,
};

/// The currency label attached to new transfer records.
pub const DEFAULT_CURRENCY: &str = "€";

/// An immutable record of one funds movement between two accounts.
///
/// Records reference accounts by a non-owning association: deleting an
/// account leaves its transfer history in place as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// The ID of the transfer.
    pub id: DatabaseID,
    /// The account the gross amount was debited from.
    pub sender_id: AccountId,
    /// The account the net amount was credited to.
    pub receiver_id: AccountId,
    /// The gross amount debited from the sender.
    pub amount_sent: Decimal,
    /// The net amount credited to the receiver, after the fee.
    pub amount_received: Decimal,
    /// What the transfer was for.
    pub description: String,
    /// The currency label for both amounts.
    pub currency: String,
    /// When the transfer was applied, in UTC.
    pub created_at: OffsetDateTime,
}

/// The data the transfer page submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferForm {
    /// The display name of the relation to pay, as picked from the "pay to"
    /// selector.
    pub relation: String,
    /// What the transfer is for. Must not be blank.
    pub description: String,
    /// The gross amount to send. Must be greater than zero.
    pub amount: Decimal,
}

/// Create the transfer table.
///
/// The account columns deliberately carry no foreign key: records must
/// survive the deletion of either account.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub(crate) fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfer (
            id INTEGER PRIMARY KEY,
            sender_id INTEGER NOT NULL,
            receiver_id INTEGER NOT NULL,
            amount_sent TEXT NOT NULL,
            amount_received TEXT NOT NULL,
            description TEXT NOT NULL,
            currency TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_transfer(row: &Row) -> Result<Transfer, rusqlite::Error> {
    let id = row.get(0)?;
    let sender_id = row.get(1)?;
    let receiver_id = row.get(2)?;
    let amount_sent = decimal_from_row(row, 3)?;
    let amount_received = decimal_from_row(row, 4)?;
    let description = row.get(5)?;
    let currency = row.get(6)?;
    let created_at = row.get(7)?;

    Ok(Transfer {
        id,
        sender_id,
        receiver_id,
        amount_sent,
        amount_received,
        description,
        currency,
        created_at,
    })
}

/// Atomically move `amount_sent` from `sender` to `receiver`, crediting
/// the receiver with the amount net of the fee, and record the movement.
///
/// Zero-amount transfers are permitted and behave as a recorded no-op.
/// Both balance mutations and the record insert commit as one unit; on any
/// failure the transaction rolls back and no partial effect is visible.
///
/// # Errors
/// This function will return an:
/// - [Error::NegativeAmount] if `amount_sent` is below zero,
/// - [Error::SelfTransfer] if `sender` and `receiver` are the same account,
/// - [Error::InsufficientFunds] if the sender's balance is below
///   `amount_sent`; the balances checked are the ones re-read inside the
///   transaction, not the snapshots passed in,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn execute_transfer(
    sender: &Account,
    receiver: &Account,
    amount_sent: Decimal,
    description: &str,
    connection: &Connection,
) -> Result<Transfer, Error> {
    if amount_sent < Decimal::ZERO {
        return Err(Error::NegativeAmount);
    }

    if sender.id == receiver.id {
        return Err(Error::SelfTransfer);
    }

    let tx = connection.unchecked_transaction()?;

    let sender = get_account(sender.id, &tx)?;
    let receiver = get_account(receiver.id, &tx)?;

    if sender.balance < amount_sent {
        return Err(Error::InsufficientFunds);
    }

    let amount_received = amount_received(amount_sent);

    let mut balance_updates = [
        (sender.id, sender.balance - amount_sent),
        (receiver.id, receiver.balance + amount_received),
    ];
    balance_updates.sort_by_key(|(account_id, _)| *account_id);

    for (account_id, balance) in balance_updates {
        set_balance(account_id, balance, &tx)?;
    }

    let transfer = tx
        .prepare(
            "INSERT INTO transfer
                (sender_id, receiver_id, amount_sent, amount_received,
                 description, currency, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, sender_id, receiver_id, amount_sent,
                 amount_received, description, currency, created_at",
        )?
        .query_row(
            (
                sender.id,
                receiver.id,
                amount_sent.to_string(),
                amount_received.to_string(),
                description,
                DEFAULT_CURRENCY,
                OffsetDateTime::now_utc(),
            ),
            map_row_to_transfer,
        )?;

    tx.commit()?;

    tracing::debug!(
        "transfer {} applied: account {} sent {} to account {}",
        transfer.id,
        sender.id,
        amount_sent,
        receiver.id
    );

    Ok(transfer)
}

/// Handle a submitted transfer form on behalf of `sender`.
///
/// Validates the form, resolves the named relation to the receiving
/// account, and hands over to [execute_transfer].
///
/// # Errors
/// This function will return an:
/// - [Error::EmptyDescription] if the description is blank,
/// - [Error::NonPositiveAmount] if the amount is zero or less,
/// - [Error::RelationNotFound] if `sender` has no relation with the given
///   name,
/// - [Error::AccountNotFound] if either user is missing their account,
///   which indicates corrupt data,
/// - or any error from [execute_transfer].
pub fn submit_transfer(
    sender: UserID,
    form: &TransferForm,
    connection: &Connection,
) -> Result<Transfer, Error> {
    if form.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if form.amount <= Decimal::ZERO {
        return Err(Error::NonPositiveAmount);
    }

    let contact = resolve_contact(sender, &form.relation, connection)?;

    let sender_account = get_account_for_user(sender, connection)?;
    let receiver_account = get_account_for_user(contact.user_id, connection)?;

    execute_transfer(
        &sender_account,
        &receiver_account,
        form.amount,
        &form.description,
        connection,
    )
}

/// Get every transfer sent or received by account `account_id`, latest
/// first.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn get_transfers_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(
            "SELECT id, sender_id, receiver_id, amount_sent, amount_received,
                 description, currency, created_at
             FROM transfer
             WHERE sender_id = :id OR receiver_id = :id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":id", &account_id)], map_row_to_transfer)?
        .map(|transfer| transfer.map_err(|error| error.into()))
        .collect()
}
