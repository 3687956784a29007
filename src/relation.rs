//! Code for creating the relation table and managing the relation graph.
//!
//! A relation is a directed edge: the owner can see and pay the contact,
//! with no implicit reciprocal edge. Edges are unique per (owner, contact)
//! pair and a user can never be their own contact. When a user is deleted,
//! [remove_user_cascade] removes every edge that references them from
//! either side so no edge outlives its endpoints.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    DatabaseID, Error,
    user::{UserID, get_user_by_email},
};

/// A directed edge letting its owner target another user for transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// The ID of the relation.
    pub id: DatabaseID,
    /// The user who created the relation and may pay the contact.
    pub owner_id: UserID,
    /// The user on the receiving end of the relation.
    pub contact_id: UserID,
}

/// A relation joined with the contact's display name.
///
/// This is the shape the transfer page needs: one entry per relation,
/// identified by the name the owner picks from the "pay to" selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// The ID of the user behind the relation.
    pub user_id: UserID,
    /// The contact's display name.
    pub username: String,
}

/// Create the relation table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub(crate) fn create_relation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS relation (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL REFERENCES user(id),
            contact_id INTEGER NOT NULL REFERENCES user(id),
            UNIQUE(owner_id, contact_id)
        )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_relation(row: &Row) -> Result<Relation, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id = UserID::new(row.get(1)?);
    let contact_id = UserID::new(row.get(2)?);

    Ok(Relation {
        id,
        owner_id,
        contact_id,
    })
}

/// Add a relation from `owner_id` to the user registered with
/// `contact_email`.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if no user is registered with `contact_email`,
/// - [Error::SelfRelation] if the email resolves to `owner_id` themselves,
/// - [Error::DuplicateRelation] if the relation already exists,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn add_relation(
    owner_id: UserID,
    contact_email: &str,
    connection: &Connection,
) -> Result<Relation, Error> {
    let contact = get_user_by_email(contact_email, connection)?;

    if contact.id == owner_id {
        return Err(Error::SelfRelation);
    }

    connection.execute(
        "INSERT INTO relation (owner_id, contact_id) VALUES (?1, ?2)",
        (owner_id.as_i64(), contact.id.as_i64()),
    )?;

    Ok(Relation {
        id: connection.last_insert_rowid(),
        owner_id,
        contact_id: contact.id,
    })
}

/// Get all outgoing relations for `owner_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn get_relations(owner_id: UserID, connection: &Connection) -> Result<Vec<Relation>, Error> {
    connection
        .prepare(
            "SELECT id, owner_id, contact_id FROM relation
             WHERE owner_id = :owner_id
             ORDER BY id",
        )?
        .query_map(&[(":owner_id", &owner_id.as_i64())], map_row_to_relation)?
        .map(|relation| relation.map_err(|error| error.into()))
        .collect()
}

/// Get `owner_id`'s relations joined with each contact's display name, in
/// the order the relations were added.
///
/// This is the list the transfer page renders into its "pay to" selector.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn get_contacts(owner_id: UserID, connection: &Connection) -> Result<Vec<Contact>, Error> {
    connection
        .prepare(
            "SELECT user.id, user.username FROM relation
             INNER JOIN user ON user.id = relation.contact_id
             WHERE relation.owner_id = :owner_id
             ORDER BY relation.id",
        )?
        .query_map(&[(":owner_id", &owner_id.as_i64())], |row| {
            Ok(Contact {
                user_id: UserID::new(row.get(0)?),
                username: row.get(1)?,
            })
        })?
        .map(|contact| contact.map_err(|error| error.into()))
        .collect()
}

/// Resolve the contact named `username` within `owner_id`'s relation set.
///
/// Usernames are not globally unique, so the lookup is scoped to the
/// owner's relations; if two contacts share a name the earliest relation
/// wins, matching the selector's behavior.
///
/// # Errors
/// This function will return a:
/// - [Error::RelationNotFound] if no relation's contact has that username,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn resolve_contact(
    owner_id: UserID,
    username: &str,
    connection: &Connection,
) -> Result<Contact, Error> {
    connection
        .prepare(
            "SELECT user.id, user.username FROM relation
             INNER JOIN user ON user.id = relation.contact_id
             WHERE relation.owner_id = ?1 AND user.username = ?2
             ORDER BY relation.id
             LIMIT 1",
        )?
        .query_row((owner_id.as_i64(), username), |row| {
            Ok(Contact {
                user_id: UserID::new(row.get(0)?),
                username: row.get(1)?,
            })
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::RelationNotFound(username.to_owned()),
            error => error.into(),
        })
}

/// Remove the relation from `owner_id` to `contact_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no such relation exists,
/// - or [Error::SqlError] if an unexpected SQL error occurred.
pub fn remove_relation(
    owner_id: UserID,
    contact_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM relation WHERE owner_id = ?1 AND contact_id = ?2",
        (owner_id.as_i64(), contact_id.as_i64()),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Remove every relation that references `user_id`, as owner or as
/// contact.
///
/// This is both halves of the cleanup that must run when a user is
/// deleted. Callers are expected to run it inside the same transaction
/// that deletes the user row so that no edge ever references a missing
/// user; [crate::user::delete_user] does exactly that.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn remove_user_cascade(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM relation WHERE owner_id = ?1",
        (user_id.as_i64(),),
    )?;

    connection.execute(
        "DELETE FROM relation WHERE contact_id = ?1",
        (user_id.as_i64(),),
    )?;

    Ok(())
}
