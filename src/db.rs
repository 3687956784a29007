//! Database initialization.

use rusqlite::Connection;

use crate::{
    Error, account::create_account_table, relation::create_relation_table,
    transfer::create_transfer_table, user::create_user_table,
};

/// Create the tables for the domain models and enable foreign key
/// enforcement on `connection`.
///
/// Safe to call on an already initialized database.
///
/// # Errors
/// Returns an [Error::SqlError] if an unexpected SQL error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let tx = connection.unchecked_transaction()?;

    create_user_table(&tx)?;
    create_account_table(&tx)?;
    create_relation_table(&tx)?;
    create_transfer_table(&tx)?;

    tx.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_succeeds_on_fresh_database() {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        initialize(&connection).unwrap();

        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let connection =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&connection).unwrap();

        let result = connection.execute(
            "INSERT INTO relation (owner_id, contact_id) VALUES (1, 2)",
            (),
        );

        assert!(result.is_err(), "Want FK violation for missing users");
    }
}
