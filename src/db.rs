//! Sets up the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_accounts_table, budget::create_budgets_table,
    category::create_categories_table, media::create_images_table,
    payment_method::create_payment_methods_table, transaction::create_transactions_table,
    user::create_users_table,
};

/// Create the tables for all of the domain models.
///
/// The tables are created in a single exclusive transaction so a partially
/// initialized schema is never left behind.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_users_table(&transaction)?;
    create_accounts_table(&transaction)?;
    create_categories_table(&transaction)?;
    create_payment_methods_table(&transaction)?;
    create_budgets_table(&transaction)?;
    create_transactions_table(&transaction)?;
    create_images_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
