//! The transaction ledger: models, validation, database queries and routes.

mod core;
mod routes;

pub use core::{
    MAX_SLUG_LENGTH, Transaction, TransactionData, TransactionQuery, check_references,
    count_transactions, create_transaction, create_transactions_table, delete_transaction_by_slug,
    get_transaction_by_slug, latest_transactions, list_transactions, update_transaction_by_slug,
    validate_transaction,
};
pub use routes::{
    create_transaction_endpoint, delete_transaction_endpoint, get_latest_transactions,
    get_transaction, get_transactions, update_transaction_endpoint,
};
