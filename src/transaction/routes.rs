//! Route handlers for the transaction ledger.
//!
//! Every route here is bearer-gated; reads are additionally scoped to the
//! caller's own rows unless the caller holds the admin role.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    auth::Claims,
    pagination::{PageQuery, Paginated},
    state::DbState,
};

use super::core::{
    MAX_SLUG_LENGTH, Transaction, TransactionData, TransactionQuery, check_references,
    count_transactions, create_transaction, delete_transaction_by_slug, get_transaction_by_slug,
    latest_transactions, list_transactions, update_transaction_by_slug, validate_transaction,
};

/// The `{"latest": [...]}` envelope returned by the latest-transactions
/// route.
#[derive(Debug, Serialize)]
pub struct LatestTransactions {
    /// The newest transactions visible to the caller.
    pub latest: Vec<Transaction>,
}

/// Route handler for listing transactions as a `{data, pagination}` page.
///
/// Non-admin principals see only their own transactions; `pagination.total`
/// counts the rows visible to the caller.
pub async fn get_transactions(
    State(state): State<DbState>,
    claims: Claims,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Transaction>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let owner = claims.ownership_filter();
    let data = list_transactions(
        &TransactionQuery {
            user_id: owner,
            limit: page.limit,
            offset: page.offset,
        },
        &connection,
    )?;
    let total = count_transactions(owner, &connection)?;

    Ok(Json(Paginated::new(data, page, total)))
}

/// Route handler for the ten newest transactions visible to the caller.
pub async fn get_latest_transactions(
    State(state): State<DbState>,
    claims: Claims,
) -> Result<Json<LatestTransactions>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let latest = latest_transactions(claims.ownership_filter(), &connection)?;

    Ok(Json(LatestTransactions { latest }))
}

/// Load the transaction with `slug` and check the caller may see it.
///
/// Non-admin principals get [Error::NotFound] for other users' rows, so the
/// response does not reveal whether the resource exists.
fn get_owned_transaction(
    slug: &str,
    claims: &Claims,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction_by_slug(slug, connection)?;

    if !claims.admin && transaction.user_id != claims.id {
        return Err(Error::NotFound("Transaction"));
    }

    Ok(transaction)
}

/// Route handler for getting a transaction by its slug.
///
/// Slugs longer than [MAX_SLUG_LENGTH] are rejected before any lookup.
pub async fn get_transaction(
    State(state): State<DbState>,
    claims: Claims,
    Path(slug): Path<String>,
) -> Result<Json<Transaction>, Error> {
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(Error::SlugTooLong);
    }

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_owned_transaction(&slug, &claims, &connection).map(Json)
}

/// Route handler for creating a transaction.
///
/// Validation failures return per-field messages rather than a single
/// generic error.
pub async fn create_transaction_endpoint(
    State(state): State<DbState>,
    _claims: Claims,
    payload: Result<Json<TransactionData>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(data) = payload.map_err(|_| Error::MalformedRequest)?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    let mut fields = validate_transaction(&data);
    check_references(&data, &mut fields, &connection)?;
    fields.into_result()?;

    let transaction = create_transaction(&data, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Route handler for updating a transaction by its slug.
///
/// The payload is validated with the same field rules as create; the slug
/// and ID never change.
pub async fn update_transaction_endpoint(
    State(state): State<DbState>,
    claims: Claims,
    Path(slug): Path<String>,
    payload: Result<Json<TransactionData>, JsonRejection>,
) -> Result<Json<Transaction>, Error> {
    let Json(data) = payload.map_err(|_| Error::MalformedRequest)?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    // 404 before 400 so a missing resource is not mistaken for bad data.
    get_owned_transaction(&slug, &claims, &connection)?;

    let mut fields = validate_transaction(&data);
    check_references(&data, &mut fields, &connection)?;
    fields.into_result()?;

    update_transaction_by_slug(&slug, &data, &connection).map(Json)
}

/// Route handler for deleting a transaction by its slug.
pub async fn delete_transaction_endpoint(
    State(state): State<DbState>,
    claims: Claims,
    Path(slug): Path<String>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;

    get_owned_transaction(&slug, &claims, &connection)?;
    delete_transaction_by_slug(&slug, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
