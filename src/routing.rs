//! Application router configuration.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::get,
    routing::post,
};
use serde_json::json;

use crate::{
    AppState, Error, account, auth, budget, category, endpoints,
    media::{self, MAX_UPLOAD_BYTES, ObjectStorage},
    payment_method, transaction, user,
};

/// Extra room on top of the upload ceiling for multipart framing and the
/// caption field.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Return a router with all the app's routes.
pub fn build_router<S: ObjectStorage>(state: AppState<S>) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_service_descriptor))
        .route(endpoints::REGISTER, post(auth::post_register))
        .route(endpoints::LOGIN, post(auth::post_login))
        .route(endpoints::ME, get(auth::get_me))
        .route(endpoints::UPLOAD_IMAGE, post(media::upload_image::<S>))
        .route(endpoints::IMAGES, get(media::get_images))
        .route(endpoints::ACCOUNTS, get(account::get_accounts))
        .route(
            endpoints::TRANSACTIONS,
            get(transaction::get_transactions).post(transaction::create_transaction_endpoint),
        )
        .route(
            endpoints::LATEST_TRANSACTIONS,
            get(transaction::get_latest_transactions),
        )
        .route(
            endpoints::TRANSACTION,
            get(transaction::get_transaction)
                .patch(transaction::update_transaction_endpoint)
                .delete(transaction::delete_transaction_endpoint),
        )
        .route(endpoints::USERS, get(user::get_users))
        .route(endpoints::USER, get(user::get_user))
        .route(endpoints::CATEGORIES, get(category::get_categories))
        .route(endpoints::CATEGORY, get(category::get_category))
        .route(endpoints::BUDGETS, get(budget::get_budgets))
        .route(endpoints::BUDGET, get(budget::get_budget))
        .route(
            endpoints::PAYMENT_METHODS,
            get(payment_method::get_payment_methods),
        )
        .route(
            endpoints::PAYMENT_METHOD,
            get(payment_method::get_payment_method),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_OVERHEAD))
        .fallback(get_not_found)
        .with_state(state)
}

/// The unauthenticated service descriptor served at the root.
async fn get_service_descriptor() -> impl IntoResponse {
    Json(json!({
        "name": "Transactions API",
        "description": "API to manage transactions",
        "_links": {
            "self": { "href": endpoints::ROOT, "method": "GET" },
            "transactions": { "href": endpoints::TRANSACTIONS, "method": "GET" },
            "categories": { "href": endpoints::CATEGORIES, "method": "GET" },
            "budgets": { "href": endpoints::BUDGETS, "method": "GET" },
            "payment_methods": { "href": endpoints::PAYMENT_METHODS, "method": "GET" },
            "users": { "href": endpoints::USERS, "method": "GET" },
            "accounts": { "href": endpoints::ACCOUNTS, "method": "GET" },
        },
    }))
}

/// The JSON 404 returned for unknown paths.
async fn get_not_found() -> Error {
    Error::NotFound("Resource")
}
