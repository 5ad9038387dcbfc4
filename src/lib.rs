pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

#[cfg(test)]
mod test;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::PaymentStore,
    handlers::{PaymentState, pages, payment},
};

/// Build the application router over an initialized payment store
pub fn create_router(payment_store: PaymentStore) -> Router {
    let state = PaymentState { payment_store };

    Router::new()
        // API endpoints
        .route("/api/health", get(payment::health))
        .route(
            "/api/records",
            get(payment::list_records).post(payment::create_record),
        )
        .route(
            "/api/records/{id}",
            get(payment::get_record)
                .put(payment::update_record)
                .delete(payment::delete_record),
        )
        .route("/api/payments", get(payment::filter_payments))
        // Pages
        .route("/", get(pages::welcome_page))
        .route("/addentry", get(pages::add_entry_page))
        .route("/editentry", get(pages::edit_entry_page))
        .route("/filterpayments", get(pages::filter_payments_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
