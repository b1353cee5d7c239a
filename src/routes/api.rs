use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// Thin pass-through endpoints used by the dashboard. Every route forwards to
/// the external backend with the `token` cookie as bearer credential and
/// relays the backend's status and body.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // POST /api/login
        // Forwards credentials and stores the returned tokens as HTTP-only cookies.
        .route("/login", post(handlers::login))
        // GET /api/status?invoice=...
        .route("/status", get(handlers::get_order_status))
        // GET /api/delivery/start?id=...
        .route("/delivery/start", get(handlers::start_delivery))
        .route(
            "/deliveries/{delivery_id}/invoices/{invoice_id}",
            get(handlers::get_delivery_invoice)
                .post(handlers::add_delivery_invoice)
                .delete(handlers::remove_delivery_invoice),
        )
        // POST /api/deliveries/{deliveryId}/invoices/{invoiceId}/deliver
        // Proof of delivery: remarks plus the device position.
        .route(
            "/deliveries/{delivery_id}/invoices/{invoice_id}/deliver",
            post(handlers::deliver_invoice),
        )
}
