use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Request Payloads (exported to the dashboard) ---

/// LoginRequest
///
/// Credentials submitted by the login form. Forwarded unchanged to the
/// backend's `/auth/login`; this service never stores or inspects them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// GeoPoint
///
/// Position captured by the delivery man's device when an invoice is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// DeliverInvoiceRequest
///
/// Proof-of-delivery body for `POST /api/deliveries/{deliveryId}/invoices/{invoiceId}/deliver`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeliverInvoiceRequest {
    #[serde(default)]
    pub remarks: String,
    pub location: GeoPoint,
}

/// ApiMessage
///
/// The `{ "message": ... }` body used for every reply this service writes itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Query Parameters ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Invoice number to look up.
    #[serde(default)]
    pub invoice: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeliveryIdQuery {
    /// Delivery to start.
    #[serde(default)]
    pub id: String,
}

// --- Backend Envelopes ---

/// LoginEnvelope
///
/// Shape of a successful `/auth/login` reply from the backend:
/// `{ "data": { "token": ..., "refreshToken": ... } }`.
#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    pub data: LoginTokens,
}

#[derive(Debug, Deserialize)]
pub struct LoginTokens {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}
