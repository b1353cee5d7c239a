use crate::{
    AppState,
    auth::{REFRESH_COOKIE, REFRESH_MAX_AGE_SECS, SessionToken, TOKEN_COOKIE, TOKEN_MAX_AGE_SECS},
    backend::{BackendCall, BackendReply},
    models::{
        ApiMessage, DeliverInvoiceRequest, DeliveryIdQuery, LoginEnvelope, LoginRequest,
        StatusQuery,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

// --- Reply Helpers ---

fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(ApiMessage::new(text))).into_response()
}

/// Relays the backend's status and JSON body unchanged.
fn relay(reply: BackendReply) -> Response {
    (reply.status, Json(reply.body)).into_response()
}

/// session_cookie
///
/// Builds one of the two session cookies. Both are HTTP-only, secure and
/// cross-site so the dashboard can be served from a different origin.
fn session_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// forward_authorized
///
/// Shared path of every proxy route that needs a session: reject with 401
/// when the `token` cookie is missing, otherwise forward with it as bearer and
/// relay whatever the backend answers.
async fn forward_authorized(state: &AppState, token: SessionToken, call: BackendCall) -> Response {
    let Some(token) = token.0 else {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    match state.backend.send(call.bearer(token)).await {
        Ok(reply) => relay(reply),
        Err(e) => {
            tracing::error!(error = %e, "backend call failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// --- Handlers ---

/// login
///
/// [Public Route] Exchanges credentials for a session. The backend issues the
/// tokens; this handler only moves them into HTTP-only cookies so scripts in
/// the page never see them.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookies set", body = ApiMessage),
        (status = 401, description = "Rejected by the backend", body = ApiMessage),
        (status = 500, description = "Backend unreachable", body = ApiMessage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Response {
    let call = BackendCall::new(Method::POST, ["auth", "login"]).json(serde_json::json!({
        "email": payload.email,
        "password": payload.password,
    }));

    let reply = match state.backend.send(call).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "login request failed");
            return message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    if !reply.status.is_success() {
        tracing::info!(status = %reply.status, "login rejected by backend");
        let text = reply.message().unwrap_or("Login failed").to_string();
        return message(reply.status, text);
    }

    let tokens = match serde_json::from_value::<LoginEnvelope>(reply.body) {
        Ok(envelope) => envelope.data,
        Err(e) => {
            tracing::error!(error = %e, "login reply is missing tokens");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Login reply is missing tokens");
        }
    };

    let jar = jar
        .add(session_cookie(TOKEN_COOKIE, tokens.token, TOKEN_MAX_AGE_SECS))
        .add(session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token,
            REFRESH_MAX_AGE_SECS,
        ));

    (jar, Json(ApiMessage::new("Login successful"))).into_response()
}

/// get_order_status
///
/// [Public Route] Looks up an order by invoice number. The session token is
/// forwarded when present; the backend decides whether it is needed.
#[utoipa::path(
    get,
    path = "/api/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Order status from the backend"),
        (status = 500, description = "Backend unreachable", body = ApiMessage)
    )
)]
pub async fn get_order_status(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<StatusQuery>,
) -> Response {
    let call = BackendCall::new(Method::GET, ["orders", "status", query.invoice.as_str()])
        .bearer(token.0.unwrap_or_default());

    match state.backend.send(call).await {
        Ok(reply) if reply.status.is_success() => relay(reply),
        Ok(reply) => {
            let text = reply
                .message()
                .unwrap_or("Failed to fetch order status")
                .to_string();
            message(reply.status, text)
        }
        Err(e) => {
            tracing::error!(error = %e, "order status lookup failed");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// start_delivery
///
/// [Session Route] Marks a delivery as started.
#[utoipa::path(
    get,
    path = "/api/delivery/start",
    params(DeliveryIdQuery),
    responses(
        (status = 200, description = "Backend reply"),
        (status = 401, description = "No session cookie", body = ApiMessage)
    )
)]
pub async fn start_delivery(
    State(state): State<AppState>,
    token: SessionToken,
    Query(query): Query<DeliveryIdQuery>,
) -> Response {
    let call = BackendCall::new(Method::GET, ["delivery", "start", query.id.as_str()]);
    forward_authorized(&state, token, call).await
}

fn invoice_call(method: Method, delivery_id: &str, invoice_id: &str) -> BackendCall {
    BackendCall::new(method, ["deliveries", delivery_id, "invoices", invoice_id])
}

/// get_delivery_invoice
///
/// [Session Route] Reads one invoice of a delivery.
#[utoipa::path(
    get,
    path = "/api/deliveries/{deliveryId}/invoices/{invoiceId}",
    params(
        ("deliveryId" = String, Path, description = "Delivery ID"),
        ("invoiceId" = String, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Backend reply"),
        (status = 401, description = "No session cookie", body = ApiMessage)
    )
)]
pub async fn get_delivery_invoice(
    State(state): State<AppState>,
    token: SessionToken,
    Path((delivery_id, invoice_id)): Path<(String, String)>,
) -> Response {
    let call = invoice_call(Method::GET, &delivery_id, &invoice_id);
    forward_authorized(&state, token, call).await
}

/// add_delivery_invoice
///
/// [Session Route] Attaches an invoice to a delivery.
#[utoipa::path(
    post,
    path = "/api/deliveries/{deliveryId}/invoices/{invoiceId}",
    params(
        ("deliveryId" = String, Path, description = "Delivery ID"),
        ("invoiceId" = String, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Backend reply"),
        (status = 401, description = "No session cookie", body = ApiMessage)
    )
)]
pub async fn add_delivery_invoice(
    State(state): State<AppState>,
    token: SessionToken,
    Path((delivery_id, invoice_id)): Path<(String, String)>,
) -> Response {
    let call = invoice_call(Method::POST, &delivery_id, &invoice_id);
    forward_authorized(&state, token, call).await
}

/// remove_delivery_invoice
///
/// [Session Route] Detaches an invoice from a delivery.
#[utoipa::path(
    delete,
    path = "/api/deliveries/{deliveryId}/invoices/{invoiceId}",
    params(
        ("deliveryId" = String, Path, description = "Delivery ID"),
        ("invoiceId" = String, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Backend reply"),
        (status = 401, description = "No session cookie", body = ApiMessage)
    )
)]
pub async fn remove_delivery_invoice(
    State(state): State<AppState>,
    token: SessionToken,
    Path((delivery_id, invoice_id)): Path<(String, String)>,
) -> Response {
    let call = invoice_call(Method::DELETE, &delivery_id, &invoice_id);
    forward_authorized(&state, token, call).await
}

/// deliver_invoice
///
/// [Session Route] Records proof of delivery (remarks and device position)
/// for one invoice.
#[utoipa::path(
    post,
    path = "/api/deliveries/{deliveryId}/invoices/{invoiceId}/deliver",
    params(
        ("deliveryId" = String, Path, description = "Delivery ID"),
        ("invoiceId" = String, Path, description = "Invoice ID")
    ),
    request_body = DeliverInvoiceRequest,
    responses(
        (status = 200, description = "Backend reply"),
        (status = 400, description = "Body is not a delivery record", body = ApiMessage),
        (status = 401, description = "No session cookie", body = ApiMessage)
    )
)]
pub async fn deliver_invoice(
    State(state): State<AppState>,
    token: SessionToken,
    Path((delivery_id, invoice_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    // The session check comes before the body is looked at.
    if token.0.is_none() {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let payload = match serde_json::from_slice::<DeliverInvoiceRequest>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::info!(error = %e, "rejected deliver request body");
            return message(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let body = serde_json::json!({
        "remarks": payload.remarks,
        "location": payload.location,
    });
    let call = BackendCall::new(
        Method::POST,
        [
            "deliveries",
            delivery_id.as_str(),
            "invoices",
            invoice_id.as_str(),
            "deliver",
        ],
    )
    .json(body);
    forward_authorized(&state, token, call).await
}
