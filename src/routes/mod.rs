//! Router Module Index
//!
//! Splits the routing surface by access policy. The policy is attached at the
//! module level (via Axum layers), so a route's protection follows from the
//! module it is registered in.

/// The static bundle (login page, dashboard, assets), entirely behind the
/// access gate.
pub mod pages;

/// JSON proxy routes to the external backend. Not gated: each handler relays
/// the session cookie and the backend enforces access.
pub mod api;
