//! Access Gate
//!
//! Request-time authorization for the login page and the dashboard. For every
//! request it matches, the gate verifies the `token` cookie, works out the
//! caller's role and answers with one of three dispositions: let the request
//! through, send the caller to `/login`, or send the caller to their own home.
//!
//! The gate keeps no state between requests. Each invocation verifies the
//! credential again, so the same request always gets the same answer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use percent_encoding::percent_decode_str;

use crate::auth::{Claims, Role, SessionToken, VerifierState};

/// Public login page.
pub const LOGIN_PATH: &str = "/login";

const LOGIN_SEGMENT: &str = "login";
const DASHBOARD_SEGMENT: &str = "dashboard";

/// RouteClass
///
/// What the gate knows about a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// The public login page.
    Login,
    /// Exactly `/dashboard`: needs a credential, resolves to the role's home.
    DashboardRoot,
    /// Under `/dashboard` but outside every role scope (e.g. `/dashboard/status`).
    Dashboard,
    /// Inside the subtree reserved for one role.
    Scoped(Role),
    /// Neither the login page nor the protected namespace.
    Unmatched,
}

impl RouteClass {
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            RouteClass::DashboardRoot | RouteClass::Dashboard | RouteClass::Scoped(_)
        )
    }
}

/// classify
///
/// Maps a request path to its `RouteClass`. The path is read the way the
/// static file service reads it: percent-decoded as a whole before it is split,
/// so `%2F` separates segments and `%61dmin` is `admin`. Empty and `.` segments
/// are skipped and `..` removes the previous segment.
pub fn classify(path: &str) -> RouteClass {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    match segments.as_slice() {
        [LOGIN_SEGMENT] => RouteClass::Login,
        [DASHBOARD_SEGMENT] => RouteClass::DashboardRoot,
        [DASHBOARD_SEGMENT, scope, ..] => match Role::from_scope_segment(scope) {
            Some(role) => RouteClass::Scoped(role),
            None => RouteClass::Dashboard,
        },
        _ => RouteClass::Unmatched,
    }
}

/// Disposition
///
/// The gate's answer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Continue to the page handler.
    PassThrough,
    /// Unauthenticated caller on a protected path.
    RedirectToLogin,
    /// Authenticated caller on the login page, the dashboard root, or another role's area.
    RedirectToHome(Role),
}

impl Disposition {
    /// Redirect target, or `None` for pass-through.
    pub fn location(self) -> Option<&'static str> {
        match self {
            Disposition::PassThrough => None,
            Disposition::RedirectToLogin => Some(LOGIN_PATH),
            Disposition::RedirectToHome(role) => Some(role.home()),
        }
    }
}

/// decide
///
/// The decision table. `role` is the caller's role when a credential was
/// presented and verified, `None` otherwise (absent, malformed, forged and
/// expired credentials all look the same here).
pub fn decide(route: RouteClass, role: Option<Role>) -> Disposition {
    match (route, role) {
        // An authenticated session never sees the login form.
        (RouteClass::Login, Some(role)) => Disposition::RedirectToHome(role),
        (RouteClass::Login, None) => Disposition::PassThrough,

        // The gate does not gate paths it does not own.
        (RouteClass::Unmatched, _) => Disposition::PassThrough,

        (RouteClass::DashboardRoot | RouteClass::Dashboard | RouteClass::Scoped(_), None) => {
            Disposition::RedirectToLogin
        }

        (RouteClass::DashboardRoot, Some(role)) => Disposition::RedirectToHome(role),

        // Wrong area: steer the caller back to their own home, not to login.
        (RouteClass::Scoped(required), Some(role)) if required != role => {
            Disposition::RedirectToHome(role)
        }

        (RouteClass::Scoped(_) | RouteClass::Dashboard, Some(_)) => Disposition::PassThrough,
    }
}

/// AccessGate
///
/// Couples the decision table with the injected token verifier.
#[derive(Clone)]
pub struct AccessGate {
    verifier: VerifierState,
}

impl AccessGate {
    pub fn new(verifier: VerifierState) -> Self {
        Self { verifier }
    }

    /// evaluate
    ///
    /// Verifies `token` (at most once) and decides the disposition for `path`.
    /// Verification failures are absorbed here.
    pub async fn evaluate(&self, path: &str, token: Option<&str>) -> Disposition {
        let route = classify(path);

        let claims = match token {
            Some(token) => match self.verifier.verify(token).await {
                Ok(claims) => Some(claims),
                Err(e) => {
                    // Only the failure reason is logged, never the token itself.
                    tracing::debug!(?route, reason = %e, "credential rejected");
                    None
                }
            },
            None => None,
        };

        let disposition = decide(route, claims.as_ref().map(|c| c.role));
        tracing::debug!(
            ?route,
            protected = route.is_protected(),
            ?disposition,
            authenticated = claims.is_some(),
            expires_at = ?claims.as_ref().and_then(Claims::expires_at),
            "access gate decision"
        );

        disposition
    }
}

impl IntoResponse for Disposition {
    fn into_response(self) -> Response {
        match self.location() {
            Some(location) => Redirect::temporary(location).into_response(),
            // Pass-through never reaches the client as a response of its own;
            // the middleware forwards instead. An empty 200 keeps this total.
            None => ().into_response(),
        }
    }
}

/// access_gate
///
/// Axum middleware wrapping the static page service. Redirects are emitted
/// here; a pass-through forwards the request untouched.
pub async fn access_gate(
    State(gate): State<AccessGate>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let token = SessionToken::from_jar(&jar);
    let disposition = gate.evaluate(request.uri().path(), token.as_deref()).await;

    match disposition {
        Disposition::PassThrough => next.run(request).await,
        redirect => redirect.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_login_and_dashboard() {
        assert_eq!(classify("/login"), RouteClass::Login);
        assert_eq!(classify("/login/"), RouteClass::Login);
        assert_eq!(classify("/dashboard"), RouteClass::DashboardRoot);
        assert_eq!(classify("/dashboard/"), RouteClass::DashboardRoot);
        assert_eq!(classify("/dashboard/status"), RouteClass::Dashboard);
        assert_eq!(
            classify("/dashboard/deliveryman/delivery/42"),
            RouteClass::Scoped(Role::DeliveryMan)
        );
        assert_eq!(
            classify("/dashboard/admin/users"),
            RouteClass::Scoped(Role::Admin)
        );
    }

    #[test]
    fn classify_respects_segment_boundaries() {
        assert_eq!(classify("/dashboards"), RouteClass::Unmatched);
        assert_eq!(classify("/login-help"), RouteClass::Unmatched);
        assert_eq!(classify("/dashboard/administrator"), RouteClass::Dashboard);
        assert_eq!(classify("/api/login"), RouteClass::Unmatched);
        assert_eq!(classify("/"), RouteClass::Unmatched);
    }

    #[test]
    fn classify_resolves_dot_segments() {
        assert_eq!(
            classify("/dashboard/supervisor/../admin/users"),
            RouteClass::Scoped(Role::Admin)
        );
        assert_eq!(classify("/dashboard/./supervisor"), RouteClass::Scoped(Role::Supervisor));
        assert_eq!(classify("/assets/../dashboard"), RouteClass::DashboardRoot);
        assert_eq!(classify("/dashboard/.."), RouteClass::Unmatched);
    }

    #[test]
    fn classify_decodes_before_matching() {
        assert_eq!(classify("/%64ashboard/admin/x"), RouteClass::Scoped(Role::Admin));
        assert_eq!(classify("/dashboard/%61dmin/x"), RouteClass::Scoped(Role::Admin));
        assert_eq!(classify("/dashboard%2Fsupervisor"), RouteClass::Scoped(Role::Supervisor));
        assert_eq!(classify("/dashboard/%2E%2E/login"), RouteClass::Login);
        assert_eq!(classify("//dashboard//deliveryman/"), RouteClass::Scoped(Role::DeliveryMan));
        assert_eq!(classify("/%6Cogin"), RouteClass::Login);
        assert_eq!(classify("/dashboard/%FF"), RouteClass::Dashboard);
    }

    #[test]
    fn unauthenticated_table() {
        assert_eq!(decide(RouteClass::Login, None), Disposition::PassThrough);
        assert_eq!(decide(RouteClass::Unmatched, None), Disposition::PassThrough);
        assert_eq!(decide(RouteClass::DashboardRoot, None), Disposition::RedirectToLogin);
        assert_eq!(decide(RouteClass::Dashboard, None), Disposition::RedirectToLogin);
        for role in Role::ALL {
            assert_eq!(decide(RouteClass::Scoped(role), None), Disposition::RedirectToLogin);
        }
    }

    #[test]
    fn authenticated_table() {
        for role in Role::ALL {
            let home = Disposition::RedirectToHome(role);
            assert_eq!(decide(RouteClass::Login, Some(role)), home);
            assert_eq!(decide(RouteClass::DashboardRoot, Some(role)), home);
            assert_eq!(decide(RouteClass::Dashboard, Some(role)), Disposition::PassThrough);
            assert_eq!(decide(RouteClass::Unmatched, Some(role)), Disposition::PassThrough);

            for scope in Role::ALL {
                let expected = if scope == role {
                    Disposition::PassThrough
                } else {
                    home
                };
                assert_eq!(decide(RouteClass::Scoped(scope), Some(role)), expected);
            }
        }
    }

    #[test]
    fn redirect_locations() {
        assert_eq!(Disposition::PassThrough.location(), None);
        assert_eq!(Disposition::RedirectToLogin.location(), Some("/login"));
        assert_eq!(
            Disposition::RedirectToHome(Role::Supervisor).location(),
            Some("/dashboard/supervisor")
        );
    }

    #[test]
    fn protected_classes() {
        assert!(!RouteClass::Login.is_protected());
        assert!(!RouteClass::Unmatched.is_protected());
        assert!(RouteClass::DashboardRoot.is_protected());
        assert!(RouteClass::Scoped(Role::Admin).is_protected());
    }
}
