use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use console_authn::{AuthError, Authenticator, SessionRegistry, UserProfile};
use console_authz::{
    AccessDecision, Permission, Role, RouteElement, RouteRequirement, RouteTable, Subject,
    accessible_menu_items, check_route,
};

use crate::{config::AppConfig, directory::StaticDirectory};

const SESSION_COOKIE: &str = "__Host-console_session";

#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub registry: Arc<SessionRegistry>,
    pub directory: StaticDirectory,
    pub config: Arc<AppConfig>,
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "console server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(allow_origin)
}

/// Generate the router from the classified route table: the index route
/// renders a redirect, guest-only and protected routes go through the access
/// predicate, public routes are unguarded, and the catch-all stays open
/// regardless of authentication.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/me", get(me_handler))
        .route("/api/menu", get(menu_handler))
        .route(&state.table.index().path, get(index_handler));

    let pages = state
        .table
        .guest_only()
        .iter()
        .chain(state.table.protected())
        .chain(state.table.public());
    for route in pages {
        router = add_page_routes(router, route);
    }

    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    router
        .fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Register a page route and, flatly, its children. Each entry is wrapped by
/// the predicate with its own declared requirements.
fn add_page_routes(mut router: Router<AppState>, route: &RouteRequirement) -> Router<AppState> {
    let requirement = route.clone();
    let handler = move |State(state): State<AppState>, jar: PrivateCookieJar| {
        let requirement = requirement.clone();
        async move { serve_page(&state, &jar, &requirement) }
    };
    router = router.route(&route.path, get(handler));
    for child in &route.children {
        router = add_page_routes(router, child);
    }
    router
}

fn session_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

fn current_subject(state: &AppState, jar: &PrivateCookieJar) -> Subject {
    state.registry.subject_for(session_token(jar).as_deref())
}

/// Payload handed to the rendering collaborator for a granted route.
#[derive(Serialize)]
struct PagePayload {
    path: String,
    component: Option<String>,
    title: Option<String>,
}

#[derive(Serialize)]
struct AccessDeniedBody {
    error: &'static str,
    missing_permissions: Vec<Permission>,
    missing_roles: Vec<Role>,
}

fn serve_page(state: &AppState, jar: &PrivateCookieJar, route: &RouteRequirement) -> Response {
    let subject = current_subject(state, jar);
    match check_route(&subject, route) {
        AccessDecision::Granted => render_page(route).into_response(),
        AccessDecision::Redirect { to, preserve_from } => {
            let target = if preserve_from {
                format!("{to}?from={}", route.path)
            } else {
                to
            };
            Redirect::to(&target).into_response()
        }
        AccessDecision::Denied(denial) => (
            StatusCode::FORBIDDEN,
            Json(AccessDeniedBody {
                error: "access_denied",
                missing_permissions: denial.missing_permissions,
                missing_roles: denial.missing_roles,
            }),
        )
            .into_response(),
    }
}

/// Resolve the tagged element into output. The engine never looks inside the
/// element; this is presentation territory.
fn render_page(route: &RouteRequirement) -> Json<PagePayload> {
    let component = match &route.element {
        RouteElement::None => None,
        RouteElement::Component(name) => Some(name.clone()),
    };
    Json(PagePayload {
        path: route.path.clone(),
        component,
        title: route.meta.as_ref().and_then(|meta| meta.title.clone()),
    })
}

async fn index_handler(State(state): State<AppState>, jar: PrivateCookieJar) -> Redirect {
    let subject = current_subject(&state, &jar);
    Redirect::to(state.table.index_redirect(&subject))
}

async fn not_found_handler(State(state): State<AppState>) -> Response {
    // Rendered unguarded, whatever the authentication state.
    match state.table.not_found() {
        Some(route) => (StatusCode::NOT_FOUND, render_page(route)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    token: String,
    user: UserPayload,
}

#[derive(Serialize)]
struct UserPayload {
    #[serde(flatten)]
    profile: UserProfile,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
}

async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(request): Json<LoginRequest>,
) -> HttpResult<(PrivateCookieJar, Json<LoginResponse>)> {
    let outcome = state
        .directory
        .login(&request.username, &request.password)
        .await
        .map_err(|err| match err {
            AuthError::InvalidCredentials => {
                HttpError::new(StatusCode::UNAUTHORIZED, "invalid credentials")
            }
            AuthError::Transport(err) => HttpError::internal(err),
        })?;

    state.registry.admit(
        outcome.token.clone(),
        outcome.user.clone(),
        outcome.roles.clone(),
        outcome.permissions.clone(),
    );

    let cookie = Cookie::build((SESSION_COOKIE, outcome.token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(state.config.session_ttl_minutes))
        .build();
    let jar = jar.add(cookie);

    info!(username = %request.username, "login succeeded");
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            token: outcome.token,
            user: UserPayload {
                profile: outcome.user,
                roles: outcome.roles,
                permissions: outcome.permissions,
            },
        }),
    ))
}

async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> HttpResult<(PrivateCookieJar, StatusCode)> {
    if let Some(token) = session_token(&jar) {
        state
            .directory
            .logout(&token)
            .await
            .map_err(|err| HttpError::internal(err.into()))?;
        state.registry.revoke(&token);
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

#[derive(Serialize)]
struct MePayload {
    user: UserProfile,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    is_admin: bool,
    is_super_admin: bool,
}

async fn me_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> HttpResult<Json<MePayload>> {
    let session = session_token(&jar)
        .and_then(|token| state.registry.resolve(&token))
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "missing session"))?;
    let user = session
        .user
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "session without profile"))?;

    let mut roles: Vec<_> = session.subject.roles.iter().copied().collect();
    roles.sort_by_key(Role::as_str);
    let mut permissions: Vec<_> = session.subject.permissions.iter().copied().collect();
    permissions.sort_by_key(Permission::as_str);

    Ok(Json(MePayload {
        user,
        roles,
        permissions,
        is_admin: session.subject.is_admin(),
        is_super_admin: session.subject.is_super_admin(),
    }))
}

async fn menu_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Json<Vec<RouteRequirement>> {
    let subject = current_subject(&state, &jar);
    Json(accessible_menu_items(&subject, state.table.routes()))
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use chrono::Duration;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use crate::config::UserEntry;
    use crate::routes::route_table;
    use console_authz::Role;

    fn test_state() -> AppState {
        let users = vec![
            UserEntry {
                id: 1,
                username: "admin".into(),
                password: "admin".into(),
                name: "Admin User".into(),
                roles: vec![Role::Admin],
            },
            UserEntry {
                id: 2,
                username: "user".into(),
                password: "user".into(),
                name: "Regular User".into(),
                roles: vec![Role::User],
            },
        ];
        let config = AppConfig {
            cookie_key: Key::generate(),
            session_ttl_minutes: 60,
            cors_allowed_origins: vec![],
            users: users.clone(),
        };
        let cookie_key = config.cookie_key.clone();
        AppState {
            table: Arc::new(RouteTable::new(route_table()).expect("valid table")),
            registry: Arc::new(SessionRegistry::new(Duration::minutes(60))),
            directory: StaticDirectory::new(users),
            config: Arc::new(config),
            cookie_key,
        }
    }

    async fn login_as(router: &Router, username: &str, password: &str) -> String {
        let body = format!(r#"{{"username":"{username}","password":"{password}"}}"#);
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    async fn get_with_cookie(router: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn index_redirects_by_authentication_state() {
        let router = build_router(test_state());
        let anonymous = get_with_cookie(&router, "/", None).await;
        assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&anonymous), "/login");

        let cookie = login_as(&router, "admin", "admin").await;
        let authed = get_with_cookie(&router, "/", Some(&cookie)).await;
        assert_eq!(location(&authed), "/dashboard");
    }

    #[tokio::test]
    async fn guest_is_redirected_from_protected_routes() {
        let router = build_router(test_state());
        let response = get_with_cookie(&router, "/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login?from=/dashboard");
    }

    #[tokio::test]
    async fn authenticated_subject_is_redirected_from_the_login_page() {
        let router = build_router(test_state());
        let cookie = login_as(&router, "admin", "admin").await;
        let response = get_with_cookie(&router, "/login", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/dashboard"));
    }

    #[tokio::test]
    async fn denied_route_lists_missing_permissions() {
        let router = build_router(test_state());
        let cookie = login_as(&router, "user", "user").await;
        let response = get_with_cookie(&router, "/analytics", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_string(response).await;
        assert!(body.contains("access_denied"));
        assert!(body.contains("analytics:view"));
    }

    #[tokio::test]
    async fn granted_route_renders_its_component() {
        let router = build_router(test_state());
        let cookie = login_as(&router, "admin", "admin").await;
        let response = get_with_cookie(&router, "/users", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("UserListPage"));
    }

    #[tokio::test]
    async fn child_routes_carry_their_own_requirements() {
        // Admin has system:config but not the super_admin role required by
        // the /system parent; the child route is evaluated independently.
        let router = build_router(test_state());
        let cookie = login_as(&router, "admin", "admin").await;

        let parent = get_with_cookie(&router, "/system", Some(&cookie)).await;
        assert_eq!(parent.status(), StatusCode::FORBIDDEN);

        let child = get_with_cookie(&router, "/system/config", Some(&cookie)).await;
        assert_eq!(child.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_credentials_are_rejected() {
        let router = build_router(test_state());
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"wrong"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_a_live_session() {
        let router = build_router(test_state());
        let response = get_with_cookie(&router, "/api/me", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = login_as(&router, "admin", "admin").await;
        let response = get_with_cookie(&router, "/api/me", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("\"is_admin\":true"));
        assert!(body.contains("\"is_super_admin\":false"));
    }

    #[tokio::test]
    async fn menu_reflects_the_subject() {
        let router = build_router(test_state());
        let cookie = login_as(&router, "user", "user").await;
        let response = get_with_cookie(&router, "/api/menu", Some(&cookie)).await;
        let body = body_string(response).await;
        assert!(body.contains("/users"));
        assert!(!body.contains("/system"));
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let router = build_router(test_state());
        let cookie = login_as(&router, "admin", "admin").await;
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/logout")
                    .header(header::COOKIE, cookie.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let me = get_with_cookie(&router, "/api/me", Some(&cookie)).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_paths_render_the_catch_all() {
        let router = build_router(test_state());
        let response = get_with_cookie(&router, "/nowhere", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_string(response).await;
        assert!(body.contains("NotFoundPage"));
    }
}
