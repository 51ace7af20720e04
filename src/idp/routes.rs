use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Form, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::config::{IdpConfig, mount_path};
use super::cookies;
use super::error::FedCmError;
use super::extractor::SessionToken;
use super::gate::{self, FEDCM_HEADERS};
use super::state::IdpState;
use super::traits::AccountResolver;
use super::types::{
    ClientMetadataQuery, FedCmRoute, LoginFlowCompleted, LoginFlowCreated, LoginFlowSubmission,
    LoginRequest, LoginResponse, SuccessResponse, TokenRequest, TokenResponse,
};
use crate::accounts::AccountsResponse;
use crate::manifest::ClientMetadata;
use crate::session_service::{SessionService, SessionServiceResolver};
use crate::types::{AccountId, ClientId};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the mock IdP router.
///
/// Mounts `/.well-known/web-identity`, the FedCM endpoints under
/// `{fedcm_path}/{route}` and, unless disabled with
/// [`IdpConfig::with_mock_login`], the login endpoint at `auth_path`.
pub fn fedcm_routes<R: AccountResolver>(config: IdpConfig, resolver: R) -> Router {
    let fedcm_path = config.fedcm_path.trim_end_matches('/').to_string();
    let auth_path = config.mock_login.then(|| config.auth_path.clone());

    let state = IdpState::new(config, resolver);

    let router = Router::new()
        .route("/.well-known/web-identity", get(web_identity::<R>))
        .route(&format!("{fedcm_path}/{{route}}"), any(dispatch::<R>));
    let router = match auth_path {
        Some(path) => router.route(&path, get(auth_status).post(login::<R>)),
        None => router,
    };
    router.with_state(state)
}

/// Create the IdP router with sessions owned by an external [`SessionService`].
///
/// Accounts come from [`SessionServiceResolver`], login goes through
/// [`login_flow_routes`] at `login_path`, and the mock username login is not
/// mounted, so only the service ever writes the session cookie.
pub fn session_service_routes<S: SessionService>(
    config: IdpConfig,
    login_path: &str,
    service: Arc<S>,
) -> Router {
    let login = login_flow_routes(&config, login_path, service.clone());
    fedcm_routes(config.with_mock_login(false), SessionServiceResolver::new(service)).merge(login)
}

// ── Discovery ──────────────────────────────────────────────────────

async fn web_identity<R: AccountResolver>(State(state): State<IdpState<R>>) -> Response {
    Json(state.config.web_identity()).into_response()
}

// ── FedCM dispatcher ───────────────────────────────────────────────

async fn dispatch<R: AccountResolver>(
    State(state): State<IdpState<R>>,
    route: Result<Path<String>, PathRejection>,
    SessionToken(session): SessionToken,
    request: Request,
) -> Response {
    if request.method() == Method::OPTIONS {
        return gate::preflight();
    }

    let Ok(Path(route)) = route else {
        tracing::debug!(path = %request.uri().path(), "Undecodable FedCM route");
        return FedCmError::InvalidRoute.into_response();
    };

    handle(&state, &route, session.as_deref(), request)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn handle<R: AccountResolver>(
    state: &IdpState<R>,
    route: &str,
    session: Option<&str>,
    request: Request,
) -> Result<Response, FedCmError> {
    let route: FedCmRoute = route.parse()?;
    let method = request.method().clone();

    match route {
        // Public: the browser fetches the config without cookies.
        FedCmRoute::Manifest if method == Method::GET => Ok(fedcm_json(state.config.manifest())),
        FedCmRoute::Accounts if method == Method::GET => {
            require_fedcm(state, request.headers(), route)?;
            let accounts = state.accounts_for(session).await;
            Ok(fedcm_json(AccountsResponse { accounts }))
        }
        FedCmRoute::ClientMetadata if method == Method::GET => {
            require_fedcm(state, request.headers(), route)?;
            client_metadata(state, request.uri())
        }
        FedCmRoute::Token if method == Method::POST => {
            require_fedcm(state, request.headers(), route)?;
            issue_assertion(state, session, request).await
        }
        FedCmRoute::Disconnect if method == Method::GET || method == Method::POST => {
            require_fedcm(state, request.headers(), route)?;
            // Nothing is persisted, so there is nothing to revoke.
            Ok(fedcm_json(SuccessResponse { success: true }))
        }
        _ => Err(FedCmError::MethodNotAllowed),
    }
}

fn require_fedcm<R: AccountResolver>(
    state: &IdpState<R>,
    headers: &HeaderMap,
    route: FedCmRoute,
) -> Result<(), FedCmError> {
    if gate::is_fedcm_request(headers, gate::WEBIDENTITY, state.config.bypass_active()) {
        return Ok(());
    }
    tracing::warn!(?route, "Rejected request without Sec-Fetch-Dest: webidentity");
    Err(FedCmError::Unauthorized)
}

fn client_metadata<R: AccountResolver>(
    state: &IdpState<R>,
    uri: &Uri,
) -> Result<Response, FedCmError> {
    let Query(query) = Query::<ClientMetadataQuery>::try_from_uri(uri)
        .map_err(|_| FedCmError::Validation("Invalid request".into()))?;

    let client_id = query
        .client_id
        .filter(|c| !c.is_empty())
        .or_else(|| state.config.default_client_id.clone())
        .ok_or_else(|| FedCmError::Validation("Missing client_id parameter".into()))?;

    Ok(fedcm_json(ClientMetadata::for_client(&ClientId(client_id))))
}

async fn issue_assertion<R: AccountResolver>(
    state: &IdpState<R>,
    session: Option<&str>,
    request: Request,
) -> Result<Response, FedCmError> {
    // Identity comes from the cookie, and is checked before the body is read.
    let accounts = state.accounts_for(session).await;
    if accounts.is_empty() {
        tracing::debug!("Token request without a valid session");
        return Err(FedCmError::Unauthorized);
    }

    let body: TokenRequest = read_body(request).await?;

    if !accounts.iter().any(|a| a.id.as_str() == body.account_id) {
        tracing::warn!(account_id = %body.account_id, "Token requested for an account outside the session");
        return Err(FedCmError::Validation("Invalid account_id".into()));
    }

    let account_id = AccountId(body.account_id);
    let client_id = ClientId(body.client_id);
    let token = state
        .issuer
        .issue_token(&account_id, &client_id, body.nonce.as_deref())?;

    tracing::info!(
        account_id = %account_id,
        client_id = %client_id,
        disclosure_text_shown = body.disclosure_text_shown,
        "Identity assertion issued"
    );

    Ok(fedcm_json(TokenResponse { token }))
}

// ── Login ──────────────────────────────────────────────────────────

async fn auth_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn login<R: AccountResolver>(
    State(state): State<IdpState<R>>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Json<LoginResponse>), FedCmError> {
    let https = state.config.https_enabled() || cookies::is_request_https(request.headers());
    let body: LoginRequest = read_body(request).await?;
    let username = body.username.unwrap_or_default();

    let token = state.sessions.create_session_token(&username)?;
    let cookie = cookies::session_cookie(
        state.config.session_cookie_name(),
        &token,
        state.config.session_ttl_secs,
        https,
    );

    tracing::info!(username = %username, "Login successful");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            username,
        }),
    ))
}

// ── External login flow ────────────────────────────────────────────

struct LoginFlowState<S> {
    service: Arc<S>,
    cookie_name: String,
    ttl_secs: i64,
    https: bool,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for LoginFlowState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cookie_name: self.cookie_name.clone(),
            ttl_secs: self.ttl_secs,
            https: self.https,
        }
    }
}

/// Create login routes backed by an external [`SessionService`].
///
/// `GET {path}` starts a login flow; `POST {path}` with
/// `{flowId, email, password}` completes it and stores the service's
/// session token in the session cookie. Pair with [`SessionServiceResolver`]
/// so the FedCM endpoints read the same cookie, or use
/// [`session_service_routes`] which does both.
pub fn login_flow_routes<S: SessionService>(config: &IdpConfig, path: &str, service: Arc<S>) -> Router {
    let state = LoginFlowState {
        service,
        cookie_name: config.session_cookie_name.clone(),
        ttl_secs: config.session_ttl_secs,
        https: config.https_enabled(),
    };

    Router::new()
        .route(
            &mount_path(path),
            get(create_login_flow::<S>).post(submit_login_flow::<S>),
        )
        .with_state(state)
}

async fn create_login_flow<S: SessionService>(
    State(state): State<LoginFlowState<S>>,
) -> Result<Json<LoginFlowCreated>, FedCmError> {
    let flow_id = state
        .service
        .create_login_flow()
        .await
        .map_err(|e| FedCmError::Internal(format!("create login flow: {e}")))?;
    Ok(Json(LoginFlowCreated { flow_id }))
}

async fn submit_login_flow<S: SessionService>(
    State(state): State<LoginFlowState<S>>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Json<LoginFlowCompleted>), FedCmError> {
    let https = state.https || cookies::is_request_https(request.headers());
    let body: LoginFlowSubmission = read_body(request).await?;

    let flow_id = body
        .flow_id
        .filter(|f| !f.is_empty())
        .ok_or_else(|| FedCmError::Validation("Flow ID is required".into()))?;

    let result = state
        .service
        .update_login_flow(&flow_id, &body.email, &body.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "External login failed");
            FedCmError::AuthenticationFailed
        })?;

    let cookie = cookies::session_cookie(&state.cookie_name, &result.session_token, state.ttl_secs, https);

    tracing::info!(identity_id = %result.identity_id, "External login successful");

    Ok((
        jar.add(cookie),
        Json(LoginFlowCompleted {
            success: true,
            identity_id: result.identity_id,
        }),
    ))
}

// ── Helpers ────────────────────────────────────────────────────────

fn fedcm_json<T: Serialize>(body: T) -> Response {
    (FEDCM_HEADERS, Json(body)).into_response()
}

/// Parse a JSON or form-encoded body. Browsers post the id assertion form-encoded.
async fn read_body<T: DeserializeOwned>(request: Request) -> Result<T, FedCmError> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let parsed = if is_form {
        Form::<T>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|e| e.body_text())
    } else {
        match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    };

    parsed.map_err(|detail| {
        tracing::warn!(%detail, "Malformed request body");
        FedCmError::Validation("Invalid request".into())
    })
}
