//! In-process OpenID Connect provider for exercising the real client

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const ACCESS_TOKEN: &str = "idp-access-token";

#[derive(Default)]
pub struct IdpState {
    base_url: String,
    /// Issued code -> (code_challenge, redirect_uri)
    codes: Mutex<HashMap<String, (String, String)>>,
    issued: AtomicUsize,
    pub discovery_hits: AtomicUsize,
}

pub struct FakeIdp {
    pub base_url: String,
    pub state: Arc<IdpState>,
}

impl FakeIdp {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(IdpState {
            base_url: base_url.clone(),
            ..IdpState::default()
        });

        let app = Router::new()
            .route("/.well-known/openid-configuration", get(discovery))
            .route("/authorize", get(authorize))
            .route("/token", post(token))
            .route("/userinfo", get(userinfo))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.base_url)
    }

    /// Register a code directly, bypassing `/authorize`
    pub fn issue_code(&self, code_challenge: &str, redirect_uri: &str) -> String {
        issue(&self.state, code_challenge, redirect_uri)
    }
}

fn issue(state: &IdpState, code_challenge: &str, redirect_uri: &str) -> String {
    let code = format!("code-{}", state.issued.fetch_add(1, Ordering::SeqCst));
    state.codes.lock().unwrap().insert(
        code.clone(),
        (code_challenge.to_string(), redirect_uri.to_string()),
    );
    code
}

async fn discovery(State(state): State<Arc<IdpState>>) -> Json<serde_json::Value> {
    state.discovery_hits.fetch_add(1, Ordering::SeqCst);
    let base = &state.base_url;
    Json(serde_json::json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/token"),
        "userinfo_endpoint": format!("{base}/userinfo"),
        "jwks_uri": format!("{base}/jwks"),
    }))
}

#[derive(Deserialize)]
struct AuthorizeQuery {
    response_type: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    state: String,
    code_challenge: String,
    code_challenge_method: String,
}

async fn authorize(
    State(state): State<Arc<IdpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    if query.response_type != "code"
        || query.client_id != CLIENT_ID
        || query.code_challenge_method != "S256"
        || query.scope != "openid email profile"
    {
        return (StatusCode::BAD_REQUEST, "bad authorization request").into_response();
    }

    let code = issue(&state, &query.code_challenge, &query.redirect_uri);
    let mut target = url::Url::parse(&query.redirect_uri).unwrap();
    target
        .query_pairs_mut()
        .append_pair("code", &code)
        .append_pair("state", &query.state);

    Redirect::to(target.as_str()).into_response()
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
    redirect_uri: String,
    client_id: String,
    client_secret: String,
    code_verifier: String,
}

async fn token(State(state): State<Arc<IdpState>>, Form(form): Form<TokenForm>) -> Response {
    let invalid_grant = || {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid_grant" })),
        )
            .into_response()
    };

    if form.grant_type != "authorization_code"
        || form.client_id != CLIENT_ID
        || form.client_secret != CLIENT_SECRET
    {
        return invalid_grant();
    }

    let Some((challenge, redirect_uri)) = state.codes.lock().unwrap().remove(&form.code) else {
        return invalid_grant();
    };

    let computed = URL_SAFE_NO_PAD.encode(Sha256::digest(form.code_verifier.as_bytes()));
    if computed != challenge || redirect_uri != form.redirect_uri {
        return invalid_grant();
    }

    Json(serde_json::json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600,
        "id_token": "header.payload.signature",
    }))
    .into_response()
}

async fn userinfo(headers: HeaderMap) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"));

    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(serde_json::json!({
        "sub": "1234567890",
        "name": "Idp User",
        "email": "idp.user@example.com",
        "email_verified": true,
        "picture": "https://idp.example.com/idp-user.png",
    }))
    .into_response()
}
