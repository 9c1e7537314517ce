// In-process stand-ins for the Google token, watch and export endpoints,
// plus helpers for seeding a local bare repository.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/service_account_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/service_account_pub.pem");
pub const DEPLOY_KEY: &str = include_str!("../fixtures/deploy_key");
pub const KNOWN_HOSTS: &str =
    "github.com ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOMqqnkVzrm0SdG6UOoqKLsabgH5C9okWi0dh2l9GKJl";
pub const CLIENT_EMAIL: &str = "docpush@project.iam.gserviceaccount.com";
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";

#[derive(Debug, Clone, Deserialize)]
pub struct SeenClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub assertions: Vec<SeenClaims>,
    pub watch_bodies: Vec<Value>,
    pub export_queries: Vec<HashMap<String, String>>,
    pub unauthorized: usize,
}

struct Reply {
    status: StatusCode,
    body: Vec<u8>,
}

struct FakeState {
    token_uri: String,
    token_reply: Mutex<Option<Reply>>,
    watch_reply: Mutex<Reply>,
    export_reply: Mutex<Reply>,
    recorded: Mutex<Recorded>,
}

#[derive(Clone)]
pub struct FakeGoogle {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeGoogle {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("fake google should bind");
        let addr = listener.local_addr().expect("listener should expose local address");

        let state = Arc::new(FakeState {
            token_uri: format!("http://{addr}/token"),
            token_reply: Mutex::new(None),
            watch_reply: Mutex::new(Reply { status: StatusCode::OK, body: b"{}".to_vec() }),
            export_reply: Mutex::new(Reply { status: StatusCode::OK, body: Vec::new() }),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/token", post(token))
            .route("/drive/v3/files/{file_id}/watch", post(watch))
            .route("/drive/v3/files/{file_id}/export", get(export))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake google should serve");
        });

        Self { addr, state }
    }

    pub fn api_base(&self) -> String {
        format!("http://{}/drive/v3", self.addr)
    }

    pub fn token_uri(&self) -> &str {
        &self.state.token_uri
    }

    /// Service-account JSON pointing its token endpoint at this server.
    pub fn service_account_key(&self) -> String {
        json!({
            "type": "service_account",
            "project_id": "docpush-test",
            "private_key_id": "kid-1",
            "private_key": PRIVATE_KEY_PEM,
            "client_email": CLIENT_EMAIL,
            "token_uri": self.state.token_uri,
        })
        .to_string()
    }

    pub fn reject_tokens(&self, status: u16, body: &str) {
        *self.state.token_reply.lock().unwrap() = Some(Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.as_bytes().to_vec(),
        });
    }

    pub fn reply_to_watch(&self, status: u16, body: &str) {
        *self.state.watch_reply.lock().unwrap() =
            Reply { status: StatusCode::from_u16(status).unwrap(), body: body.as_bytes().to_vec() };
    }

    pub fn reply_to_export(&self, status: u16, body: &[u8]) {
        *self.state.export_reply.lock().unwrap() =
            Reply { status: StatusCode::from_u16(status).unwrap(), body: body.to_vec() };
    }

    pub fn recorded<T>(&self, read: impl FnOnce(&Recorded) -> T) -> T {
        read(&self.state.recorded.lock().unwrap())
    }
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    assertion: String,
}

async fn token(
    State(state): State<Arc<FakeState>>,
    Form(form): Form<TokenForm>,
) -> (StatusCode, Vec<u8>) {
    if let Some(reply) = state.token_reply.lock().unwrap().as_ref() {
        return (reply.status, reply.body.clone());
    }

    assert_eq!(form.grant_type, "urn:ietf:params:oauth:grant-type:jwt-bearer");

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[state.token_uri.as_str()]);
    let decoding_key =
        DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("public key should parse");
    let claims = decode::<SeenClaims>(&form.assertion, &decoding_key, &validation)
        .expect("assertion should verify against the service account key")
        .claims;
    state.recorded.lock().unwrap().assertions.push(claims);

    let body = json!({
        "access_token": ACCESS_TOKEN,
        "expires_in": 3599,
        "token_type": "Bearer",
    });
    (StatusCode::OK, body.to_string().into_bytes())
}

fn authorized(state: &FakeState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {ACCESS_TOKEN}");
    let ok = headers.get("authorization").and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    if !ok {
        state.recorded.lock().unwrap().unauthorized += 1;
    }
    ok
}

async fn watch(
    State(state): State<Arc<FakeState>>,
    UrlPath(_file_id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Vec<u8>) {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, b"Login Required".to_vec());
    }
    state.recorded.lock().unwrap().watch_bodies.push(body);
    let reply = state.watch_reply.lock().unwrap();
    (reply.status, reply.body.clone())
}

async fn export(
    State(state): State<Arc<FakeState>>,
    UrlPath(_file_id): UrlPath<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Vec<u8>) {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, b"Login Required".to_vec());
    }
    state.recorded.lock().unwrap().export_queries.push(query);
    let reply = state.export_reply.lock().unwrap();
    (reply.status, reply.body.clone())
}

/// Bare `remote.git` on `main` whose first commit holds `index.html`.
pub fn seed_remote(root: &Path, initial_html: &str) -> std::path::PathBuf {
    let remote_path = root.join("remote.git");
    let seed_path = root.join("seed");

    run_git(root, &["init", "--bare", "-b", "main", remote_path.to_str().expect("utf8 remote path")]);
    run_git(root, &["init", "-b", "main", seed_path.to_str().expect("utf8 seed path")]);
    run_git(&seed_path, &["config", "user.name", "Website Owner"]);
    run_git(&seed_path, &["config", "user.email", "owner@example.test"]);
    run_git(
        &seed_path,
        &["remote", "add", "origin", remote_path.to_str().expect("utf8 remote path")],
    );

    std::fs::write(seed_path.join("index.html"), initial_html)
        .expect("seed file should be written");
    run_git(&seed_path, &["add", "."]);
    run_git(&seed_path, &["commit", "-m", "chore: initial site"]);
    run_git(&seed_path, &["push", "-u", "origin", "main"]);

    remote_path
}

pub fn remote_git(remote_path: &Path, args: &[&str]) -> String {
    let mut full = vec!["--git-dir", remote_path.to_str().expect("utf8 remote path")];
    full.extend_from_slice(args);
    run_git_capture(remote_path.parent().expect("remote has a parent"), &full)
}

pub fn run_git(cwd: &Path, args: &[&str]) {
    run_git_capture(cwd, args);
}

pub fn run_git_capture(cwd: &Path, args: &[&str]) -> String {
    let output =
        Command::new("git").args(args).current_dir(cwd).output().expect("git command should run");
    assert!(
        output.status.success(),
        "git {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8 output")
}
