//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admission_control::config::ServiceConfig;
use admission_control::guard::{content, BoundedCount, PolicyConfig, Principal, ResolvedTarget, Resolver, Role};
use admission_control::services::commands::{CommandError, CommandOutput, CommandRunner};
use admission_control::services::credentials::PasswordHash;
use admission_control::services::fetcher::{FetchError, FetchedResource, Fetcher};
use admission_control::services::reports::{DataSource, Record, SyntheticDataSource};
use admission_control::services::users::NewUser;
use admission_control::services::StoreError;
use admission_control::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use serde_json::Value;
use tempfile::TempDir;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const USER_PASSWORD: &str = "user-password-1";

/// Resolver answering from a fixed table; unknown names fail to resolve.
#[derive(Default)]
pub struct StaticResolver {
    table: HashMap<String, Vec<SocketAddr>>,
}

impl StaticResolver {
    pub fn with(mut self, host: &str, ip: &str) -> Self {
        let addr = SocketAddr::new(ip.parse().unwrap(), 80);
        self.table.entry(host.to_string()).or_default().push(addr);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        self.table
            .get(host)
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|a| SocketAddr::new(a.ip(), port))
                    .collect()
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such host"))
    }
}

/// Fetcher that never touches the network and counts calls.
#[derive(Default)]
pub struct RecordingFetcher {
    calls: AtomicUsize,
}

impl RecordingFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, target: &ResolvedTarget) -> Result<FetchedResource, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FetchedResource {
            url: target.url().to_string(),
            status: 200,
            content_type: Some("image/png".to_string()),
            bytes: 4,
        })
    }
}

/// Command runner that records argv and reports success.
#[derive(Default)]
pub struct StubCommandRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubCommandRunner {
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for StubCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: "1 packets transmitted, 1 received".to_string(),
            stderr: String::new(),
        })
    }
}

/// Synthetic records, counting how often the source was reached.
#[derive(Default)]
pub struct CountingDataSource {
    calls: AtomicUsize,
}

impl CountingDataSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for CountingDataSource {
    async fn fetch_records(&self, count: BoundedCount) -> Result<Vec<Record>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SyntheticDataSource.fetch_records(count).await
    }
}

pub struct TestApp {
    pub state: AppState,
    pub fetcher: Arc<RecordingFetcher>,
    pub commands: Arc<StubCommandRunner>,
    pub data_source: Arc<CountingDataSource>,
    pub admin: Principal,
    pub user: Principal,
    pub admin_token: String,
    pub user_token: String,
    // Keeps the storage root alive.
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.storage.root = dir.path().display().to_string();
    config.auth.jwt_secret = SECRET.to_string();
    config.tasks.enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut ServiceConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    customize(&mut config);
    let policy = PolicyConfig::from_config(&config).unwrap();

    let resolver = StaticResolver::default()
        .with("images.example.com", "93.184.216.34")
        .with("internal.example.com", "10.0.0.5")
        .with("mixed.example.com", "93.184.216.34")
        .with("mixed.example.com", "127.0.0.1");
    let fetcher = Arc::new(RecordingFetcher::default());
    let commands = Arc::new(StubCommandRunner::default());
    let data_source = Arc::new(CountingDataSource::default());

    let state = AppState::new(config, policy)
        .with_resolver(Arc::new(resolver))
        .with_fetcher(fetcher.clone())
        .with_commands(commands.clone())
        .with_data_source(data_source.clone());

    let admin = create_user(&state, "root", ADMIN_PASSWORD, Role::Admin).await;
    let user = create_user(&state, "alice", USER_PASSWORD, Role::User).await;
    let admin_token = state.issuer.issue(&admin).unwrap();
    let user_token = state.issuer.issue(&user).unwrap();

    TestApp {
        state,
        fetcher,
        commands,
        data_source,
        admin,
        user,
        admin_token,
        user_token,
        dir,
    }
}

pub async fn create_user(state: &AppState, username: &str, password: &str, role: Role) -> Principal {
    let user = state
        .users
        .put(NewUser {
            username: content::check(username, &state.policy.username).unwrap(),
            password_hash: PasswordHash::derive(password),
            role,
        })
        .await
        .unwrap();
    Principal {
        user_id: user.id,
        username: user.username,
        role: user.role,
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
