//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into policy and application state
//! - Create the configured seed accounts
//! - Start the task worker
//!
//! # Design Decisions
//! - Seed accounts pass the same content guards as registration
//! - A duplicate or malformed seed aborts startup

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, ServiceConfig};
use crate::guard::{content, PolicyConfig, Role};
use crate::http::server::AppState;
use crate::lifecycle::Shutdown;
use crate::services::credentials::PasswordHash;
use crate::services::tasks::TaskWorker;
use crate::services::users::NewUser;
use crate::services::StoreError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("seed user #{index}: {reason}")]
    Seed { index: usize, reason: String },

    #[error("user store: {0}")]
    Store(#[from] StoreError),
}

/// Build the policy and production state from a loaded config.
pub fn bootstrap(config: ServiceConfig) -> Result<AppState, StartupError> {
    let policy = PolicyConfig::from_config(&config)?;
    tracing::info!(
        storage_root = %policy.storage_root.as_path().display(),
        max_record_limit = policy.max_record_limit.get(),
        blocked_ranges = policy.network.blocked_ranges.len(),
        "Policy loaded"
    );
    Ok(AppState::new(config, policy))
}

/// Create every `auth.seed_users` entry. Returns how many were created.
pub async fn seed_users(state: &AppState) -> Result<usize, StartupError> {
    let seeds = &state.config.auth.seed_users;

    for (index, seed) in seeds.iter().enumerate() {
        let seed_error = |reason: String| StartupError::Seed { index, reason };

        let username = content::check(&seed.username, &state.policy.username)
            .map_err(|r| seed_error(format!("username: {}", r.reason())))?;
        content::check(&seed.password, &state.policy.password)
            .map_err(|r| seed_error(format!("password: {}", r.reason())))?;
        let role: Role = seed.role.parse().map_err(seed_error)?;

        let user = state
            .users
            .put(NewUser {
                username,
                password_hash: PasswordHash::derive(&seed.password),
                role,
            })
            .await?;
        tracing::info!(user_id = user.id, role = %user.role, "Seed user created");
    }

    if state.users.count_by_role(Role::Admin).await? == 0 {
        tracing::warn!("No admin account exists; admin endpoints are unreachable");
    }
    Ok(seeds.len())
}

/// Spawn the background task worker when enabled.
pub fn spawn_task_worker(state: &AppState, shutdown: &Shutdown) -> Option<JoinHandle<()>> {
    let tasks = &state.config.tasks;
    if !tasks.enabled {
        tracing::info!("Task worker disabled");
        return None;
    }

    let worker = TaskWorker::new(
        state.tasks.clone(),
        state.commands.clone(),
        tasks.processor_command.clone(),
        Duration::from_millis(tasks.poll_interval_ms),
        Duration::from_secs(tasks.timeout_secs),
    );
    Some(tokio::spawn(worker.run(shutdown.subscribe())))
}
