//! Uniform timeout + fallback wrapper for dependency calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use floodgate_core::{Dependency, DependencyPolicy, Severity};

/// Why a guarded call did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum DependencyFailure {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Run `call` under the dependency's timeout, logging any failure at the
/// policy's severity.
pub async fn within<T, E, F>(
    dependency: Dependency,
    policy: DependencyPolicy,
    call: F,
) -> Result<T, DependencyFailure>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let failure = match tokio::time::timeout(policy.timeout, call).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => DependencyFailure::Failed(e.to_string()),
        Err(_) => DependencyFailure::TimedOut(policy.timeout),
    };

    log_failure(dependency, policy.severity, &failure);
    Err(failure)
}

/// Like [`within`], but substitutes `fallback()` on failure.
pub async fn guarded<T, E, F, D>(
    dependency: Dependency,
    policy: DependencyPolicy,
    call: F,
    fallback: D,
) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
    D: FnOnce() -> T,
{
    within(dependency, policy, call)
        .await
        .unwrap_or_else(|_| fallback())
}

fn log_failure(dependency: Dependency, severity: Severity, failure: &DependencyFailure) {
    let dependency = dependency.as_str();
    match severity {
        Severity::Debug => {
            tracing::debug!(dependency, error = %failure, "Dependency failed, using fallback")
        }
        Severity::Warn => {
            tracing::warn!(dependency, error = %failure, "Dependency failed, using fallback")
        }
    }
}
