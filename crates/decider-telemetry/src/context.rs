//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - Keeps the request identifier in task-local storage so handlers and
//!   downstream audit records share one correlation id.
//! - Provides an application-level span guard carrying backend and build info.

use std::future::Future;
use std::sync::Arc;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        let backend = backend.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", backend = %backend, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Retrieve the request identifier of the in-flight request, if one is set.
#[must_use]
pub fn current_request_id() -> Option<String> {
    ACTIVE_REQUEST_ID
        .try_with(|request_id| request_id.as_ref().to_string())
        .ok()
}

/// Execute the provided future with the request identifier available to downstream code.
pub async fn with_request_context<Fut, T>(request_id: impl Into<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let request_id: Arc<str> = Arc::from(request_id.into());
    ACTIVE_REQUEST_ID.scope(request_id, fut).await
}

tokio::task_local! {
    static ACTIVE_REQUEST_ID: Arc<str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_can_be_entered_and_dropped() {
        let guard = GlobalContextGuard::new("local");
        drop(guard);
    }

    #[tokio::test]
    async fn with_request_context_exposes_identifier() {
        let output = with_request_context("req-42", async {
            assert_eq!(current_request_id().as_deref(), Some("req-42"));
            "done"
        })
        .await;
        assert_eq!(output, "done");
        assert!(current_request_id().is_none());
    }
}
