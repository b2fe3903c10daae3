//! Log-only collaborators for running the decider without cloud access.
//!
//! Jobs and work items are written to the log instead of being launched, so
//! the full probe and routing pipeline can be exercised against real URLs.

use async_trait::async_trait;
use decider_core::{JobTrigger, WorkQueue};
use serde_json::Value;
use tracing::info;

/// Job trigger that logs each launch and accepts it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingJobTrigger;

#[async_trait]
impl JobTrigger for LoggingJobTrigger {
    async fn trigger(&self, job_id: &str, args: &[String]) -> anyhow::Result<()> {
        info!(job_id, args = ?args, "job launch (local backend)");
        Ok(())
    }
}

/// Work queue that logs each record and accepts it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingWorkQueue;

#[async_trait]
impl WorkQueue for LoggingWorkQueue {
    async fn enqueue(&self, record: Value) -> anyhow::Result<()> {
        info!(record = %record, "work item enqueued (local backend)");
        Ok(())
    }
}
