//! Recording collaborators that share one ordered call log.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::bail;
use async_trait::async_trait;
use decider_core::probe::file_name_from_url;
use decider_core::{
    AuditSink, Auditor, BatchContext, Classifier, DecisionError, DedupStore, ExtensionClassifier,
    FileMetadata, JobTrigger, ProbedFile, Prober, RoutingDecision, UnexpectedStatus, WorkQueue,
};
use decider_events::AuditEvent;
use serde_json::Value;

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// A dedup lookup.
    DedupLookup {
        /// Namespace queried.
        namespace: String,
        /// Key queried.
        key: String,
    },
    /// A probe of a URL.
    Probe {
        /// Probed URL.
        url: String,
    },
    /// An enqueue of a work item.
    Enqueue {
        /// Serialised record.
        record: Value,
    },
    /// A job trigger.
    Trigger {
        /// Job id.
        job_id: String,
        /// Positional arguments.
        args: Vec<String>,
    },
}

/// Ordered log shared by every recording collaborator.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn push(&self, call: Call) {
        self.lock().push(call);
    }

    /// Snapshot of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Trigger calls only.
    #[must_use]
    pub fn triggers(&self) -> Vec<(String, Vec<String>)> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Trigger { job_id, args } => Some((job_id.clone(), args.clone())),
                _ => None,
            })
            .collect()
    }

    /// Enqueued records only.
    #[must_use]
    pub fn enqueued(&self) -> Vec<Value> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Enqueue { record } => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Job trigger that records calls and optionally fails.
#[derive(Debug, Clone)]
pub struct RecordingJobTrigger {
    log: CallLog,
    fail: bool,
}

impl RecordingJobTrigger {
    /// Trigger that accepts every call.
    #[must_use]
    pub const fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    /// Trigger that records then rejects every call.
    #[must_use]
    pub const fn failing(log: CallLog) -> Self {
        Self { log, fail: true }
    }
}

#[async_trait]
impl JobTrigger for RecordingJobTrigger {
    async fn trigger(&self, job_id: &str, args: &[String]) -> anyhow::Result<()> {
        self.log.push(Call::Trigger {
            job_id: job_id.to_string(),
            args: args.to_vec(),
        });
        if self.fail {
            bail!("job launch rejected");
        }
        Ok(())
    }
}

/// Work queue that records calls and optionally fails.
#[derive(Debug, Clone)]
pub struct RecordingWorkQueue {
    log: CallLog,
    fail: bool,
}

impl RecordingWorkQueue {
    /// Queue that accepts every record.
    #[must_use]
    pub const fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    /// Queue that records then rejects every record.
    #[must_use]
    pub const fn failing(log: CallLog) -> Self {
        Self { log, fail: true }
    }
}

#[async_trait]
impl WorkQueue for RecordingWorkQueue {
    async fn enqueue(&self, record: Value) -> anyhow::Result<()> {
        self.log.push(Call::Enqueue { record });
        if self.fail {
            bail!("queue insert rejected");
        }
        Ok(())
    }
}

/// Dedup store holding a fixed set of keys.
#[derive(Debug, Clone)]
pub struct RecordingDedupStore {
    log: CallLog,
    existing: HashSet<String>,
    fail: bool,
}

impl RecordingDedupStore {
    /// Store containing `existing` keys.
    #[must_use]
    pub fn new(log: CallLog, existing: impl IntoIterator<Item = String>) -> Self {
        Self {
            log,
            existing: existing.into_iter().collect(),
            fail: false,
        }
    }

    /// Store whose lookups always fail.
    #[must_use]
    pub fn failing(log: CallLog) -> Self {
        Self {
            log,
            existing: HashSet::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DedupStore for RecordingDedupStore {
    async fn exists(&self, namespace: &str, key: &str) -> anyhow::Result<bool> {
        self.log.push(Call::DedupLookup {
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
        if self.fail {
            bail!("object lookup failed");
        }
        Ok(self.existing.contains(key))
    }
}

/// Audit sink that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record_event(&self, _event: AuditEvent) -> anyhow::Result<()> {
        bail!("audit table unavailable")
    }
}

/// Canned probe result for one URL.
#[derive(Debug, Clone)]
pub enum ProbeScript {
    /// Succeed with this metadata.
    Metadata(FileMetadata),
    /// Fail as if the server answered with this status.
    Status(u16),
    /// Fail as if `Content-Length` were missing.
    NoContentLength,
}

/// Prober returning canned results keyed by URL; unknown URLs fail with 404.
#[derive(Debug, Clone)]
pub struct ScriptedProber {
    log: CallLog,
    scripts: HashMap<String, ProbeScript>,
}

impl ScriptedProber {
    /// Prober with no scripts.
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            scripts: HashMap::new(),
        }
    }

    /// Script a URL.
    #[must_use]
    pub fn with(mut self, url: impl Into<String>, script: ProbeScript) -> Self {
        self.scripts.insert(url.into(), script);
        self
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        url: &str,
        batch: &BatchContext,
        _audit: &Auditor,
    ) -> Result<ProbedFile, DecisionError> {
        self.log.push(Call::Probe {
            url: url.to_string(),
        });
        let failure = |status: u16| DecisionError::ProbeFailed {
            url: url.to_string(),
            source: Box::new(UnexpectedStatus { status }),
        };
        match self.scripts.get(url) {
            Some(ProbeScript::Metadata(metadata)) => Ok(ProbedFile {
                url: url.to_string(),
                file_name: file_name_from_url(url).unwrap_or_default(),
                batch_id: batch.batch_id.clone(),
                correlation_id: batch.correlation_id.clone(),
                metadata: metadata.clone(),
            }),
            Some(ProbeScript::Status(status)) => Err(failure(*status)),
            Some(ProbeScript::NoContentLength) => Err(DecisionError::SizeUnavailable {
                url: url.to_string(),
                value: None,
            }),
            None => Err(failure(404)),
        }
    }
}

/// Classifier that counts calls and delegates to the extension rules.
#[derive(Debug, Clone, Default)]
pub struct SpyClassifier {
    calls: Arc<AtomicUsize>,
}

impl SpyClassifier {
    /// Fresh spy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files classified so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for SpyClassifier {
    fn classify(&self, file: &ProbedFile) -> RoutingDecision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ExtensionClassifier.classify(file)
    }
}
