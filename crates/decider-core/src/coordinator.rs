//! Batch coordinator: dedup, probe, classify, and dispatch per URL.
//!
//! # Design
//! - URLs are processed sequentially so audit records and downstream calls
//!   follow submission order.
//! - A failure on one URL never stops the batch; the error travels with that
//!   URL's descriptor and the next URL proceeds.

use std::sync::Arc;

use decider_events::{AuditEventKind, AuditStatus};
use decider_telemetry::Metrics;
use tracing::{info, warn};

use crate::audit::Auditor;
use crate::classify::ExtensionClassifier;
use crate::dispatch::Dispatcher;
use crate::error::DecisionError;
use crate::model::{Action, BatchContext, FileDescriptor, Outcome};
use crate::probe::file_name_from_url;
use crate::service::{Classifier, DedupStore, Prober};

/// Dedup store plus the namespace (bucket) it is queried in.
#[derive(Clone)]
struct DedupCheck {
    store: Arc<dyn DedupStore>,
    namespace: String,
}

/// Runs every URL of a batch through the pipeline.
#[derive(Clone)]
pub struct BatchCoordinator {
    prober: Arc<dyn Prober>,
    classifier: Arc<dyn Classifier>,
    dispatcher: Dispatcher,
    dedup: Option<DedupCheck>,
    metrics: Metrics,
}

impl BatchCoordinator {
    /// Build a coordinator using the extension classifier and no dedup.
    #[must_use]
    pub fn new(prober: Arc<dyn Prober>, dispatcher: Dispatcher, metrics: Metrics) -> Self {
        Self {
            prober,
            classifier: Arc::new(ExtensionClassifier),
            dispatcher,
            dedup: None,
            metrics,
        }
    }

    /// Replace the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Skip files whose `{batch_id}/{file_name}` key already exists in `namespace`.
    #[must_use]
    pub fn with_dedup(mut self, store: Arc<dyn DedupStore>, namespace: impl Into<String>) -> Self {
        self.dedup = Some(DedupCheck {
            store,
            namespace: namespace.into(),
        });
        self
    }

    /// Process `urls` in order; the result has one outcome per URL, same order.
    pub async fn process_batch(
        &self,
        urls: &[String],
        batch: &BatchContext,
        audit: &Auditor,
    ) -> Vec<Outcome> {
        self.metrics.inc_batch();
        let mut outcomes = Vec::with_capacity(urls.len());
        for url in urls {
            let outcome = self.process_one(url, batch, audit).await;
            self.metrics.inc_file(outcome.action.as_str());
            if let Some(error) = &outcome.descriptor.error {
                self.metrics.inc_file_failure(error.kind());
            }
            outcomes.push(outcome);
        }
        info!(
            batch_id = %batch.batch_id,
            files = outcomes.len(),
            failures = outcomes.iter().filter(|o| o.is_failure()).count(),
            "batch processed"
        );
        outcomes
    }

    async fn process_one(&self, url: &str, batch: &BatchContext, audit: &Auditor) -> Outcome {
        let file_name = file_name_from_url(url);

        let dedup_name = file_name
            .as_deref()
            .filter(|name| !matches!(*name, "" | "/" | "."));
        if let (Some(dedup), Some(name)) = (&self.dedup, dedup_name) {
            let key = dedup_key(&batch.batch_id, name);
            match dedup.store.exists(&dedup.namespace, &key).await {
                Ok(true) => {
                    audit
                        .record(
                            AuditEventKind::FileAlreadyProcessed,
                            AuditStatus::Completed,
                            Some(url),
                            format!("{}/{key}", dedup.namespace),
                        )
                        .await;
                    return Outcome {
                        descriptor: FileDescriptor::unprobed(url, batch, Some(name.to_string())),
                        action: Action::AlreadyProcessed,
                    };
                }
                Ok(false) => {}
                Err(err) => {
                    let error = DecisionError::DedupCheckFailed {
                        url: url.to_string(),
                        source: err.into(),
                    };
                    audit
                        .record(
                            AuditEventKind::CheckFileExistsFailed,
                            AuditStatus::Failed,
                            Some(url),
                            error.describe(),
                        )
                        .await;
                    return Outcome {
                        descriptor: FileDescriptor::failed(
                            url,
                            batch,
                            Some(name.to_string()),
                            error,
                        ),
                        action: Action::NotDispatched,
                    };
                }
            }
        }

        let probed = match self.prober.probe(url, batch, audit).await {
            Ok(probed) => probed,
            Err(error) => {
                warn!(url, error = %error.describe(), "probe failed");
                return Outcome {
                    descriptor: FileDescriptor::failed(url, batch, file_name, error),
                    action: Action::NotDispatched,
                };
            }
        };

        let decision = self.classifier.classify(&probed);
        let planned = Action::planned(&decision);
        match self.dispatcher.execute(&decision, &probed, audit).await {
            Ok(()) => Outcome {
                descriptor: FileDescriptor::from(probed),
                action: planned,
            },
            Err(error) => {
                warn!(url, error = %error.describe(), "dispatch failed");
                Outcome {
                    descriptor: FileDescriptor::from(probed).with_error(error),
                    action: Action::NotDispatched,
                }
            }
        }
    }
}

/// Object key used to detect already-processed files.
#[must_use]
pub fn dedup_key(batch_id: &str, file_name: &str) -> String {
    format!("{batch_id}/{file_name}")
}
