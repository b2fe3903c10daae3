use std::sync::Arc;

use decider_core::{Action, AuditSink, DecisionError, JobTarget};
use decider_events::{AuditEventKind, EventBus};
use decider_test_support::assert::{assert_call_order, audit_kinds, audited, is_enqueue, is_trigger};
use decider_test_support::fixtures::{self, CORRELATION_ID};
use decider_test_support::mocks::{
    Call, CallLog, ProbeScript, RecordingDedupStore, RecordingJobTrigger, RecordingWorkQueue,
    ScriptedProber, SpyClassifier,
};

const ZIP_URL: &str = "https://h/data/a.zip";
const JSON_URL: &str = "https://h/data/a.json";
const GZ_URL: &str = "https://h/data/b.gz";
const CSV_URL: &str = "https://h/data/c.csv";

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn zip_is_enqueued_before_the_downloader_is_triggered() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone()).with(
        ZIP_URL,
        ProbeScript::Metadata(fixtures::metadata(".zip", 1_073_741_824)),
    );
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[ZIP_URL]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].action,
        Action::EnqueuedThenStreamed(JobTarget::ZipDownloader)
    );
    assert!(!outcomes[0].is_failure());
    assert_call_order(&log, is_enqueue, is_trigger);

    let triggers = log.triggers();
    assert_eq!(triggers.len(), 1);
    assert_eq!(
        triggers[0].0,
        "projects/test-project/locations/us-central1/jobs/prj-wayne-zip-downloader"
    );
    assert_eq!(triggers[0].1, vec![CORRELATION_ID, ZIP_URL, "a.zip"]);

    let record = &log.enqueued()[0];
    assert_eq!(record["traceId"], CORRELATION_ID);
    assert_eq!(record["status"], "QUEUED");
    assert_eq!(record["functionName"], "compute-decider");
    assert_eq!(record["arguments"]["fileName"], "a.zip");
    assert_eq!(record["arguments"]["fileSize"], "1.00 GB");

    let kinds = audit_kinds(&bus);
    let enqueue_at = kinds
        .iter()
        .position(|k| *k == AuditEventKind::EnqueueWorkItem)
        .expect("enqueue audited");
    let trigger_at = kinds
        .iter()
        .position(|k| *k == AuditEventKind::TriggerJob)
        .expect("trigger audited");
    assert!(enqueue_at < trigger_at);
}

#[tokio::test]
async fn failed_enqueue_never_triggers() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(ZIP_URL, ProbeScript::Metadata(fixtures::metadata(".zip", 10)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::failing(log.clone()),
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[ZIP_URL]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert!(log.triggers().is_empty());
    assert_eq!(outcomes[0].action, Action::NotDispatched);
    assert!(matches!(
        outcomes[0].descriptor.error,
        Some(DecisionError::EnqueueFailed { .. })
    ));
    assert!(outcomes[0].descriptor.metadata.is_some());
    assert!(audited(&bus, AuditEventKind::EnqueueWorkItemFailed));
}

#[tokio::test]
async fn streaming_targets_receive_size_and_batch() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 2048)))
        .with(GZ_URL, ProbeScript::Metadata(fixtures::metadata(".gz", 4096)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let bus = EventBus::new();

    coordinator
        .process_batch(
            &urls(&[JSON_URL, GZ_URL]),
            &fixtures::batch(),
            &fixtures::auditor(&bus),
        )
        .await;

    let triggers = log.triggers();
    assert_eq!(triggers.len(), 2);
    assert!(triggers[0].0.ends_with("/jobs/prj-wayne-file-streamer"));
    assert_eq!(triggers[0].1, vec![CORRELATION_ID, JSON_URL, "2048", CORRELATION_ID]);
    assert!(triggers[1].0.ends_with("/jobs/prj-wayne-gz-streamer"));
    assert_eq!(triggers[1].1[2], "4096");
    assert!(log.enqueued().is_empty());
}

#[tokio::test]
async fn unsupported_extension_makes_no_downstream_calls() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(CSV_URL, ProbeScript::Metadata(fixtures::metadata(".csv", 1)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[CSV_URL]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert_eq!(outcomes[0].action, Action::Skipped);
    assert!(!outcomes[0].is_failure());
    assert_eq!(
        log.calls(),
        vec![Call::Probe {
            url: CSV_URL.to_string()
        }]
    );
}

#[tokio::test]
async fn failures_stay_with_their_url_and_order_is_preserved() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 1)))
        .with(GZ_URL, ProbeScript::NoContentLength)
        .with(CSV_URL, ProbeScript::Metadata(fixtures::metadata(".csv", 1)));
    let spy = SpyClassifier::new();
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    )
    .with_classifier(Arc::new(spy.clone()));
    let bus = EventBus::new();
    let submitted = urls(&[
        "https://unreachable.invalid/x.json",
        JSON_URL,
        GZ_URL,
        CSV_URL,
    ]);

    let outcomes = coordinator
        .process_batch(&submitted, &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    let returned: Vec<_> = outcomes.iter().map(|o| o.descriptor.url.clone()).collect();
    assert_eq!(returned, submitted);
    assert!(matches!(
        outcomes[0].descriptor.error,
        Some(DecisionError::ProbeFailed { .. })
    ));
    assert!(!outcomes[1].is_failure());
    assert!(matches!(
        outcomes[2].descriptor.error,
        Some(DecisionError::SizeUnavailable { .. })
    ));
    assert_eq!(outcomes[3].action, Action::Skipped);

    // Only the two successful probes reach the classifier.
    assert_eq!(spy.calls(), 2);
    assert_eq!(log.triggers().len(), 1);
}

#[tokio::test]
async fn already_processed_files_are_not_probed() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 1)));
    let dedup = RecordingDedupStore::new(log.clone(), [format!("{CORRELATION_ID}/a.json")]);
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    )
    .with_dedup(Arc::new(dedup), "bucket");
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[JSON_URL]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert_eq!(outcomes[0].action, Action::AlreadyProcessed);
    assert_eq!(outcomes[0].descriptor.file_name, "a.json");
    assert_eq!(
        log.calls(),
        vec![Call::DedupLookup {
            namespace: "bucket".into(),
            key: format!("{CORRELATION_ID}/a.json"),
        }]
    );
    assert!(audited(&bus, AuditEventKind::FileAlreadyProcessed));
}

#[tokio::test]
async fn dedup_failure_is_recorded_on_the_descriptor() {
    let log = CallLog::new();
    let coordinator = fixtures::coordinator(
        ScriptedProber::new(log.clone()),
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    )
    .with_dedup(Arc::new(RecordingDedupStore::failing(log.clone())), "bucket");
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[JSON_URL]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert!(matches!(
        outcomes[0].descriptor.error,
        Some(DecisionError::DedupCheckFailed { .. })
    ));
    assert!(audited(&bus, AuditEventKind::CheckFileExistsFailed));
    assert_eq!(log.calls().len(), 1);
}

#[tokio::test]
async fn trigger_failure_keeps_metadata_and_continues() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 1)))
        .with(GZ_URL, ProbeScript::Metadata(fixtures::metadata(".gz", 1)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::failing(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(
            &urls(&[JSON_URL, GZ_URL]),
            &fixtures::batch(),
            &fixtures::auditor(&bus),
        )
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_failure()));
    assert_eq!(log.triggers().len(), 2);
    let message = outcomes[0].descriptor.error_message().expect("message");
    assert!(message.contains("job launch rejected"));
    assert!(audited(&bus, AuditEventKind::TriggerJobFailed));
}

#[tokio::test]
async fn audit_outage_does_not_change_outcomes() {
    let log = CallLog::new();
    let prober = ScriptedProber::new(log.clone())
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 1)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let sink: Arc<dyn AuditSink> = Arc::new(decider_test_support::mocks::FailingAuditSink);
    let auditor = decider_core::Auditor::new(
        sink,
        decider_core::AuditOrigin::new("DEV"),
        CORRELATION_ID,
    );

    let outcomes = coordinator
        .process_batch(&urls(&[JSON_URL]), &fixtures::batch(), &auditor)
        .await;

    assert_eq!(outcomes[0].action, Action::Streamed(JobTarget::FileStreamer));
    assert_eq!(log.triggers().len(), 1);
}

#[tokio::test]
async fn zip_trigger_failure_keeps_the_queued_record() {
    let zip_url = "https://h/x/y/a.zip";
    let log = CallLog::new();
    let mut metadata = fixtures::metadata(".zip", 500_000_000);
    metadata.content_type = "application/zip".to_string();
    let prober = ScriptedProber::new(log.clone())
        .with(zip_url, ProbeScript::Metadata(metadata))
        .with(JSON_URL, ProbeScript::Metadata(fixtures::metadata(".json", 1)));
    let coordinator = fixtures::coordinator(
        prober,
        RecordingJobTrigger::failing(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(
            &urls(&[zip_url, JSON_URL]),
            &fixtures::batch(),
            &fixtures::auditor(&bus),
        )
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].action, Action::NotDispatched);
    assert!(matches!(
        outcomes[0].descriptor.error,
        Some(DecisionError::TriggerFailed { .. })
    ));
    let metadata = outcomes[0].descriptor.metadata.as_ref().expect("metadata");
    assert_eq!(metadata.size_display(), "0.47 GB");
    assert_eq!(metadata.content_type, "application/zip");

    let enqueued = log.enqueued();
    assert_eq!(enqueued.len(), 1);
    assert_eq!(enqueued[0]["arguments"]["fileUrl"], zip_url);
    // One trigger for the zip, one for the json that follows it.
    assert_eq!(log.triggers().len(), 2);
    assert_call_order(&log, is_enqueue, is_trigger);
    assert!(audited(&bus, AuditEventKind::TriggerJobFailed));
    assert!(!audited(&bus, AuditEventKind::EnqueueWorkItemFailed));
}

#[tokio::test]
async fn root_path_skips_the_dedup_lookup() {
    let root_url = "https://h/";
    let log = CallLog::new();
    let coordinator = fixtures::coordinator(
        ScriptedProber::new(log.clone()),
        RecordingJobTrigger::new(log.clone()),
        RecordingWorkQueue::new(log.clone()),
    )
    .with_dedup(
        Arc::new(RecordingDedupStore::new(log.clone(), Vec::<String>::new())),
        "bucket",
    );
    let bus = EventBus::new();

    let outcomes = coordinator
        .process_batch(&urls(&[root_url]), &fixtures::batch(), &fixtures::auditor(&bus))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        log.calls(),
        vec![Call::Probe {
            url: root_url.to_string(),
        }]
    );
}
