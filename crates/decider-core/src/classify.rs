//! Extension-based routing rules.

use crate::model::{JobTarget, ProbedFile, RoutingDecision, WorkArguments};
use crate::service::Classifier;

/// Extension routed to the plain file streamer.
pub const JSON_EXTENSION: &str = ".json";
/// Extension routed to the gzip streamer.
pub const GZ_EXTENSION: &str = ".gz";
/// Extension routed through the work queue to the zip downloader.
pub const ZIP_EXTENSION: &str = ".zip";

/// Decide what to do with a probed file. Matching is exact and case-sensitive.
///
/// Streaming jobs receive `[correlation_id, url, size_bytes, batch_id]`; the
/// zip downloader receives `[correlation_id, url, file_name]`.
#[must_use]
pub fn classify(file: &ProbedFile) -> RoutingDecision {
    match file.metadata.extension.as_str() {
        JSON_EXTENSION => stream(JobTarget::FileStreamer, file),
        GZ_EXTENSION => stream(JobTarget::GzStreamer, file),
        ZIP_EXTENSION => RoutingDecision::EnqueueThenStream {
            work: WorkArguments::from(file),
            target: JobTarget::ZipDownloader,
            args: vec![
                file.correlation_id.clone(),
                file.url.clone(),
                file.file_name.clone(),
            ],
        },
        _ => RoutingDecision::Skip,
    }
}

fn stream(target: JobTarget, file: &ProbedFile) -> RoutingDecision {
    RoutingDecision::StreamJob {
        target,
        args: vec![
            file.correlation_id.clone(),
            file.url.clone(),
            file.metadata.size_bytes.to_string(),
            file.batch_id.clone(),
        ],
    }
}

/// [`Classifier`] applying [`classify`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

impl Classifier for ExtensionClassifier {
    fn classify(&self, file: &ProbedFile) -> RoutingDecision {
        classify(file)
    }
}
