//! Cloud Run Admin API v2 job trigger.

use async_trait::async_trait;
use decider_core::JobTrigger;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::client::{GcpClient, endpoint, send};
use crate::error::GcpResult;

/// Launches Cloud Run jobs with container argument overrides.
#[derive(Clone)]
pub struct CloudRunJobs {
    client: GcpClient,
    base: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunJobRequest<'a> {
    overrides: Overrides<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Overrides<'a> {
    container_overrides: [ContainerOverride<'a>; 1],
    task_count: u32,
}

#[derive(Serialize)]
struct ContainerOverride<'a> {
    args: &'a [String],
}

impl CloudRunJobs {
    /// Trigger client against the Admin API at `base`.
    #[must_use]
    pub const fn new(client: GcpClient, base: Url) -> Self {
        Self { client, base }
    }

    /// `{base}/v2/{job_id}:run`; `job_id` is `projects/{p}/locations/{r}/jobs/{name}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path.
    pub fn run_url(&self, job_id: &str) -> GcpResult<Url> {
        let mut segments: Vec<String> = std::iter::once("v2".to_string())
            .chain(job_id.split('/').map(str::to_string))
            .collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(":run");
        }
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        endpoint(&self.base, &segments)
    }

    async fn run(&self, job_id: &str, args: &[String]) -> GcpResult<()> {
        let body = RunJobRequest {
            overrides: Overrides {
                container_overrides: [ContainerOverride { args }],
                task_count: 1,
            },
        };
        send("run.jobs.run", self.client.post(self.run_url(job_id)?).json(&body)).await?;
        debug!(job_id, "job execution requested");
        Ok(())
    }
}

#[async_trait]
impl JobTrigger for CloudRunJobs {
    async fn trigger(&self, job_id: &str, args: &[String]) -> anyhow::Result<()> {
        self.run(job_id, args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    const JOB_ID: &str = "projects/proj/locations/us-central1/jobs/prj-wayne-file-streamer";

    fn jobs(server: &MockServer) -> CloudRunJobs {
        let client = GcpClient::new(Duration::from_secs(5), None).expect("client");
        CloudRunJobs::new(client, Url::parse(&server.base_url()).expect("base url"))
    }

    #[tokio::test]
    async fn trigger_posts_container_overrides() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/projects/proj/locations/us-central1/jobs/prj-wayne-file-streamer:run")
                .json_body(json!({
                    "overrides": {
                        "containerOverrides": [{"args": ["corr", "https://h/a.json", "10", "batch"]}],
                        "taskCount": 1
                    }
                }));
            then.status(200).json_body(json!({"name": "operations/1"}));
        });

        let args: Vec<String> = ["corr", "https://h/a.json", "10", "batch"]
            .into_iter()
            .map(str::to_string)
            .collect();
        jobs(&server).trigger(JOB_ID, &args).await.expect("trigger");
        mock.assert();
    }

    #[tokio::test]
    async fn rejected_launch_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST);
            then.status(404).body("job not found");
        });

        let err = jobs(&server)
            .trigger(JOB_ID, &[])
            .await
            .expect_err("missing job");
        assert!(err.to_string().contains("404"));
    }
}
