//! BigQuery streaming inserts backing the audit sink and the work queue.

use async_trait::async_trait;
use decider_core::{AuditSink, WorkQueue};
use decider_events::AuditEvent;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::client::{GcpClient, endpoint, send};
use crate::error::{GcpError, GcpResult};

/// One BigQuery table addressed through `tabledata.insertAll`.
#[derive(Clone)]
pub struct BigQueryTable {
    client: GcpClient,
    insert_url: Url,
    qualified_name: String,
}

#[derive(Serialize)]
struct InsertAllRequest<'a> {
    rows: [InsertRow<'a>; 1],
}

#[derive(Serialize)]
struct InsertRow<'a> {
    json: &'a Value,
}

impl BigQueryTable {
    /// Address `project.dataset.table` under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::InvalidEndpoint`] when `base` cannot carry a path.
    pub fn new(
        client: GcpClient,
        base: &Url,
        project: &str,
        dataset: &str,
        table: &str,
    ) -> GcpResult<Self> {
        let insert_url = endpoint(
            base,
            &[
                "bigquery", "v2", "projects", project, "datasets", dataset, "tables", table,
                "insertAll",
            ],
        )?;
        Ok(Self {
            client,
            insert_url,
            qualified_name: format!("{project}.{dataset}.{table}"),
        })
    }

    /// Append one row.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the API answers with a
    /// non-success status, or the row is rejected.
    pub async fn insert_row(&self, row: &Value) -> GcpResult<()> {
        let body = InsertAllRequest {
            rows: [InsertRow { json: row }],
        };
        let response = send(
            "bigquery.insertAll",
            self.client.post(self.insert_url.clone()).json(&body),
        )
        .await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|source| GcpError::Request {
                operation: "bigquery.insertAll",
                source,
            })?;

        match payload.get("insertErrors") {
            Some(Value::Array(errors)) if !errors.is_empty() => Err(GcpError::InsertRejected {
                table: self.qualified_name.clone(),
                detail: Value::Array(errors.clone()).to_string(),
            }),
            _ => {
                debug!(table = %self.qualified_name, "row inserted");
                Ok(())
            }
        }
    }
}

/// Audit sink writing one row per event.
#[derive(Clone)]
pub struct BigQueryAuditSink {
    table: BigQueryTable,
}

impl BigQueryAuditSink {
    /// Sink writing into `table`.
    #[must_use]
    pub const fn new(table: BigQueryTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl AuditSink for BigQueryAuditSink {
    async fn record_event(&self, event: AuditEvent) -> anyhow::Result<()> {
        let row = serde_json::to_value(&event)?;
        self.table.insert_row(&row).await?;
        Ok(())
    }
}

/// Work queue appending rows to the contract queue table.
#[derive(Clone)]
pub struct BigQueryWorkQueue {
    table: BigQueryTable,
}

impl BigQueryWorkQueue {
    /// Queue writing into `table`.
    #[must_use]
    pub const fn new(table: BigQueryTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl WorkQueue for BigQueryWorkQueue {
    async fn enqueue(&self, record: Value) -> anyhow::Result<()> {
        self.table.insert_row(&record).await?;
        Ok(())
    }
}
