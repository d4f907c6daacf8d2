//! Partitioning sub-client.

use crate::client::PlatformClient;
use crate::domain::partitioning::{DatetimePartitioning, DatetimePartitioningSpecification};
use crate::error::SdkError;
use crate::mapping::{ApiObject, KeepNulls};
use crate::shared::ProjectId;
use crate::transport::Transport;

/// Sub-client for datetime partitioning.
pub struct Partitioning<'a> {
    pub(crate) client: &'a PlatformClient,
}

fn partitioning_path(project_id: &ProjectId) -> String {
    format!("projects/{}/datetimePartitioning/", project_id.path_segment())
}

impl<'a> Partitioning<'a> {
    /// Ask the server to compute the partitioning `spec` would produce.
    ///
    /// The specification is validated locally first; nothing is sent if the
    /// backtest or holdout settings contradict each other.
    pub async fn generate(
        &self,
        project_id: &ProjectId,
        spec: &DatetimePartitioningSpecification,
    ) -> Result<DatetimePartitioning, SdkError> {
        let body = spec.collect_payload()?;
        let data = self
            .client
            .http
            .post_json(&partitioning_path(project_id), &body)
            .await?;
        DatetimePartitioning::from_server_data(&data, &KeepNulls::None)
    }

    /// Fetch the partitioning stored on a project.
    pub async fn get(&self, project_id: &ProjectId) -> Result<DatetimePartitioning, SdkError> {
        let data = self
            .client
            .http
            .get_json(&partitioning_path(project_id), &[])
            .await?;
        DatetimePartitioning::from_server_data(&data, &KeepNulls::None)
    }
}
