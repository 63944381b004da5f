use serde::Deserialize;

/// Body of `POST /internal/process-batch`. An empty body uses the configured batch size.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessBatchRequest {
    pub limit: Option<u32>,
}
