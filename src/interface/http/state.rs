use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::context::AppContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    /// Bearer secret accepted by the batch trigger.
    pub worker_secret: Arc<str>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        ctx: Arc<AppContext>,
        worker_secret: impl Into<Arc<str>>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            ctx,
            worker_secret: worker_secret.into(),
            metrics,
        }
    }
}
