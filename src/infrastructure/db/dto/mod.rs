pub mod api_key;
pub mod delivery_log;
pub mod webhook;
pub mod webhook_job;

pub use api_key::ApiKeyRow;
pub use delivery_log::{DeliveryLogRow, DeliveryWindowStatsRow, WebhookVolumeRow};
pub use webhook::{WebhookRow, WebhookSecretRow};
pub use webhook_job::{StatusCountRow, WebhookJobRow};
