//! In-process store implementations for tests and single-node embedding.

pub mod api_key_store_memory;
pub mod delivery_log_store_memory;
pub mod webhook_job_store_memory;
pub mod webhook_store_memory;

pub use api_key_store_memory::ApiKeyStoreMemory;
pub use delivery_log_store_memory::DeliveryLogStoreMemory;
pub use webhook_job_store_memory::WebhookJobStoreMemory;
pub use webhook_store_memory::{WebhookSecretStoreMemory, WebhookStoreMemory};
