pub mod api_key_store;
pub mod delivery_log_store;
pub mod webhook_job_store;
pub mod webhook_secret_store;
pub mod webhook_store;
