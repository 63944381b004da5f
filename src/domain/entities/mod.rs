pub mod delivery_log;
pub mod webhook;
pub mod webhook_job;
