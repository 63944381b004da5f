pub mod api_key_store_postgres;
mod database;
pub mod delivery_log_store_postgres;
pub mod webhook_job_store_postgres;
pub mod webhook_secret_store_postgres;
pub mod webhook_store_postgres;

pub use database::PostgresDatabase;
