pub mod execute_job;
pub mod get_metrics;
pub mod list_jobs;
pub mod process_batch;
pub mod purge_dead;
pub mod requeue_stale_jobs;
pub mod retry_now;
pub mod worker_loop;
