pub mod backoff_policy;
pub mod delivery_stats;
