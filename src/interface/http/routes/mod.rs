pub mod health;
pub mod management;
pub mod metrics;
pub mod ready;
pub mod worker;
