pub mod delivery_error;
pub mod notifier;
pub mod signing;
