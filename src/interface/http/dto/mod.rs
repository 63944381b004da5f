pub mod batch;
pub mod management;
