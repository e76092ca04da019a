pub mod lifecycle;
pub mod log_demo;
pub mod order;
pub mod singleton;
