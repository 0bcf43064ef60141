pub mod batch;
pub mod config;
pub mod detect;
pub mod extract;
pub mod vlm;
