pub mod collector;
pub mod processor;
pub mod stats;
