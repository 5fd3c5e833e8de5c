pub mod category;
pub mod detail;
pub mod listing;
