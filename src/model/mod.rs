pub mod extract;
pub mod output;
