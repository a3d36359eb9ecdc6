pub mod monitor;
pub mod utils;
