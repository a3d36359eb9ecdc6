pub mod annotate;
pub mod config;
pub mod default;
pub mod inference;
pub mod javascript;
pub mod log;
pub mod misc;
pub mod status;
pub mod train;
pub mod upload;
