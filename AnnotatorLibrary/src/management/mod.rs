pub mod annotator;
pub mod committer;
pub mod dataset;
pub mod intake;
pub mod training_manager;
pub mod utils;
