use std::path::PathBuf;
use serde::Serialize;

/// An uploaded image sitting in the staging folder, waiting to be
/// annotated and committed into a split.
#[derive(Serialize, Debug, Clone)]
pub struct StagedImage {
    pub filename: String,
    pub original_filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}
