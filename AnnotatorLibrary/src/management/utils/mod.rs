pub mod bounding_box;
pub mod dataset_split;
pub mod detection;
pub mod staged_image;
pub mod training_job;
