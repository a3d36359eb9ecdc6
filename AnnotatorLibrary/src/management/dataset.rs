use std::io::Error;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tokio::fs;
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::management::intake::ALLOWED_IMAGE_EXTENSIONS;
use crate::management::utils::dataset_split::DatasetSplit;

/// Declarative record handed to the external trainer, rendered as YAML at
/// the dataset root.
#[derive(Serialize, Debug, Clone)]
pub struct DatasetDescriptor {
    pub path: String,
    pub train: String,
    pub val: String,
    pub nc: usize,
    pub names: Vec<String>,
}

/// The on-disk train/val partition: parallel image and label folder pairs
/// under one dataset root. There is no index beyond the directory
/// listing, counts are computed by enumeration on demand.
#[derive(Clone)]
pub struct DatasetStore {
    root: PathBuf,
    class_names: Vec<String>,
}

impl DatasetStore {
    pub fn new(root: PathBuf, class_names: Vec<String>) -> Self {
        Self {
            root,
            class_names,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PathBuf::from(&config.dataset_folder), config.class_names.clone())
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn images_folder(&self, split: DatasetSplit) -> PathBuf {
        self.root.join(split.to_string()).join("images")
    }

    pub fn labels_folder(&self, split: DatasetSplit) -> PathBuf {
        self.root.join(split.to_string()).join("labels")
    }

    pub async fn prepare(&self) {
        for split in [DatasetSplit::Train, DatasetSplit::Val] {
            for folder in [self.images_folder(split), self.labels_folder(split)] {
                match fs::create_dir_all(&folder).await {
                    Ok(_) => logging_information!("Dataset", format!("Folder {} is ready", folder.display())),
                    Err(err) => logging_error!("Dataset", format!("Cannot create folder {}", folder.display()), format!("Err: {err}")),
                }
            }
        }
    }

    pub async fn image_count(&self, split: DatasetSplit) -> Result<usize, Error> {
        Self::count_images_in(&self.images_folder(split)).await
    }

    pub async fn count_images_in(folder: &Path) -> Result<usize, Error> {
        let mut dir_entries = fs::read_dir(folder).await?;
        let mut count = 0;
        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            let is_image = path.extension()
                .and_then(|extension| extension.to_str())
                .map(|extension| ALLOWED_IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn descriptor(&self) -> DatasetDescriptor {
        DatasetDescriptor {
            path: self.root.to_string_lossy().to_string(),
            train: format!("{}/images", DatasetSplit::Train),
            val: format!("{}/images", DatasetSplit::Val),
            nc: self.class_names.len(),
            names: self.class_names.clone(),
        }
    }

    /// Writes `data.yaml` at the dataset root and returns its path.
    pub async fn write_descriptor(&self) -> Result<PathBuf, Error> {
        let descriptor = self.descriptor();
        let yaml_string = serde_yaml::to_string(&descriptor)
            .map_err(|err| Error::new(std::io::ErrorKind::InvalidData, err))?;
        let descriptor_path = self.root.join("data.yaml");
        fs::write(&descriptor_path, yaml_string).await?;
        Ok(descriptor_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_store(root: &Path) -> DatasetStore {
        DatasetStore::new(root.to_path_buf(), vec!["sign".to_string(), "ramp".to_string()])
    }

    #[tokio::test]
    async fn prepare_creates_all_four_folders() {
        let root = tempdir().expect("Unable to create temporary folder.");
        let store = sample_store(root.path());
        store.prepare().await;
        assert!(store.images_folder(DatasetSplit::Train).is_dir());
        assert!(store.labels_folder(DatasetSplit::Train).is_dir());
        assert!(store.images_folder(DatasetSplit::Val).is_dir());
        assert!(store.labels_folder(DatasetSplit::Val).is_dir());
    }

    #[tokio::test]
    async fn counting_ignores_non_image_files() {
        let root = tempdir().expect("Unable to create temporary folder.");
        let store = sample_store(root.path());
        store.prepare().await;
        let images = store.images_folder(DatasetSplit::Train);
        std::fs::write(images.join("a.jpg"), b"x").expect("Write failed.");
        std::fs::write(images.join("b.PNG"), b"x").expect("Write failed.");
        std::fs::write(images.join("notes.txt"), b"x").expect("Write failed.");
        let count = store.image_count(DatasetSplit::Train).await.expect("Count failed.");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn descriptor_lists_classes_in_order() {
        let root = tempdir().expect("Unable to create temporary folder.");
        let store = sample_store(root.path());
        let descriptor_path = store.write_descriptor().await.expect("Descriptor write failed.");
        let rendered = std::fs::read_to_string(descriptor_path).expect("Read failed.");
        assert!(rendered.contains("train: train/images"));
        assert!(rendered.contains("val: val/images"));
        assert!(rendered.contains("nc: 2"));
        let sign_position = rendered.find("sign").expect("Class missing.");
        let ramp_position = rendered.find("ramp").expect("Class missing.");
        assert!(sign_position < ramp_position);
    }
}
