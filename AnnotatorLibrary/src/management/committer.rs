use uuid::Uuid;
use thiserror::Error;
use tokio::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use sanitize_filename::sanitize;
use serde::Serialize;
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::web::utils::response::ErrorResponse;
use crate::management::dataset::DatasetStore;
use crate::management::utils::bounding_box::{BoundingBox, NormalizedLabel};
use crate::management::utils::dataset_split::DatasetSplit;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Staged image not found")]
    NotFound,
    #[error("Image dimensions are unreadable: {0}")]
    ImageDecodeError(String),
    #[error("Filesystem operation failed: {0}")]
    IoError(#[from] std::io::Error),
}

impl CommitError {
    pub fn kind(&self) -> &'static str {
        match self {
            CommitError::NotFound => "NotFound",
            CommitError::ImageDecodeError(_) => "ImageDecodeError",
            CommitError::IoError(_) => "IOError",
        }
    }
}

impl actix_web::ResponseError for CommitError {
    fn status_code(&self) -> StatusCode {
        match self {
            CommitError::NotFound => StatusCode::NOT_FOUND,
            CommitError::ImageDecodeError(_) => StatusCode::BAD_REQUEST,
            CommitError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.kind(), self.to_string()))
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CommitSummary {
    pub filename: String,
    pub split: DatasetSplit,
    pub saved_boxes: usize,
    pub discarded_boxes: usize,
}

/// Turns the editor's pixel-space boxes into a normalized label file and
/// moves the staged image into the chosen split.
///
/// Placement is two-phase: the label content goes to a uniquely named
/// temporary file in the destination label folder first, then the image is
/// renamed out of staging, then the temporary label is renamed into place.
/// Any failure after the image move rolls the image back to staging, so an
/// observer never finds an image without its label.
pub struct AnnotationCommitter {
    staging_folder: PathBuf,
    store: DatasetStore,
    min_box_size: u32,
}

impl AnnotationCommitter {
    pub fn new(staging_folder: PathBuf, store: DatasetStore, min_box_size: u32) -> Self {
        Self {
            staging_folder,
            store,
            min_box_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PathBuf::from(&config.staging_folder), DatasetStore::from_config(config), config.min_box_size)
    }

    pub async fn commit(&self, filename: &str, boxes: &[BoundingBox], split: DatasetSplit) -> Result<CommitSummary, CommitError> {
        if filename.is_empty() || sanitize(filename) != filename {
            return Err(CommitError::NotFound);
        }
        let source_path = self.staging_folder.join(filename);
        match fs::metadata(&source_path).await {
            Ok(_) => {},
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(CommitError::NotFound),
            Err(err) => return Err(CommitError::IoError(err)),
        }
        //The client-declared dimensions are never trusted.
        let (image_width, image_height) = image::image_dimensions(&source_path)
            .map_err(|err| CommitError::ImageDecodeError(err.to_string()))?;
        let retained: Vec<&BoundingBox> = boxes.iter()
            .filter(|pixel_box| pixel_box.meets_minimum_size(self.min_box_size))
            .collect();
        let discarded_boxes = boxes.len() - retained.len();
        let labels: Vec<NormalizedLabel> = retained.iter()
            .map(|pixel_box| pixel_box.normalize(image_width, image_height))
            .collect();
        for label in &labels {
            if !label.in_unit_range() {
                logging_warning!("Committer", format!("A box in {filename} extends beyond the image bounds, writing it unclamped"));
            }
        }
        let label_content = labels.iter()
            .map(|label| format!("{}\n", label.to_label_line()))
            .collect::<String>();

        let base_name = Path::new(filename).file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        let labels_folder = self.store.labels_folder(split);
        let suffix = Uuid::new_v4().simple().to_string();
        let temporary_label_path = labels_folder.join(format!("{}.txt.{}.tmp", base_name, &suffix[..8]));
        let label_path = labels_folder.join(format!("{}.txt", base_name));
        let image_path = self.store.images_folder(split).join(filename);

        fs::write(&temporary_label_path, &label_content).await?;
        if let Err(err) = Self::move_file(&source_path, &image_path).await {
            let _ = fs::remove_file(&temporary_label_path).await;
            //A concurrent commit of the same filename won the rename.
            return Err(if err.kind() == ErrorKind::NotFound { CommitError::NotFound } else { CommitError::IoError(err) });
        }
        if let Err(err) = fs::rename(&temporary_label_path, &label_path).await {
            let _ = Self::move_file(&image_path, &source_path).await;
            let _ = fs::remove_file(&temporary_label_path).await;
            return Err(CommitError::IoError(err));
        }
        logging_information!("Committer", format!("Committed {filename} to the {split} split with {count} labels", count = labels.len()));
        Ok(CommitSummary {
            filename: filename.to_string(),
            split,
            saved_boxes: labels.len(),
            discarded_boxes,
        })
    }

    /// Rename, falling back to copy-then-delete for cross-device moves so
    /// the staged source survives any partial copy.
    async fn move_file(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(err),
            Err(_) => {
                if let Err(err) = fs::copy(source, destination).await {
                    let _ = fs::remove_file(destination).await;
                    return Err(err);
                }
                if let Err(err) = fs::remove_file(source).await {
                    //The source is intact, withdraw the copy so the move
                    //stays all-or-nothing.
                    let _ = fs::remove_file(destination).await;
                    return Err(err);
                }
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::management::intake::ImageIntake;

    const MAX_PAYLOAD: u64 = 16 * 1024 * 1024;
    const MIN_BOX_SIZE: u32 = 5;

    struct Fixture {
        _root: tempfile::TempDir,
        staging: PathBuf,
        store: DatasetStore,
        committer: AnnotationCommitter,
    }

    async fn fixture() -> Fixture {
        let root = tempdir().expect("Unable to create temporary folder.");
        let staging = root.path().join("uploaded");
        std::fs::create_dir_all(&staging).expect("Unable to create staging folder.");
        let store = DatasetStore::new(root.path().join("dataset"), vec!["sign".to_string(), "ramp".to_string()]);
        store.prepare().await;
        let committer = AnnotationCommitter::new(staging.clone(), store.clone(), MIN_BOX_SIZE);
        Fixture {
            _root: root,
            staging,
            store,
            committer,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        let buffer = image::RgbImage::new(width, height);
        image::DynamicImage::ImageRgb8(buffer)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("Encoding failed.");
        bytes
    }

    async fn stage(fixture: &Fixture, name: &str, width: u32, height: u32) -> String {
        let intake = ImageIntake::new(fixture.staging.clone(), MAX_PAYLOAD);
        intake.accept_upload(&png_bytes(width, height), name).await.expect("Upload failed.").filename
    }

    fn pixel_box(x_center: f64, y_center: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox { class_id: 0, x_center, y_center, width, height }
    }

    #[tokio::test]
    async fn commit_writes_normalized_labels_and_moves_the_image() {
        let fixture = fixture().await;
        let filename = stage(&fixture, "street.png", 200, 100).await;
        let boxes = [pixel_box(100.0, 50.0, 40.0, 20.0)];
        let summary = fixture.committer.commit(&filename, &boxes, DatasetSplit::Train).await.expect("Commit failed.");
        assert_eq!(summary.saved_boxes, 1);
        assert!(!fixture.staging.join(&filename).exists());
        assert!(fixture.store.images_folder(DatasetSplit::Train).join(&filename).is_file());
        let base_name = filename.trim_end_matches(".png");
        let label_path = fixture.store.labels_folder(DatasetSplit::Train).join(format!("{base_name}.txt"));
        let content = std::fs::read_to_string(label_path).expect("Label missing.");
        assert_eq!(content, "0 0.5 0.5 0.2 0.2\n");
    }

    #[tokio::test]
    async fn val_split_uses_the_validation_folder_pair() {
        let fixture = fixture().await;
        let filename = stage(&fixture, "street.png", 100, 100).await;
        let boxes = [pixel_box(50.0, 50.0, 10.0, 10.0)];
        fixture.committer.commit(&filename, &boxes, DatasetSplit::Val).await.expect("Commit failed.");
        assert!(fixture.store.images_folder(DatasetSplit::Val).join(&filename).is_file());
        assert!(!fixture.store.images_folder(DatasetSplit::Train).join(&filename).exists());
        let base_name = filename.trim_end_matches(".png");
        assert!(fixture.store.labels_folder(DatasetSplit::Val).join(format!("{base_name}.txt")).is_file());
    }

    #[tokio::test]
    async fn zero_boxes_commit_an_empty_label_file() {
        let fixture = fixture().await;
        let filename = stage(&fixture, "empty.png", 100, 100).await;
        fixture.committer.commit(&filename, &[], DatasetSplit::Train).await.expect("Commit failed.");
        let base_name = filename.trim_end_matches(".png");
        let label_path = fixture.store.labels_folder(DatasetSplit::Train).join(format!("{base_name}.txt"));
        let content = std::fs::read_to_string(label_path).expect("Label file must exist.");
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn threshold_boundary_keeps_exact_and_drops_smaller() {
        let fixture = fixture().await;
        let filename = stage(&fixture, "boundary.png", 100, 100).await;
        let boxes = [
            pixel_box(50.0, 50.0, MIN_BOX_SIZE as f64, MIN_BOX_SIZE as f64),
            pixel_box(50.0, 50.0, MIN_BOX_SIZE as f64 - 1.0, MIN_BOX_SIZE as f64),
        ];
        let summary = fixture.committer.commit(&filename, &boxes, DatasetSplit::Train).await.expect("Commit failed.");
        assert_eq!(summary.saved_boxes, 1);
        assert_eq!(summary.discarded_boxes, 1);
        let base_name = filename.trim_end_matches(".png");
        let label_path = fixture.store.labels_folder(DatasetSplit::Train).join(format!("{base_name}.txt"));
        let content = std::fs::read_to_string(label_path).expect("Label missing.");
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn unknown_filename_returns_not_found_without_mutation() {
        let fixture = fixture().await;
        let result = fixture.committer.commit("no-such-file.png", &[], DatasetSplit::Train).await;
        assert!(matches!(result, Err(CommitError::NotFound)));
        for split in [DatasetSplit::Train, DatasetSplit::Val] {
            let images = std::fs::read_dir(fixture.store.images_folder(split)).expect("Unable to read folder.").count();
            let labels = std::fs::read_dir(fixture.store.labels_folder(split)).expect("Unable to read folder.").count();
            assert_eq!(images + labels, 0);
        }
    }

    #[tokio::test]
    async fn out_of_bounds_box_is_written_unclamped() {
        let fixture = fixture().await;
        let filename = stage(&fixture, "edge.png", 200, 100).await;
        let boxes = [pixel_box(190.0, 50.0, 60.0, 20.0)];
        fixture.committer.commit(&filename, &boxes, DatasetSplit::Train).await.expect("Commit failed.");
        let base_name = filename.trim_end_matches(".png");
        let label_path = fixture.store.labels_folder(DatasetSplit::Train).join(format!("{base_name}.txt"));
        let content = std::fs::read_to_string(label_path).expect("Label missing.");
        assert_eq!(content, "0 0.95 0.5 0.3 0.2\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn label_write_failure_leaves_the_staged_image_intact() {
        use std::os::unix::fs::PermissionsExt;
        let fixture = fixture().await;
        let filename = stage(&fixture, "locked.png", 100, 100).await;
        let labels_folder = fixture.store.labels_folder(DatasetSplit::Train);
        std::fs::set_permissions(&labels_folder, std::fs::Permissions::from_mode(0o555)).expect("chmod failed.");
        let result = fixture.committer.commit(&filename, &[pixel_box(50.0, 50.0, 10.0, 10.0)], DatasetSplit::Train).await;
        std::fs::set_permissions(&labels_folder, std::fs::Permissions::from_mode(0o755)).expect("chmod failed.");
        assert!(matches!(result, Err(CommitError::IoError(_))));
        //Fully rolled back: image still staged, split folders untouched.
        assert!(fixture.staging.join(&filename).is_file());
        let images = std::fs::read_dir(fixture.store.images_folder(DatasetSplit::Train)).expect("Unable to read folder.").count();
        let labels = std::fs::read_dir(&labels_folder).expect("Unable to read folder.").count();
        assert_eq!(images + labels, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unremovable_source_withdraws_the_copied_destination() {
        use std::os::unix::fs::PermissionsExt;
        let root = tempdir().expect("Unable to create temporary folder.");
        let source_folder = root.path().join("locked_source");
        std::fs::create_dir_all(&source_folder).expect("Unable to create folder.");
        let source = source_folder.join("image.png");
        std::fs::write(&source, png_bytes(16, 16)).expect("Write failed.");
        let destination = root.path().join("image.png");
        //A read-only parent folder fails both the rename and the source
        //removal, forcing the copy-then-delete fallback to back out.
        std::fs::set_permissions(&source_folder, std::fs::Permissions::from_mode(0o555)).expect("chmod failed.");
        let result = AnnotationCommitter::move_file(&source, &destination).await;
        std::fs::set_permissions(&source_folder, std::fs::Permissions::from_mode(0o755)).expect("chmod failed.");
        assert!(result.is_err());
        assert!(source.is_file());
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn recommit_overwrites_the_previous_label_file() {
        let fixture = fixture().await;
        let first = stage(&fixture, "twice.png", 100, 100).await;
        fixture.committer.commit(&first, &[pixel_box(50.0, 50.0, 10.0, 10.0)], DatasetSplit::Train).await.expect("Commit failed.");
        let base_name = first.trim_end_matches(".png").to_string();
        //Stage a fresh copy under the committed name to simulate re-annotation.
        std::fs::write(fixture.staging.join(&first), png_bytes(100, 100)).expect("Write failed.");
        fixture.committer.commit(&first, &[], DatasetSplit::Train).await.expect("Commit failed.");
        let label_path = fixture.store.labels_folder(DatasetSplit::Train).join(format!("{base_name}.txt"));
        let content = std::fs::read_to_string(label_path).expect("Label missing.");
        assert!(content.is_empty());
    }
}
