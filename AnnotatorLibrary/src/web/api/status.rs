use std::path::Path;
use serde::Serialize;
use actix_web::{get, web, Scope, HttpResponse, Responder};
use Common::management::monitor::Monitor;
use crate::utils::config::Config;
use crate::utils::static_files::StaticFiles;
use crate::management::dataset::DatasetStore;
use crate::management::training_manager::TrainingManager;
use crate::management::utils::dataset_split::DatasetSplit;

pub fn initialize() -> Scope {
    web::scope("/status")
        .service(page)
        .service(get_status)
}

#[derive(Serialize)]
struct StatusReport {
    train_images: usize,
    val_images: usize,
    uploaded_images: usize,
    models_trained: usize,
    model_versions: Vec<String>,
    accelerator_available: bool,
}

#[get("")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/status.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[get("/get")]
async fn get_status() -> impl Responder {
    let config = Config::now().await;
    let store = DatasetStore::from_config(&config);
    let train_images = store.image_count(DatasetSplit::Train).await.unwrap_or(0);
    let val_images = store.image_count(DatasetSplit::Val).await.unwrap_or(0);
    let uploaded_images = DatasetStore::count_images_in(Path::new(&config.staging_folder)).await.unwrap_or(0);
    let model_versions = TrainingManager::completed_runs().await;
    HttpResponse::Ok().json(StatusReport {
        train_images,
        val_images,
        uploaded_images,
        models_trained: model_versions.len(),
        model_versions,
        accelerator_available: Monitor::accelerator_available().await,
    })
}
