use serde::Serialize;
use actix_multipart::Multipart;
use actix_web::{get, post, web, Scope, HttpResponse, Responder};
use crate::utils::config::Config;
use crate::utils::static_files::StaticFiles;
use crate::web::utils::multipart::read_file_field;
use crate::web::utils::response::ErrorResponse;
use crate::management::intake::ImageIntake;
use crate::management::training_manager::TrainingManager;
use crate::management::utils::detection::Detection;

pub fn initialize() -> Scope {
    web::scope("/inference")
        .service(page)
        .service(run)
}

#[derive(Serialize)]
struct InferenceResponse {
    success: bool,
    detections: Vec<Detection>,
}

#[get("")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/inference.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[post("/run")]
async fn run(mut payload: Multipart) -> Result<HttpResponse, actix_web::Error> {
    let config = Config::now().await;
    let intake = ImageIntake::from_config(&config);
    let uploaded = match read_file_field(&mut payload, "file", config.max_payload_size).await? {
        Some(uploaded) => uploaded,
        None => return Ok(HttpResponse::BadRequest().json(ErrorResponse::new("InvalidFileType", "No file selected"))),
    };
    let staged = intake.accept_upload(&uploaded.data, &uploaded.filename).await?;
    //The image is staged only for the duration of the run.
    let result = TrainingManager::run_inference(&staged.path).await;
    let _ = tokio::fs::remove_file(&staged.path).await;
    let detections = result?;
    Ok(HttpResponse::Ok().json(InferenceResponse {
        success: true,
        detections,
    }))
}
