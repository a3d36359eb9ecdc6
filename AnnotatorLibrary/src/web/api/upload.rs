use serde::Serialize;
use actix_multipart::Multipart;
use actix_web::{get, post, web, Scope, HttpResponse, Responder};
use crate::utils::config::Config;
use crate::utils::static_files::StaticFiles;
use crate::web::utils::multipart::read_file_field;
use crate::web::utils::response::ErrorResponse;
use crate::management::intake::{ImageIntake, IntakeError};

pub fn initialize() -> Scope {
    web::scope("/upload")
        .service(page)
        .service(save_file)
        .service(staged_file)
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    filename: String,
    width: u32,
    height: u32,
}

#[get("")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/upload.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[post("/save_file")]
async fn save_file(mut payload: Multipart) -> Result<HttpResponse, IntakeError> {
    let config = Config::now().await;
    let intake = ImageIntake::from_config(&config);
    match read_file_field(&mut payload, "file", config.max_payload_size).await? {
        Some(uploaded) => {
            let staged = intake.accept_upload(&uploaded.data, &uploaded.filename).await?;
            Ok(HttpResponse::Ok().json(UploadResponse {
                success: true,
                filename: staged.filename,
                width: staged.width,
                height: staged.height,
            }))
        },
        None => Ok(HttpResponse::BadRequest().json(ErrorResponse::new("InvalidFileType", "No file selected"))),
    }
}

#[get("/file/{filename}")]
async fn staged_file(filename: web::Path<String>) -> impl Responder {
    let filename = filename.into_inner();
    let config = Config::now().await;
    let intake = ImageIntake::from_config(&config);
    let path = match intake.staged_path(&filename) {
        Some(path) => path,
        None => return HttpResponse::NotFound().json(ErrorResponse::new("NotFound", "Staged image not found")),
    };
    match tokio::fs::read(&path).await {
        Ok(data) => HttpResponse::Ok().content_type(image_content_type(&filename)).body(data),
        Err(_) => HttpResponse::NotFound().json(ErrorResponse::new("NotFound", "Staged image not found")),
    }
}

fn image_content_type(filename: &str) -> &'static str {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
