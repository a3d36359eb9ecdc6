use serde::{Deserialize, Serialize};
use actix_web::{get, post, web, Scope, HttpResponse, Responder};
use crate::utils::config::Config;
use crate::utils::static_files::StaticFiles;
use crate::web::utils::response::ErrorResponse;
use crate::management::intake::ImageIntake;
use crate::management::committer::{AnnotationCommitter, CommitError};
use crate::management::utils::bounding_box::BoundingBox;
use crate::management::utils::dataset_split::DatasetSplit;

pub fn initialize() -> Scope {
    web::scope("/annotate")
        .service(info)
        .service(save)
        .service(page)
}

#[derive(Serialize)]
struct AnnotateInfo {
    filename: String,
    width: u32,
    height: u32,
    classes: Vec<String>,
    min_box_size: u32,
}

#[derive(Deserialize)]
struct SaveAnnotationsRequest {
    filename: String,
    #[serde(default)]
    annotations: Vec<BoundingBox>,
    #[serde(default)]
    dataset_type: DatasetSplit,
}

#[derive(Serialize)]
struct SaveAnnotationsResponse {
    success: bool,
    message: String,
    saved_boxes: usize,
    discarded_boxes: usize,
}

#[get("/{filename}")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/annotate.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[get("/info/{filename}")]
async fn info(filename: web::Path<String>) -> impl Responder {
    let filename = filename.into_inner();
    let config = Config::now().await;
    let intake = ImageIntake::from_config(&config);
    let path = match intake.staged_path(&filename) {
        Some(path) if path.is_file() => path,
        _ => return HttpResponse::NotFound().json(ErrorResponse::new("NotFound", "Staged image not found")),
    };
    match image::image_dimensions(&path) {
        Ok((width, height)) => HttpResponse::Ok().json(AnnotateInfo {
            filename,
            width,
            height,
            classes: config.class_names.clone(),
            min_box_size: config.min_box_size,
        }),
        Err(err) => HttpResponse::BadRequest().json(ErrorResponse::new("ImageDecodeError", err.to_string())),
    }
}

#[post("/save")]
async fn save(request: web::Json<SaveAnnotationsRequest>) -> Result<HttpResponse, CommitError> {
    let request = request.into_inner();
    let config = Config::now().await;
    let committer = AnnotationCommitter::from_config(&config);
    let summary = committer.commit(&request.filename, &request.annotations, request.dataset_type).await?;
    Ok(HttpResponse::Ok().json(SaveAnnotationsResponse {
        success: true,
        message: format!("Image and annotations saved to the {} dataset", summary.split),
        saved_boxes: summary.saved_boxes,
        discarded_boxes: summary.discarded_boxes,
    }))
}
