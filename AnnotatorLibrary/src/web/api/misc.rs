use actix_web::{get, web, HttpResponse, Scope, Responder};
use crate::utils::static_files::StaticFiles;

pub fn initialize() -> Scope {
    web::scope("/misc")
        .service(asset)
}

#[get("/{filename}")]
async fn asset(filename: web::Path<String>) -> impl Responder {
    let filename = filename.into_inner();
    let asset_path = format!("misc/{}", filename);
    match StaticFiles::get(&asset_path) {
        Some(asset) => HttpResponse::Ok()
            .content_type(asset_content_type(&filename))
            .body(asset.data),
        None => HttpResponse::NotFound().body("No such asset"),
    }
}

fn asset_content_type(filename: &str) -> &'static str {
    match filename.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
