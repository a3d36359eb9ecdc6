use actix_web::{get, web, HttpResponse, Scope, Responder};
use crate::utils::static_files::StaticFiles;

pub fn initialize() -> Scope {
    web::scope("/javascript")
        .service(script)
}

#[get("/{filename:.*\\.js}")]
async fn script(filename: web::Path<String>) -> impl Responder {
    let asset_path = format!("javascript/{}", filename.into_inner());
    match StaticFiles::get(&asset_path) {
        Some(asset) => HttpResponse::Ok()
            .content_type("application/javascript; charset=utf-8")
            .body(asset.data),
        None => HttpResponse::NotFound().body("No such script"),
    }
}
