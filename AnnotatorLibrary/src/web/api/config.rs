use actix_web::{get, post, web, Responder, HttpResponse, Scope};
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::utils::static_files::StaticFiles;
use crate::web::utils::response::ErrorResponse;

pub fn initialize() -> Scope {
    web::scope("/config")
        .service(page)
        .service(get_config)
        .service(update_config)
}

#[get("")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/config.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[get("/get")]
async fn get_config() -> impl Responder {
    web::Json(Config::now().await)
}

#[post("/update")]
async fn update_config(request: web::Json<Config>) -> impl Responder {
    let updated = request.into_inner();
    if !Config::validate(&updated) {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("InvalidConfiguration", "One or more configuration values are out of range"));
    }
    Config::update(updated).await;
    logging_information!("Config", "Configuration updated");
    HttpResponse::Ok().finish()
}
