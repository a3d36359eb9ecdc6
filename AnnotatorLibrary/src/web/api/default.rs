use actix_web::{HttpRequest, HttpResponse, Responder};
use crate::utils::static_files::StaticFiles;

pub async fn default_route(req: HttpRequest) -> impl Responder {
    if req.path() == "/" {
        if let Some(index) = StaticFiles::get("html/index.html") {
            return HttpResponse::Ok()
                .content_type("text/html")
                .body(index.data.into_owned());
        }
    }
    HttpResponse::NotFound().body("404 Not Found")
}
