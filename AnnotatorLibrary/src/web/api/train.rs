use uuid::Uuid;
use serde::{Deserialize, Serialize};
use actix_web::{get, post, web, Scope, HttpResponse, Responder};
use crate::utils::static_files::StaticFiles;
use crate::web::utils::response::ErrorResponse;
use crate::management::training_manager::{TrainingManager, TrainingError};

pub fn initialize() -> Scope {
    web::scope("/train")
        .service(page)
        .service(start)
        .service(job)
        .service(jobs)
}

#[derive(Deserialize)]
struct StartTrainingRequest {
    #[serde(default = "default_run_name")]
    run_name: String,
}

fn default_run_name() -> String {
    "model_v1".to_string()
}

#[derive(Serialize)]
struct StartTrainingResponse {
    success: bool,
    job_id: Uuid,
    message: String,
}

#[get("")]
async fn page() -> impl Responder {
    let html = StaticFiles::get("html/train.html").expect("File not found in static files.").data;
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[post("/start")]
async fn start(request: web::Json<StartTrainingRequest>) -> Result<HttpResponse, TrainingError> {
    let request = request.into_inner();
    let job_id = TrainingManager::start_training(&request.run_name).await?;
    Ok(HttpResponse::Ok().json(StartTrainingResponse {
        success: true,
        job_id,
        message: format!("Training run {} started", request.run_name),
    }))
}

#[get("/job/{job_id}")]
async fn job(job_id: web::Path<Uuid>) -> impl Responder {
    match TrainingManager::get_job(job_id.into_inner()).await {
        Some(job) => HttpResponse::Ok().json(job),
        None => HttpResponse::NotFound().json(ErrorResponse::new("NotFound", "No such training job")),
    }
}

#[get("/jobs")]
async fn jobs() -> impl Responder {
    HttpResponse::Ok().json(TrainingManager::job_list().await)
}
