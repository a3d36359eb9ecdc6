use tokio::fs;
use tokio::time::sleep;
use std::time::Duration;
use actix_web::{web, App, HttpServer};
use Common::management::monitor::Monitor;
use crate::utils::logging::*;
use crate::utils::config::Config;
use crate::management::dataset::DatasetStore;
use crate::management::training_manager::TrainingManager;
use crate::web::api::{annotate, config, default, inference, javascript, log, misc, status, train, upload};

pub struct Annotator;

impl Annotator {
    pub async fn run() {
        Config::now().await;
        Self::prepare_folders().await;
        Monitor::run().await;
        TrainingManager::run().await;
        let http_server = loop {
            let config = Config::now().await;
            let http_server = HttpServer::new(|| {
                App::new()
                    .service(annotate::initialize())
                    .service(config::initialize())
                    .service(inference::initialize())
                    .service(javascript::initialize())
                    .service(log::initialize())
                    .service(misc::initialize())
                    .service(status::initialize())
                    .service(train::initialize())
                    .service(upload::initialize())
                    .default_service(web::route().to(default::default_route))
            }).bind(format!("0.0.0.0:{}", config.http_server_bind_port));
            match http_server {
                Ok(http_server) => break http_server,
                Err(err) => {
                    logging_critical!("Annotator", "Failed to bind port", format!("Err: {err}"));
                    sleep(Duration::from_secs(config.bind_retry_duration)).await;
                    continue;
                },
            }
        };
        logging_information!("Annotator", "Web service ready");
        logging_information!("Annotator", "Online now");
        if let Err(err) = http_server.run().await {
            logging_emergency!("Annotator", "An error occurred while running the web service", format!("Err: {err}"));
        }
    }

    pub async fn terminate() {
        logging_information!("Annotator", "Offline now");
    }

    async fn prepare_folders() {
        let config = Config::now().await;
        for folder in [&config.staging_folder, &config.runs_folder] {
            match fs::create_dir_all(folder).await {
                Ok(_) => logging_information!("Annotator", format!("Folder {folder} is ready")),
                Err(err) => logging_error!("Annotator", format!("Cannot create folder {folder}"), format!("Err: {err}")),
            }
        }
        DatasetStore::from_config(&config).prepare().await;
    }
}
