use uuid::Uuid;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use lazy_static::lazy_static;
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::web::utils::response::ErrorResponse;
use crate::management::dataset::DatasetStore;
use crate::management::utils::detection::Detection;
use crate::management::utils::training_job::{JobState, TrainingJob};

lazy_static! {
    static ref TRAINING_MANAGER: RwLock<TrainingManager> = RwLock::new(TrainingManager::new());
}

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("Training run {0} is already in progress")]
    AlreadyRunning(String),
    #[error("Unable to launch training: {0}")]
    LaunchFailure(String),
}

impl actix_web::ResponseError for TrainingError {
    fn status_code(&self) -> StatusCode {
        match self {
            TrainingError::AlreadyRunning(_) => StatusCode::CONFLICT,
            TrainingError::LaunchFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new("TrainingLaunchFailure", self.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference did not finish within {0} seconds")]
    Timeout(u64),
    #[error("No trained model artifact is available")]
    NoModel,
    #[error("Inference run failed: {0}")]
    Failure(String),
}

impl InferenceError {
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Timeout(_) => "InferenceTimeout",
            InferenceError::NoModel | InferenceError::Failure(_) => "InferenceFailure",
        }
    }
}

impl actix_web::ResponseError for InferenceError {
    fn status_code(&self) -> StatusCode {
        match self {
            InferenceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            InferenceError::NoModel => StatusCode::NOT_FOUND,
            InferenceError::Failure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.kind(), self.to_string()))
    }
}

/// Launches the external trainer fire-and-forget and keeps one persisted
/// job record per run so status is read from the record instead of being
/// inferred from directory existence. Inference is the only bounded-wait
/// external call.
pub struct TrainingManager {
    jobs: HashMap<Uuid, TrainingJob>,
}

impl TrainingManager {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    pub async fn instance() -> RwLockReadGuard<'static, Self> {
        TRAINING_MANAGER.read().await
    }

    pub async fn instance_mut() -> RwLockWriteGuard<'static, Self> {
        TRAINING_MANAGER.write().await
    }

    pub async fn run() {
        Self::restore_jobs().await;
        logging_information!("Training Manager", "Online now");
    }

    /// Reloads persisted job records. A job still marked running was
    /// interrupted by a restart and is flipped to failed so its run name
    /// becomes startable again.
    async fn restore_jobs() {
        let config = Config::now().await;
        let runs_folder = PathBuf::from(&config.runs_folder);
        let mut dir_entries = match fs::read_dir(&runs_folder).await {
            Ok(dir_entries) => dir_entries,
            Err(_) => return,
        };
        let mut restored = 0_usize;
        while let Ok(Some(entry)) = dir_entries.next_entry().await {
            let run_folder = entry.path();
            let record_path = run_folder.join("job.json");
            let record = match fs::read_to_string(&record_path).await {
                Ok(record) => record,
                Err(_) => continue,
            };
            let mut job = match serde_json::from_str::<TrainingJob>(&record) {
                Ok(job) => job,
                Err(err) => {
                    logging_warning!("Training Manager", format!("Ignoring unreadable job record {}", record_path.display()), format!("Err: {err}"));
                    continue;
                },
            };
            if job.is_active() {
                job.fail("Interrupted by a service restart".to_string());
                Self::persist_job(&run_folder, &job).await;
            }
            Self::instance_mut().await.jobs.insert(job.uuid, job);
            restored += 1;
        }
        if restored > 0 {
            logging_information!("Training Manager", format!("Restored {restored} job records"));
        }
    }

    pub async fn start_training(run_name: &str) -> Result<Uuid, TrainingError> {
        if run_name.is_empty() || !run_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(TrainingError::LaunchFailure(format!("Invalid run name {run_name}")));
        }
        let mut job = Self::reserve_run(run_name).await?;
        let job_uuid = job.uuid;
        let config = Config::now().await;
        let store = DatasetStore::from_config(&config);
        let descriptor_path = match store.write_descriptor().await {
            Ok(descriptor_path) => descriptor_path,
            Err(err) => return Err(Self::release_reservation(job_uuid, err.to_string()).await),
        };
        let run_folder = PathBuf::from(&config.runs_folder).join(run_name);
        if let Err(err) = fs::create_dir_all(&run_folder).await {
            return Err(Self::release_reservation(job_uuid, err.to_string()).await);
        }
        let child = Command::new(&config.training_command)
            .arg(&descriptor_path)
            .arg(&run_folder)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(err) => return Err(Self::release_reservation(job_uuid, err.to_string()).await),
        };
        job.state = JobState::Running;
        Self::persist_job(&run_folder, &job).await;
        Self::instance_mut().await.jobs.insert(job_uuid, job);
        logging_information!("Training Manager", format!("Training run {run_name} started"));
        tokio::spawn(async move {
            let exit = child.wait().await;
            let mut manager = Self::instance_mut().await;
            if let Some(job) = manager.jobs.get_mut(&job_uuid) {
                match exit {
                    Ok(status) if status.success() => job.succeed(run_folder.join("weights").join("best.pt")),
                    Ok(status) => job.fail(format!("Trainer exited with {status}")),
                    Err(err) => job.fail(format!("Trainer wait failed: {err}")),
                }
                let job = job.clone();
                drop(manager);
                Self::persist_job(&run_folder, &job).await;
                match job.state {
                    JobState::Succeeded => logging_information!("Training Manager", format!("Training run {} completed", job.run_name)),
                    _ => logging_error!("Training Manager", format!("Training run {} failed", job.run_name), job.error.clone().unwrap_or_default()),
                }
            }
        });
        Ok(job_uuid)
    }

    /// Checks for an active job with the same run name and records a
    /// queued placeholder under one write lock, so two overlapping starts
    /// of one run name cannot both pass the check.
    async fn reserve_run(run_name: &str) -> Result<TrainingJob, TrainingError> {
        let mut manager = Self::instance_mut().await;
        let already_running = manager.jobs.values()
            .any(|job| job.run_name == run_name && job.is_active());
        if already_running {
            return Err(TrainingError::AlreadyRunning(run_name.to_string()));
        }
        let job = TrainingJob::new(run_name.to_string());
        manager.jobs.insert(job.uuid, job.clone());
        Ok(job)
    }

    /// Withdraws a reservation whose launch never happened, making the
    /// run name startable again.
    async fn release_reservation(job_uuid: Uuid, reason: String) -> TrainingError {
        Self::instance_mut().await.jobs.remove(&job_uuid);
        TrainingError::LaunchFailure(reason)
    }

    pub async fn get_job(job_uuid: Uuid) -> Option<TrainingJob> {
        Self::instance().await.jobs.get(&job_uuid).cloned()
    }

    pub async fn job_list() -> Vec<TrainingJob> {
        let mut jobs: Vec<TrainingJob> = Self::instance().await.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.started_at);
        jobs
    }

    pub async fn completed_runs() -> Vec<String> {
        Self::job_list().await.into_iter()
            .filter(|job| job.state == JobState::Succeeded)
            .map(|job| job.run_name)
            .collect()
    }

    pub async fn run_inference(image_path: &Path) -> Result<Vec<Detection>, InferenceError> {
        let config = Config::now().await;
        let model_path = Self::latest_artifact().await.ok_or(InferenceError::NoModel)?;
        let output_future = Command::new(&config.inference_command)
            .arg(&model_path)
            .arg(image_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        match timeout(Duration::from_secs(config.inference_timeout), output_future).await {
            Err(_) => Err(InferenceError::Timeout(config.inference_timeout)),
            Ok(Err(err)) => Err(InferenceError::Failure(err.to_string())),
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    return Err(InferenceError::Failure(stderr));
                }
                serde_json::from_slice::<Vec<Detection>>(&output.stdout)
                    .map_err(|err| InferenceError::Failure(format!("Unparsable runner output: {err}")))
            },
        }
    }

    async fn latest_artifact() -> Option<PathBuf> {
        Self::job_list().await.into_iter().rev()
            .find(|job| job.state == JobState::Succeeded)
            .and_then(|job| job.artifact_path)
    }

    async fn persist_job(run_folder: &Path, job: &TrainingJob) {
        let record_path = run_folder.join("job.json");
        match serde_json::to_string_pretty(job) {
            Ok(record) => {
                if let Err(err) = fs::write(&record_path, record).await {
                    logging_error!("Training Manager", format!("Cannot persist job record {}", record_path.display()), format!("Err: {err}"));
                }
            },
            Err(err) => logging_error!("Training Manager", "Cannot serialize job record", format!("Err: {err}")),
        }
    }
}
