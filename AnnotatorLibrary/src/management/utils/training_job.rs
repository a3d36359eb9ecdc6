use uuid::Uuid;
use std::path::PathBuf;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Persistent record of one training run, written as `job.json` inside
/// the run folder so state survives a service restart.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrainingJob {
    pub uuid: Uuid,
    pub run_name: String,
    pub state: JobState,
    pub artifact_path: Option<PathBuf>,
    pub error: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl TrainingJob {
    pub fn new(run_name: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            run_name,
            state: JobState::Queued,
            artifact_path: None,
            error: None,
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, JobState::Queued | JobState::Running)
    }

    pub fn succeed(&mut self, artifact_path: PathBuf) {
        self.state = JobState::Succeeded;
        self.artifact_path = Some(artifact_path);
        self.finished_at = Some(Local::now());
    }

    pub fn fail(&mut self, error: String) {
        self.state = JobState::Failed;
        self.error = Some(error);
        self.finished_at = Some(Local::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_active() {
        let job = TrainingJob::new("model_v1".to_string());
        assert_eq!(job.state, JobState::Queued);
        assert!(job.is_active());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn finished_job_is_not_active() {
        let mut succeeded = TrainingJob::new("model_v1".to_string());
        succeeded.succeed(PathBuf::from("Runs/model_v1/weights/best.pt"));
        assert!(!succeeded.is_active());
        assert!(succeeded.artifact_path.is_some());

        let mut failed = TrainingJob::new("model_v2".to_string());
        failed.fail("trainer exited with status 1".to_string());
        assert!(!failed.is_active());
        assert!(failed.finished_at.is_some());
    }

    #[test]
    fn job_record_survives_json_round_trip() {
        let mut job = TrainingJob::new("model_v3".to_string());
        job.succeed(PathBuf::from("Runs/model_v3/weights/best.pt"));
        let serialized = serde_json::to_string(&job).expect("Serialization failed.");
        let restored: TrainingJob = serde_json::from_str(&serialized).expect("Deserialization failed.");
        assert_eq!(restored.uuid, job.uuid);
        assert_eq!(restored.state, JobState::Succeeded);
        assert_eq!(restored.artifact_path, job.artifact_path);
    }
}
