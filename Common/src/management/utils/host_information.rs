use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HostInformation {
    pub host_name: String,
    pub os_name: String,
    pub cpu: String,
    pub cores: usize,
    pub ram: f64,
    pub accelerator: Option<String>,
    pub vram: Option<f64>,
}

impl HostInformation {
    pub fn accelerator_available(&self) -> bool {
        self.accelerator.is_some()
    }
}
