use lazy_static::lazy_static;
use std::process::Command;
use sysinfo::System;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::utils::logging::*;
use crate::management::utils::host_information::HostInformation;

lazy_static! {
    static ref MONITOR: RwLock<Monitor> = RwLock::new(Monitor::new());
}

pub struct Monitor {
    information: HostInformation,
}

impl Monitor {
    fn new() -> Self {
        Self {
            information: Self::host_info(),
        }
    }

    pub async fn instance() -> RwLockReadGuard<'static, Self> {
        MONITOR.read().await
    }

    pub async fn instance_mut() -> RwLockWriteGuard<'static, Self> {
        MONITOR.write().await
    }

    pub async fn run() {
        let information = Self::instance().await.information.clone();
        logging_console(information_entry!("Monitor", format!("Host {} ({}), {} with {} cores", information.host_name, information.os_name, information.cpu, information.cores)));
        match &information.accelerator {
            Some(accelerator) => logging_console(information_entry!("Monitor", format!("Accelerator available: {accelerator}"))),
            None => logging_console(information_entry!("Monitor", "No accelerator detected, training will use the CPU")),
        }
    }

    fn host_info() -> HostInformation {
        let sys = System::new_all();
        let host_name = System::host_name().unwrap_or_else(|| "unknown".to_string());
        let os_name = match (System::long_os_version(), System::kernel_version()) {
            (Some(long_os_version), Some(kernel_version)) => format!("{} {}", long_os_version, kernel_version),
            (Some(long_os_version), None) => long_os_version,
            _ => "unknown".to_string(),
        };
        let cpu = sys.cpus().get(0).map(|cpu| cpu.brand().to_string()).unwrap_or_else(|| "unknown".to_string());
        let cores = sys.physical_core_count().unwrap_or(0);
        let ram = sys.total_memory() as f64;
        let accelerator = Self::get_accelerator_name().ok();
        let vram = Self::get_vram_total().ok().map(|vram| vram as f64);
        HostInformation {
            host_name,
            os_name,
            cpu,
            cores,
            ram,
            accelerator,
            vram,
        }
    }

    fn get_accelerator_name() -> Result<String, String> {
        let output = Command::new("nvidia-smi")
            .arg("--query-gpu=name")
            .arg("--format=csv,noheader")
            .output()
            .map_err(|_| "Fail to get accelerator information.".to_string())?;
        if !output.status.success() {
            return Err("Fail to get accelerator information.".to_string());
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if name.is_empty() {
            Err("Fail to get accelerator information.".to_string())
        } else {
            Ok(name)
        }
    }

    fn get_vram_total() -> Result<u64, String> {
        let output = Command::new("nvidia-smi")
            .arg("--query-gpu=memory.total")
            .arg("--format=csv,noheader,nounits")
            .output()
            .map_err(|_| "Fail to get accelerator information.".to_string())?;
        let vram_total = String::from_utf8_lossy(&output.stdout).trim().to_string()
            .parse::<u64>()
            .map_err(|_| "Fail to parse accelerator information.".to_string())?;
        Ok(vram_total * 1_048_576_u64)
    }

    pub async fn accelerator_available() -> bool {
        Self::instance().await.information.accelerator_available()
    }
}
