use std::fs;
use tokio::sync::RwLock;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use crate::utils::logging::*;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

#[derive(Debug, Deserialize)]
struct ConfigTable {
    #[serde(rename = "Config")]
    config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub http_server_bind_port: u16, //port
    pub bind_retry_duration: u64, //seconds
    pub staging_folder: String, //path
    pub dataset_folder: String, //path
    pub runs_folder: String, //path
    pub class_names: Vec<String>, //ordered, index is class_id
    pub max_payload_size: u64, //bytes
    pub min_box_size: u32, //pixels
    pub inference_timeout: u64, //seconds
    pub training_command: String, //external trainer executable
    pub inference_command: String, //external model runner executable
}

impl Config {
    pub fn new() -> Self {
        //Seriously, the program must be terminated.
        match fs::read_to_string("./annotator.toml") {
            Ok(toml_string) => {
                match toml::from_str::<ConfigTable>(&toml_string) {
                    Ok(config_table) => {
                        let config = config_table.config;
                        if !Self::validate(&config) {
                            logging_console!(emergency_entry!("Config", "Invalid configuration file"));
                            panic!("Invalid configuration file");
                        }
                        config
                    },
                    Err(err) => {
                        logging_console!(emergency_entry!("Config", "Unable to parse configuration file", format!("Err: {err}")));
                        panic!("Unable to parse configuration file");
                    },
                }
            },
            Err(err) => {
                logging_console!(emergency_entry!("Config", "Configuration file not found", format!("Err: {err}")));
                panic!("Configuration file not found");
            },
        }
    }

    pub async fn now() -> Config {
        CONFIG.read().await.clone()
    }

    pub async fn update(config: Config) {
        *CONFIG.write().await = config
    }

    pub fn validate(config: &Config) -> bool {
        Config::validate_second(config.bind_retry_duration)
            && Config::validate_folder(&config.staging_folder)
            && Config::validate_folder(&config.dataset_folder)
            && Config::validate_folder(&config.runs_folder)
            && Config::validate_class_names(&config.class_names)
            && Config::validate_payload_size(config.max_payload_size)
            && Config::validate_box_size(config.min_box_size)
            && Config::validate_timeout(config.inference_timeout)
            && Config::validate_command(&config.training_command)
            && Config::validate_command(&config.inference_command)
    }

    fn validate_second(second: u64) -> bool {
        second <= 3600
    }

    fn validate_folder(folder: &str) -> bool {
        !folder.trim().is_empty()
    }

    fn validate_class_names(class_names: &[String]) -> bool {
        !class_names.is_empty() && class_names.iter().all(|name| !name.trim().is_empty())
    }

    fn validate_payload_size(size: u64) -> bool {
        size > 0_u64 && size <= 268_435_456_u64
    }

    fn validate_box_size(size: u32) -> bool {
        size > 0_u32 && size <= 1024_u32
    }

    fn validate_timeout(second: u64) -> bool {
        second > 0_u64 && second <= 3600_u64
    }

    fn validate_command(command: &str) -> bool {
        !command.trim().is_empty()
    }
}
