use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub info_command: String,
    pub download_command: String,
    pub help_command: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            // Default settings
            .set_default("server_port", 3000)?
            .set_default("data_dir", "./data")?
            .set_default("log_level", "info")?
            .set_default("info_command", "jm")?
            .set_default("download_command", "jm_download")?
            .set_default("help_command", "jm_help")?
            // Config file (optional)
            .add_source(File::with_name("config").required(false))
            // Environment variables (e.g. JM_RELAY_SERVER_PORT=8080)
            .add_source(Environment::with_prefix("JM_RELAY"));

        builder.build()?.try_deserialize()
    }

    pub fn option_path(&self) -> PathBuf {
        self.data_dir.join("option.yml")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("pdf")
    }
}
