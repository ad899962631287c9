use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::section::{SectionStrategy, DEFAULT_SECTION_MARKER};
use crate::workbook::DEFAULT_SHEET_NAME;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub sheet_name: String,
    pub section_strategy: SectionStrategy,
    pub section_marker: String,
    pub max_upload_mb: usize,
    pub workbook_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            section_strategy: SectionStrategy::FixedOffset,
            section_marker: DEFAULT_SECTION_MARKER.to_string(),
            max_upload_mb: 25,
            workbook_cache_capacity: 16,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            sheet_name: env::var("SHEET_NAME").unwrap_or(defaults.sheet_name),
            section_strategy: match env::var("SECTION_STRATEGY") {
                Ok(value) => SectionStrategy::from_str(&value).map_err(|msg| {
                    ConfigError::InvalidValue {
                        name: "SECTION_STRATEGY",
                        msg,
                    }
                })?,
                Err(_) => defaults.section_strategy,
            },
            section_marker: env::var("SECTION_MARKER").unwrap_or(defaults.section_marker),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .unwrap_or(25),
            workbook_cache_capacity: env::var("WORKBOOK_CACHE_CAPACITY")
                .unwrap_or_else(|_| "16".to_string())
                .parse()
                .unwrap_or(16),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
