//! Environment-driven settings.
//!
//! Everything tunable about a run is read here (a `.env` file is honored) and
//! handed to the generator core as plain values; the core never touches the
//! environment itself.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::generator::batch::BatchOptions;

#[derive(Debug, Clone)]
pub struct Settings {
    pub header_rows_to_skip: usize,
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
    pub default_null_value: String,
    pub null_indicators: Vec<String>,
    pub identity_key: String,
    pub class_key: String,
    pub engine_timeout_secs: u64,
    pub soffice_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let batch = BatchOptions::default();
        Self {
            header_rows_to_skip: batch.header_rows_to_skip,
            placeholder_prefix: batch.placeholder_prefix,
            placeholder_suffix: batch.placeholder_suffix,
            default_null_value: batch.default_null_value,
            null_indicators: batch.null_indicators,
            identity_key: batch.identity_key,
            class_key: batch.class_key,
            engine_timeout_secs: 60,
            soffice_path: None,
            output_dir: PathBuf::from("./reports"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            header_rows_to_skip: env_parse("REPORT_HEADER_ROWS_TO_SKIP", defaults.header_rows_to_skip),
            placeholder_prefix: env_string("REPORT_PLACEHOLDER_PREFIX", &defaults.placeholder_prefix),
            placeholder_suffix: env_string("REPORT_PLACEHOLDER_SUFFIX", &defaults.placeholder_suffix),
            default_null_value: env_string("REPORT_DEFAULT_NULL_VALUE", &defaults.default_null_value),
            null_indicators: env_list("REPORT_NULL_INDICATORS", &defaults.null_indicators),
            identity_key: env_string("REPORT_IDENTITY_KEY", &defaults.identity_key),
            class_key: env_string("REPORT_CLASS_KEY", &defaults.class_key),
            engine_timeout_secs: env_parse("REPORT_ENGINE_TIMEOUT_SECS", defaults.engine_timeout_secs),
            soffice_path: env::var("REPORT_SOFFICE_PATH").ok().map(PathBuf::from),
            output_dir: env::var("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            header_rows_to_skip: self.header_rows_to_skip,
            placeholder_prefix: self.placeholder_prefix.clone(),
            placeholder_suffix: self.placeholder_suffix.clone(),
            default_null_value: self.default_null_value.clone(),
            null_indicators: self.null_indicators.clone(),
            identity_key: self.identity_key.clone(),
            class_key: self.class_key.clone(),
        }
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{key}='{raw}' is not valid, using the default");
            default
        }),
        Err(_) => default,
    }
}

fn env_list(key: &str, default: &[String]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => {
            let values: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                default.to_vec()
            } else {
                values
            }
        }
        Err(_) => default.to_vec(),
    }
}
