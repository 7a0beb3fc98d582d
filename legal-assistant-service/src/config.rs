use std::path::PathBuf;

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORPUS_PATH: &str = "data/saudi_labor_laws.txt";
const DEFAULT_COMPLETION_MODEL: &str = "openai/gpt-4.1-mini";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub port: u16,
    pub reference_corpus_path: PathBuf,
    pub completion_model: String,
    /// Directory holding the pdfium shared library; system lookup when unset
    pub pdfium_library_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Return document previews and raw routing data with chat replies
    pub debug_transcript: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests don't have to touch process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingVar(API_KEY_VAR))?;

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let debug_transcript = match lookup("DEBUG_TRANSCRIPT") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidVar {
                key: "DEBUG_TRANSCRIPT",
                value: raw,
            })?,
        };

        Ok(Self {
            api_key,
            port,
            reference_corpus_path: lookup("REFERENCE_CORPUS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_PATH)),
            completion_model: lookup("COMPLETION_MODEL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            pdfium_library_dir: lookup("PDFIUM_LIBRARY_DIR").map(PathBuf::from),
            max_upload_bytes,
            debug_transcript,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { key, value: raw }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
