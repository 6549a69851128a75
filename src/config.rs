use anyhow::bail;
use std::path::PathBuf;

use crate::records;

pub const RECORDS_PATHS_ENV: &str = "CLASSROOMD_RECORDS_PATHS";
pub const LOAD_ON_START_ENV: &str = "CLASSROOMD_LOAD_ON_START";

#[derive(Debug, Clone)]
pub struct Config {
    pub record_candidates: Vec<PathBuf>,
    pub load_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            record_candidates: records::default_candidates(),
            load_on_start: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var_os(k).map(|v| v.to_string_lossy().to_string()))
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(RECORDS_PATHS_ENV) {
            let paths: Vec<PathBuf> = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !paths.is_empty() {
                cfg.record_candidates = paths;
            }
        }

        if let Some(raw) = lookup(LOAD_ON_START_ENV) {
            cfg.load_on_start = match parse_boolish(&raw) {
                Some(v) => v,
                None => bail!("{} must be a boolean, got {:?}", LOAD_ON_START_ENV, raw),
            };
        }

        Ok(cfg)
    }
}

fn parse_boolish(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
