/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "127.0.0.1:8788";
const DB_FILE_NAME: &str = "murmur.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: String,
    pub db_path: PathBuf,
    pub max_body_bytes: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let db_path = default_data_dir()
            .map(|d| d.join(DB_FILE_NAME))
            .unwrap_or_else(|_| PathBuf::from(DB_FILE_NAME));
        Self {
            bind: DEFAULT_BIND.to_string(),
            db_path,
            max_body_bytes: 256 * 1024,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    if let Ok(v) = std::env::var("MURMUR_DATA_DIR") {
        if !v.trim().is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    let proj = ProjectDirs::from("net", "murmur", "Murmur").context("unable to determine platform data dir")?;
    Ok(proj.data_local_dir().to_path_buf())
}

impl ServiceConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: ServiceConfig = serde_json::from_str(text).context("parse config json")?;
        cfg.validated()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Env-var overrides on top of the defaults. `lookup` is `std::env::var` in production.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = ServiceConfig::default();
        if let Some(v) = get("MURMUR_BIND") {
            cfg.bind = v;
        }
        if let Some(v) = get("MURMUR_DB") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("MURMUR_MAX_BODY_BYTES") {
            cfg.max_body_bytes = v.parse().context("MURMUR_MAX_BODY_BYTES invalid")?;
        }
        if let Some(v) = get("MURMUR_PAGE_SIZE") {
            cfg.default_page_size = v.parse().context("MURMUR_PAGE_SIZE invalid")?;
        }
        if let Some(v) = get("MURMUR_MAX_PAGE_SIZE") {
            cfg.max_page_size = v.parse().context("MURMUR_MAX_PAGE_SIZE invalid")?;
        }
        cfg.validated()
    }

    /// `--config <path>` wins over `MURMUR_CONFIG`; with neither, env vars are used.
    pub fn load(args: impl IntoIterator<Item = String>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                let path = args.next().context("--config requires a path")?;
                return Self::from_file(Path::new(&path));
            }
        }
        if let Some(path) = lookup("MURMUR_CONFIG").filter(|p| !p.trim().is_empty()) {
            return Self::from_file(Path::new(path.trim()));
        }
        Self::from_lookup(lookup)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().with_context(|| format!("invalid bind address: {}", self.bind))
    }

    fn validated(mut self) -> Result<Self> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be positive");
        }
        self.default_page_size = self.default_page_size.max(1);
        self.max_page_size = self.max_page_size.max(self.default_page_size);
        Ok(self)
    }
}
