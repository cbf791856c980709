use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::foundation::error::{SnapError, SnapResult};

/// Process-wide settings for storage, fonts and encoding.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Directory backing [`crate::FileKvStore`].
    pub store_dir: PathBuf,
    /// Total byte budget for persisted values. `None` means unlimited.
    pub quota_bytes: Option<u64>,
    /// Directories scanned (non-recursively) for caption and sticker font files.
    pub font_dirs: Vec<PathBuf>,
    /// Upper bound on the font-ready wait before compositing.
    pub font_wait_ms: u64,
    /// Longer-side bound applied when a photo is ingested.
    pub ingest_max_side: u32,
    /// JPEG quality in `(0, 1]` used for ingest and final composites.
    pub jpeg_quality: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("snapbook-data"),
            // Roughly what a browser origin gets for local storage.
            quota_bytes: Some(5 * 1024 * 1024),
            font_dirs: vec![PathBuf::from("fonts")],
            font_wait_ms: 3500,
            ingest_max_side: 1200,
            jpeg_quality: 0.92,
        }
    }
}

impl SnapConfig {
    /// Defaults with `SNAPBOOK_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a JSON config file; missing fields take their defaults, then env overrides apply.
    pub fn from_path(path: &Path) -> SnapResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)?;
        let cfg = cfg.with_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `SNAPBOOK_STORE_DIR`, `SNAPBOOK_QUOTA_BYTES`, `SNAPBOOK_FONT_DIRS` and
    /// `SNAPBOOK_FONT_WAIT_MS`. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("SNAPBOOK_STORE_DIR")
            && !v.trim().is_empty()
        {
            self.store_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SNAPBOOK_QUOTA_BYTES") {
            match v.trim() {
                "" | "none" | "unlimited" => self.quota_bytes = None,
                s => {
                    if let Ok(n) = s.parse::<u64>() {
                        self.quota_bytes = Some(n);
                    }
                }
            }
        }
        if let Some(v) = std::env::var_os("SNAPBOOK_FONT_DIRS") {
            let dirs: Vec<PathBuf> = std::env::split_paths(&v).collect();
            if !dirs.is_empty() {
                self.font_dirs = dirs;
            }
        }
        if let Some(ms) = std::env::var("SNAPBOOK_FONT_WAIT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.font_wait_ms = ms;
        }
        self
    }

    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> SnapResult<()> {
        if self.ingest_max_side == 0 {
            return Err(SnapError::validation("ingest_max_side must be > 0"));
        }
        if !self.jpeg_quality.is_finite() || self.jpeg_quality <= 0.0 || self.jpeg_quality > 1.0 {
            return Err(SnapError::validation("jpeg_quality must be in (0, 1]"));
        }
        Ok(())
    }

    /// Font wait bound as a [`Duration`].
    pub fn font_wait(&self) -> Duration {
        Duration::from_millis(self.font_wait_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
