//! Static assets read once at startup.

use std::fs;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;

use crate::config::AssetsConfig;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {kind} `{}`: {source}", path.display())]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bootstrap script and landing page, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Assets {
    bootstrap_script: String,
    landing_page: Bytes,
}

impl Assets {
    pub fn new(bootstrap_script: impl Into<String>, landing_page: impl Into<Bytes>) -> Self {
        Self {
            bootstrap_script: bootstrap_script.into(),
            landing_page: landing_page.into(),
        }
    }

    pub fn load(config: &AssetsConfig) -> Result<Self, AssetError> {
        let script_path = Path::new(&config.bootstrap_script);
        let bootstrap_script = fs::read_to_string(script_path).map_err(|source| AssetError::Read {
            kind: "bootstrap script",
            path: script_path.to_path_buf(),
            source,
        })?;

        let landing_path = Path::new(&config.landing_page);
        let landing_page = fs::read(landing_path).map_err(|source| AssetError::Read {
            kind: "landing page",
            path: landing_path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            bootstrap_script = %script_path.display(),
            script_bytes = bootstrap_script.len(),
            landing_page = %landing_path.display(),
            "Assets loaded"
        );

        Ok(Self::new(bootstrap_script, landing_page))
    }

    pub fn bootstrap_script(&self) -> &str {
        &self.bootstrap_script
    }

    pub fn landing_page(&self) -> Bytes {
        self.landing_page.clone()
    }
}
