//! Environment bootstrap
//!
//! The environment is a directory (default `.mcpdemo/`) holding everything a
//! launcher needs before it can run: the default configuration, the demo
//! catalog, and a manifest recording what was installed. The server path
//! calls [`Environment::ensure`], which creates whatever is missing and is a
//! no-op on a complete environment. Client paths call
//! [`Environment::require`], which never writes and fails with
//! [`DemoError::EnvironmentMissing`] so the launcher can tell the user to run
//! the server setup first.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogData;
use crate::config::Config;
use crate::error::{DemoError, Result};

/// Manifest file name; its presence marks a complete environment
pub const MANIFEST_FILE: &str = "manifest.yaml";
/// Default configuration installed by setup
pub const CONFIG_FILE: &str = "config.yaml";
/// Demo data installed by setup
pub const CATALOG_FILE: &str = "catalog.yaml";

/// Record of an installed environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Package that created the environment
    pub name: String,
    /// Package version at creation time
    pub version: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Files written during setup, relative to the environment root
    pub files: Vec<String>,
}

/// Whether [`Environment::ensure`] had to install anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The directory was missing or incomplete and has been populated
    Created,
    /// A complete environment was already present; nothing was written
    Reused,
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapOutcome::Created => write!(f, "created"),
            BootstrapOutcome::Reused => write!(f, "reused"),
        }
    }
}

/// A bootstrapped environment on disk
#[derive(Debug, Clone)]
pub struct Environment {
    root: PathBuf,
    manifest: Manifest,
}

impl Environment {
    /// Create the environment if needed, otherwise reuse it
    ///
    /// Missing files are written first and the manifest last, so an
    /// interrupted setup is completed on the next call rather than being
    /// mistaken for a finished one. Existing files are never overwritten.
    ///
    /// # Arguments
    ///
    /// * `root` - Environment directory
    ///
    /// # Returns
    ///
    /// The environment and whether it was created or reused
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, a file cannot be
    /// written, or an existing manifest cannot be parsed
    pub fn ensure(root: impl AsRef<Path>) -> Result<(Self, BootstrapOutcome)> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);

        if manifest_path.is_file() {
            let manifest = read_manifest(&manifest_path)?;
            tracing::info!("Reusing environment at {}", root.display());
            return Ok((Self { root, manifest }, BootstrapOutcome::Reused));
        }

        tracing::info!("Creating environment at {}", root.display());
        std::fs::create_dir_all(&root)?;

        let installs: [(&str, String); 2] = [
            (CONFIG_FILE, Config::default().to_yaml()?),
            (CATALOG_FILE, CatalogData::default().to_yaml()?),
        ];

        let mut files = Vec::with_capacity(installs.len());
        for (name, contents) in installs {
            let path = root.join(name);
            if path.exists() {
                tracing::debug!("Keeping existing {}", path.display());
            } else {
                std::fs::write(&path, contents)?;
                tracing::debug!("Installed {}", path.display());
            }
            files.push(name.to_string());
        }

        let manifest = Manifest {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            files,
        };
        std::fs::write(&manifest_path, serde_yaml::to_string(&manifest)?)?;

        Ok((Self { root, manifest }, BootstrapOutcome::Created))
    }

    /// Open an existing environment without installing anything
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::EnvironmentMissing`] when no manifest exists
    /// under `root`
    pub fn require(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);

        if !manifest_path.is_file() {
            return Err(DemoError::EnvironmentMissing {
                path: root.display().to_string(),
            }
            .into());
        }

        let manifest = read_manifest(&manifest_path)?;
        Ok(Self { root, manifest })
    }

    /// Environment directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Installed manifest
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Path of the installed configuration file
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path of the installed catalog file
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    /// Load the installed catalog, falling back to the built-in data if the
    /// file was removed after setup
    pub fn load_catalog(&self) -> Result<CatalogData> {
        CatalogData::load_or_default(&self.catalog_path())
    }
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| {
        DemoError::Environment(format!(
            "Corrupt manifest at {}: {}. Remove the environment directory and run setup again",
            path.display(),
            e
        ))
        .into()
    })
}
