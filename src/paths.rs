//! Where the configuration, logs and scenario files live.
//!
//! Three layouts are recognized, checked in this order:
//!
//! - **Development** (debug builds only): a `config.yaml` in the working
//!   directory. Scenarios are looked up in `./demos`.
//! - **Portable**: a `.portable` marker next to the executable keeps every
//!   file beside it.
//! - **Installed** (default): the platform data directory, e.g.
//!   `~/.local/share/Tracked Input` or `%APPDATA%\Tracked Input`.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name used under the platform data directory
const APP_NAME: &str = "Tracked Input";

/// Resolved application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration file
    pub config: PathBuf,
    /// Directory searched for relative scenario paths
    pub scenarios_dir: PathBuf,
    /// Rolling log files
    pub logs_dir: PathBuf,
    /// Files live next to the executable (or in the working directory)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect which layout applies.
    ///
    /// Runs before logging is set up, so early diagnostics go to stderr in
    /// debug builds.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join("config.yaml").exists() {
                eprintln!("[paths] development layout ({})", cwd.display());
                return Self::portable(&cwd, "demos");
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] portable layout ({})", exe_dir.display());
            return Self::portable(&exe_dir, "scenarios");
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data directory, using executable directory");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] installed layout ({})", app_data.display());

        Self {
            config: app_data.join("config.yaml"),
            scenarios_dir: app_data.join("scenarios"),
            logs_dir: app_data.join("logs"),
            is_portable: false,
        }
    }

    fn portable(root: &Path, scenarios: &str) -> Self {
        Self {
            config: root.join("config.yaml"),
            scenarios_dir: root.join(scenarios),
            logs_dir: root.join("logs"),
            is_portable: true,
        }
    }

    /// Directory holding the configuration file
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the log directory
    ///
    /// Runs before logging is set up, so it reports nothing itself.
    pub fn ensure_logs_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.logs_dir).with_context(|| {
            format!("Failed to create logs directory: {}", self.logs_dir.display())
        })
    }

    /// In installed mode, create the config directory and seed it with
    /// `config.example.yaml` when one ships next to the binary.
    pub fn ensure_config(&self) -> anyhow::Result<()> {
        if self.is_portable || self.config.exists() {
            return Ok(());
        }

        let base = self.base_dir();
        debug!("Creating config directory: {}", base.display());
        std::fs::create_dir_all(&base)
            .with_context(|| format!("Failed to create config directory: {}", base.display()))?;
        self.seed_config()
    }

    fn seed_config(&self) -> anyhow::Result<()> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let candidates = [
            exe_dir.join("config.example.yaml"),
            PathBuf::from("config.example.yaml"),
        ];
        let Some(example) = candidates.iter().find(|p| p.exists()) else {
            info!("No config found, defaults apply until {} is created", self.config.display());
            return Ok(());
        };

        info!("Seeding {} from {}", self.config.display(), example.display());
        std::fs::copy(example, &self.config).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                example.display(),
                self.config.display()
            )
        })?;
        Ok(())
    }

    /// Resolve a scenario path given on the command line or in the config
    ///
    /// Absolute paths and paths that exist relative to the working directory
    /// are used as-is; anything else is looked up in `scenarios_dir`.
    pub fn resolve_scenario(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        self.scenarios_dir.join(path)
    }
}
