//! Resolution of the effective configuration from a file, a profile and
//! individual command-line overrides

use super::{LoggerConfig, RunProfile, SchedulingMode};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Values given on the command line, all optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub profile: Option<RunProfile>,
    pub duration_ms: Option<u64>,
    pub mode: Option<SchedulingMode>,
    pub storage_root: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Build the effective configuration
    ///
    /// The base is `config_file` if given, else `default_file` if it exists,
    /// else the defaults of `profile` (fast when absent). A profile given
    /// together with a file overwrites the file's mode, periods and
    /// duration; the remaining overrides are applied last. The result is
    /// validated.
    pub fn resolve(&self, default_file: Option<&Path>) -> Result<LoggerConfig> {
        let file = self
            .config_file
            .clone()
            .or_else(|| default_file.filter(|path| path.is_file()).map(Path::to_path_buf));

        let mut config = match &file {
            Some(path) => {
                tracing::debug!("Loading configuration from {:?}", path);
                let mut config = LoggerConfig::load(path)?;
                if let Some(profile) = self.profile {
                    config.apply_profile(profile);
                }
                config
            }
            None => LoggerConfig::from_profile(self.profile.unwrap_or_default()),
        };

        if let Some(duration_ms) = self.duration_ms {
            config.run_duration_ms = duration_ms;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(root) = &self.storage_root {
            config.storage.root = root.clone();
        }
        if let Some(path) = &self.transcript {
            config.output.transcript_path = Some(path.clone());
        }
        if let Some(path) = &self.summary_json {
            config.output.summary_json = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
