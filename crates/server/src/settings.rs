use std::fs;
use std::path::{Path, PathBuf};

use eyecontact_core::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_IDEAL_DX, DEFAULT_IDEAL_DY, DEFAULT_MAX_MESH_FACES,
    DEFAULT_MESH_CONFIDENCE, DEFAULT_PORT, LEFT_EYE_LANDMARK, RIGHT_EYE_LANDMARK,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Server configuration, loaded from `settings.json` and overridden by
/// command-line flags. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub models_dir: Option<PathBuf>,
    pub detection_model_url: Option<String>,
    pub mesh_model_url: Option<String>,
    pub detection_confidence: f64,
    pub mesh_confidence: f64,
    pub max_mesh_faces: usize,
    pub ideal_dx: f64,
    pub ideal_dy: f64,
    pub left_eye_landmark: usize,
    pub right_eye_landmark: usize,
    /// Frames between timing summaries in the log.
    pub summary_every: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            models_dir: None,
            detection_model_url: None,
            mesh_model_url: None,
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            mesh_confidence: DEFAULT_MESH_CONFIDENCE,
            max_mesh_faces: DEFAULT_MAX_MESH_FACES,
            ideal_dx: DEFAULT_IDEAL_DX,
            ideal_dy: DEFAULT_IDEAL_DY,
            left_eye_landmark: LEFT_EYE_LANDMARK,
            right_eye_landmark: RIGHT_EYE_LANDMARK,
            summary_every: 100,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("EyeContact").join("settings.json"))
    }

    /// Loads settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(p) => Self::read(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::read(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("detection_confidence", self.detection_confidence),
            ("mesh_confidence", self.mesh_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if self.max_mesh_faces == 0 {
            return Err(SettingsError::Invalid(
                "max_mesh_faces must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
