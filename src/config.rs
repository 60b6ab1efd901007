// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RecognizerError, Result};

/// Tuning forwarded to one landmark detector stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorTuning {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub min_presence_confidence: f32,
    pub max_instances: usize,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
            min_presence_confidence: 0.5,
            max_instances: 1,
        }
    }
}

impl DetectorTuning {
    fn hands() -> Self {
        Self {
            max_instances: 2,
            ..Self::default()
        }
    }
}

/// Overlay projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Exponential smoothing weight on the previous projected point.
    pub smoothing_factor: f32,
    /// Flip x for a front camera.
    pub mirror: bool,
    /// Scale to cover the viewport instead of fitting inside it.
    pub fill_viewport: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.8,
            mirror: true,
            fill_viewport: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Frames per classifier window.
    pub window_len: usize,
    /// Consecutive raw predictions that must agree before a commit.
    pub consensus_len: usize,
    /// Scores at or below this are not recorded at all.
    pub confidence_floor: f32,
    /// A unanimous run must beat this to commit its label.
    pub commit_threshold: f32,
    /// Committed labels kept in the output sentence.
    pub sentence_cap: usize,
    /// Detector results older than this relative to the newest source are
    /// zeroed for the cycle. Zero disables the check.
    pub max_source_skew_ms: i64,
    /// Ordered label set the classifier scores against.
    pub actions: Vec<String>,
    pub hands: DetectorTuning,
    pub pose: DetectorTuning,
    pub face: DetectorTuning,
    pub overlay: OverlayConfig,
    /// Session exports land here.
    pub export_dir: PathBuf,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            window_len: 30,
            consensus_len: 5,
            confidence_floor: 0.1,
            commit_threshold: 0.3,
            sentence_cap: 5,
            max_source_skew_ms: 500,
            actions: vec!["hello".into(), "thanks".into(), "iloveyou".into()],
            hands: DetectorTuning::hands(),
            pose: DetectorTuning::default(),
            face: DetectorTuning::default(),
            overlay: OverlayConfig::default(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|docs| docs.join("SignTracker")))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}

impl RecognizerConfig {
    /// Reads the config from `path`, replacing a missing or unparsable
    /// file with the defaults. Whatever config comes back is saved to the
    /// file again so it carries every current field.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %path.display(), %err, "config unparsable, rewriting with defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.validate()?;
        // Save back so fields added since the file was written get populated.
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_len == 0 {
            return Err(RecognizerError::InvalidConfig(
                "window_len must be at least 1".into(),
            ));
        }
        if self.consensus_len == 0 {
            return Err(RecognizerError::InvalidConfig(
                "consensus_len must be at least 1".into(),
            ));
        }
        if self.sentence_cap == 0 {
            return Err(RecognizerError::InvalidConfig(
                "sentence_cap must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(RecognizerError::InvalidConfig(format!(
                "confidence_floor {} outside [0, 1]",
                self.confidence_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.commit_threshold) {
            return Err(RecognizerError::InvalidConfig(format!(
                "commit_threshold {} outside [0, 1]",
                self.commit_threshold
            )));
        }
        if self.max_source_skew_ms < 0 {
            return Err(RecognizerError::InvalidConfig(
                "max_source_skew_ms must not be negative".into(),
            ));
        }
        if self.actions.is_empty() {
            return Err(RecognizerError::InvalidConfig(
                "actions must name at least one label".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.overlay.smoothing_factor) {
            return Err(RecognizerError::InvalidConfig(format!(
                "overlay smoothing_factor {} outside [0, 1)",
                self.overlay.smoothing_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = RecognizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_len, 30);
        assert_eq!(config.consensus_len, 5);
        assert_eq!(config.actions, vec!["hello", "thanks", "iloveyou"]);
        assert_eq!(config.hands.max_instances, 2);
        assert_eq!(config.face.max_instances, 1);
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = RecognizerConfig {
            window_len: 0,
            ..RecognizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let config = RecognizerConfig {
            commit_threshold: 1.5,
            ..RecognizerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RecognizerConfig {
            confidence_floor: -0.1,
            ..RecognizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_label_set_is_rejected() {
        let config = RecognizerConfig {
            actions: Vec::new(),
            ..RecognizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{"window_len": 10, "actions": ["yes", "no"]}"#).unwrap();
        assert_eq!(config.window_len, 10);
        assert_eq!(config.actions, vec!["yes", "no"]);
        assert_eq!(config.consensus_len, 5);
        assert!((config.commit_threshold - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = std::env::temp_dir().join(format!("sign_tracker_cfg_{}", std::process::id()));
        let path = dir.join("config.json");
        let _ = fs::remove_file(&path);

        let loaded = RecognizerConfig::load(&path).unwrap();
        assert_eq!(loaded.window_len, 30);
        assert!(path.exists(), "load writes the defaults back");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn garbage_file_is_rewritten_with_defaults() {
        let dir = std::env::temp_dir().join(format!("sign_tracker_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "not json at all").unwrap();

        let loaded = RecognizerConfig::load(&path).unwrap();
        assert_eq!(loaded.window_len, 30);

        let rewritten = fs::read_to_string(&path).unwrap();
        let parsed: RecognizerConfig =
            serde_json::from_str(&rewritten).expect("file holds valid json after the load");
        assert_eq!(parsed.window_len, 30);
        assert_eq!(parsed.actions, RecognizerConfig::default().actions);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_gains_missing_fields_on_load() {
        let dir = std::env::temp_dir().join(format!("sign_tracker_part_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{"window_len": 12}"#).unwrap();

        let loaded = RecognizerConfig::load(&path).unwrap();
        assert_eq!(loaded.window_len, 12);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(
            rewritten.contains("\"consensus_len\""),
            "saved file carries every field"
        );
        let parsed: RecognizerConfig = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(parsed.window_len, 12, "explicit values survive the rewrite");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn round_trips_through_json() {
        let config = RecognizerConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: RecognizerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.actions, config.actions);
        assert_eq!(back.max_source_skew_ms, config.max_source_skew_ms);
        assert_eq!(back.overlay.mirror, config.overlay.mirror);
    }
}
