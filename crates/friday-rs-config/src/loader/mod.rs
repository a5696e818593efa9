//! Layered configuration loader.
//!
//! Discovers `friday.json5` layers (system, user, project, cwd), validates each
//! against the schema, merges them in precedence order, and applies runtime
//! overrides last.

mod layers;
mod schema;


use crate::{ConfigError, FridayConfig, MAX_RECENT_MESSAGES, MAX_SUMMARY_TOP_TOPICS};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in every layer.
const DEFAULT_CONFIG_FILE: &str = "friday.json5";
/// Per-user config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".friday";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/friday/friday.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: FridayConfig,
    /// Layers that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    /// Config at the detected project root.
    Project,
    /// Config in the working directory.
    Cwd,
    /// Explicit override paths (highest precedence).
    Runtime,
}

/// A config layer that was read and merged.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to find the cwd and project layers.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/friday/friday.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.friday/friday.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layers::default_system_config_path(),
            user_config_path: layers::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl FridayConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, project, cwd, runtime.
    /// Missing optional layers are skipped; missing runtime layers are errors.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layers::normalize_path(&options.cwd)?;
        let project_root = layers::find_project_root(&cwd, &options.project_root_markers);
        debug!(
            "resolving config layers (cwd={}, project_root={:?})",
            cwd.display(),
            project_root
        );

        let mut candidates: Vec<(ConfigLayerSource, PathBuf)> = Vec::new();
        if let Some(path) = options.system_config_path {
            candidates.push((ConfigLayerSource::System, path));
        }
        if let Some(path) = options.user_config_path {
            candidates.push((ConfigLayerSource::User, path));
        }
        if let Some(root) = project_root {
            candidates.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
        }
        candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));

        let mut merged = Value::Object(serde_json::Map::new());
        let mut loaded = Vec::new();
        let mut seen_paths = HashSet::new();

        for (source, path) in candidates {
            if !path.exists() {
                debug!(
                    "skipping missing layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if !seen_paths.insert(layers::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            let value = layers::read_layer(source, &path)?;
            layers::merge_json_values(&mut merged, &value);
            loaded.push(ConfigLayer { source, path });
        }

        for path in options.runtime_paths {
            let value = layers::read_layer(ConfigLayerSource::Runtime, &path)?;
            layers::merge_json_values(&mut merged, &value);
            loaded.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path,
            });
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", loaded.len());
        Ok(LayeredConfig {
            config,
            layers: loaded,
        })
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let completion = &self.completion;
        if !completion.endpoint.starts_with("http://")
            && !completion.endpoint.starts_with("https://")
        {
            return Err(invalid("completion.endpoint", "expected an http(s) URL"));
        }
        if completion.model.trim().is_empty() {
            return Err(invalid("completion.model", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(invalid("completion.temperature", "expected 0.0..=2.0"));
        }
        if completion.max_tokens == 0 {
            return Err(invalid("completion.max_tokens", "must be positive"));
        }
        if completion.history_window == 0 {
            return Err(invalid("completion.history_window", "must be positive"));
        }
        if completion.timeout_secs == 0 {
            return Err(invalid("completion.timeout_secs", "must be positive"));
        }

        let labels = &self.reply.labels;
        let all = [
            ("answer", &labels.answer),
            ("translation", &labels.translation),
            ("follow_up", &labels.follow_up),
            ("correction", &labels.correction),
        ];
        let mut seen = HashSet::new();
        // Reply lines are matched with ASCII case folding.
        for (name, label) in all {
            if label.is_empty() || label.contains(':') {
                return Err(invalid(
                    &format!("reply.labels.{name}"),
                    "must be non-empty and must not contain ':'",
                ));
            }
            if !label.is_ascii() || label.trim() != label.as_str() {
                return Err(invalid(
                    &format!("reply.labels.{name}"),
                    "must be ASCII without surrounding whitespace",
                ));
            }
            if !seen.insert(label.to_ascii_uppercase()) {
                return Err(invalid(
                    &format!("reply.labels.{name}"),
                    "labels must be distinct",
                ));
            }
        }

        if self
            .assistant
            .stop_phrases
            .iter()
            .any(|phrase| phrase.trim().is_empty())
        {
            return Err(invalid("assistant.stop_phrases", "phrases must not be empty"));
        }
        if !(1..=MAX_RECENT_MESSAGES).contains(&self.memory.max_recent_messages) {
            return Err(invalid(
                "memory.max_recent_messages",
                &format!("expected 1..={MAX_RECENT_MESSAGES}"),
            ));
        }
        if self.memory.summary_top_topics > MAX_SUMMARY_TOP_TOPICS {
            return Err(invalid(
                "memory.summary_top_topics",
                &format!("expected at most {MAX_SUMMARY_TOP_TOPICS}"),
            ));
        }
        if self.memory.storage_key.trim().is_empty() {
            return Err(invalid("memory.storage_key", "must not be empty"));
        }
        if self.documents.max_chars == 0 {
            return Err(invalid("documents.max_chars", "must be positive"));
        }
        if self.speech.rate <= 0.0 {
            return Err(invalid("speech.rate", "must be positive"));
        }
        if self.speech.pitch < 0.0 {
            return Err(invalid("speech.pitch", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn config_from_value(value: Value, label: &str) -> Result<FridayConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: FridayConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
