//! Configuration system
//!
//! Node construction defaults are carried by value in [`GraphConfig`] and
//! handed to every node at creation time; nothing here is global state.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Values every new node starts from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    /// Initial `up` direction, used by `look_at`
    pub default_up: Vec3,
    /// Initial `matrix_auto_update` flag
    pub matrix_auto_update: bool,
    /// Initial `matrix_world_auto_update` flag
    pub matrix_world_auto_update: bool,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            default_up: Vec3::new(0.0, 1.0, 0.0),
            matrix_auto_update: true,
            matrix_world_auto_update: true,
        }
    }
}

/// JSON output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// Value written to `metadata.generator`
    pub generator: String,
    /// Pretty-print `to_json_string` output
    pub pretty: bool,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            generator: "Object3D.toJSON".to_string(),
            pretty: false,
        }
    }
}

/// Top-level configuration for a [`crate::scene::SceneGraph`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Construction defaults for nodes
    pub node_defaults: NodeDefaults,
    /// Serialization settings
    pub serialization: SerializationConfig,
}

impl Config for GraphConfig {}
