//! Configuration system
//!
//! Configuration structures are plain serde types that can be loaded from
//! TOML or RON files, selected by file extension.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
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

    /// A field holds a value the consumer cannot work with
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # World Index Configuration
///
/// Controls how world positions are quantized into top-level regions and
/// how deep points are routed inside each of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldIndexConfig {
    /// Edge length of the cubic grid cell backing each top-level region
    pub cell_size: f64,

    /// Depth of the leaf regions that own points (top-level regions are depth 1)
    pub max_depth: u32,

    /// Slack added to the squared pruning bound during radius queries
    pub search_epsilon: f64,
}

impl WorldIndexConfig {
    /// Deepest subdivision accepted by [`validate`](Self::validate)
    pub const MAX_SUPPORTED_DEPTH: u32 = 32;

    /// Create a configuration with the given cell size and default depth
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            ..Default::default()
        }
    }

    /// Set the leaf depth
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the radius query slack
    pub fn with_search_epsilon(mut self, epsilon: f64) -> Self {
        self.search_epsilon = epsilon;
        self
    }

    /// Edge length of a leaf region
    pub fn leaf_size(&self) -> f64 {
        self.cell_size / f64::from(1_u32 << (self.max_depth.saturating_sub(1)).min(31))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be a positive finite number, got {}",
                self.cell_size
            )));
        }

        // Depth 1 leaves would put points directly in top-level regions,
        // which radius queries never enumerate.
        if self.max_depth < 2 || self.max_depth > Self::MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be between 2 and {}, got {}",
                Self::MAX_SUPPORTED_DEPTH,
                self.max_depth
            )));
        }

        if !self.search_epsilon.is_finite() || self.search_epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "search_epsilon must be a non-negative finite number, got {}",
                self.search_epsilon
            )));
        }

        Ok(())
    }
}

impl Default for WorldIndexConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            max_depth: 5,
            search_epsilon: crate::spatial::DEFAULT_SEARCH_EPSILON,
        }
    }
}

impl Config for WorldIndexConfig {}
