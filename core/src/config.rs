use crate::error::DefscopeError;
use crate::error::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// Configuration for extraction, resolution and output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefscopeConfig {
    /// Source consulted second when resolving a parent reference
    #[serde(default = "default_core_source")]
    pub core_source: String,

    /// Maximum number of resolved ancestors per record
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,

    /// Field summary limits
    #[serde(default)]
    pub summary: SummaryLimits,

    /// File name of the payload written under the data root
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,
}

/// Limits applied by the field summarizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryLimits {
    /// Leaf text longer than this many characters is truncated
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Items rendered for list-like and map-like fields
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,

    /// Tag names rendered for mixed-structure fields
    #[serde(default = "default_max_tag_names")]
    pub max_tag_names: usize,
}

fn default_core_source() -> String {
    "Core".to_string()
}

fn default_max_ancestor_depth() -> usize {
    100
}

fn default_output_file_name() -> String {
    "defscope.json".to_string()
}

fn default_max_text_chars() -> usize {
    120
}

fn default_max_list_items() -> usize {
    12
}

fn default_max_tag_names() -> usize {
    6
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_list_items: default_max_list_items(),
            max_tag_names: default_max_tag_names(),
        }
    }
}

impl Default for DefscopeConfig {
    fn default() -> Self {
        Self {
            core_source: default_core_source(),
            max_ancestor_depth: default_max_ancestor_depth(),
            summary: SummaryLimits::default(),
            output_file_name: default_output_file_name(),
        }
    }
}

impl DefscopeConfig {
    /// Load a TOML configuration file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DefscopeConfig = toml::from_str(&content)?;
        config.validate().map_err(DefscopeError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.core_source.trim().is_empty() {
            return Err("core_source must not be empty".into());
        }

        if self.max_ancestor_depth == 0 {
            return Err("max_ancestor_depth must be greater than 0".into());
        }

        if self.summary.max_text_chars == 0 {
            return Err("summary.max_text_chars must be greater than 0".into());
        }

        if self.summary.max_list_items == 0 || self.summary.max_tag_names == 0 {
            return Err("summary item limits must be greater than 0".into());
        }

        if self.output_file_name.trim().is_empty() {
            return Err("output_file_name must not be empty".into());
        }

        Ok(())
    }
}
