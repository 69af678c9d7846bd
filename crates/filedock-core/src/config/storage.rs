//! Storage provider configuration.

use serde::{Deserialize, Serialize};

/// File storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root path for local file storage.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Thumbnail widths to generate for uploaded images, in pixels.
    #[serde(default = "default_thumbnail_widths")]
    pub thumbnail_widths: Vec<u32>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            thumbnail_widths: default_thumbnail_widths(),
        }
    }
}

fn default_root_path() -> String {
    "./data/storage".to_string()
}

fn default_thumbnail_widths() -> Vec<u32> {
    vec![500, 250, 100]
}
