use serde::Deserialize;

use crate::deserialize::{disallow_empty_string, lenient_bool, lenient_width};

/// Knobs shared by the single and batch encode endpoints.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    #[serde(deserialize_with = "lenient_bool")]
    #[serde(default)]
    pub resize: bool,
    #[serde(deserialize_with = "lenient_width")]
    #[serde(default)]
    pub width: u16,
    #[serde(deserialize_with = "lenient_bool")]
    #[serde(default)]
    pub force: bool,
}

impl EncodeOptions {
    pub fn new(resize: bool, width: u16, force: bool) -> Self {
        Self {
            resize,
            width,
            force,
        }
    }

    /// Resizing needs both the flag and a non-zero width.
    pub fn resize_width(&self) -> Option<u16> {
        if self.resize && self.width > 0 {
            Some(self.width)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EncodeQuery {
    #[serde(deserialize_with = "disallow_empty_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_bool")]
    #[serde(default)]
    pub resize: bool,
    #[serde(deserialize_with = "lenient_width")]
    #[serde(default)]
    pub width: u16,
    #[serde(deserialize_with = "lenient_bool")]
    #[serde(default)]
    pub force: bool,
}

impl EncodeQuery {
    pub fn options(&self) -> EncodeOptions {
        EncodeOptions::new(self.resize, self.width, self.force)
    }
}
