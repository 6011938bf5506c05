use strum_macros::{Display, EnumIter};

/// Image types the encoder is willing to embed in a data URI.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    #[strum(to_string = "image/jpeg")]
    Jpeg,
    #[strum(to_string = "image/gif")]
    Gif,
    #[strum(to_string = "image/png")]
    Png,
}

impl MimeType {
    /// Maps the short format code printed by `identify -format %m`
    /// (`PNG`, `JPEG`, ...) onto a mime type. Surrounding whitespace and
    /// casing are ignored, anything else is unsupported.
    pub fn from_format_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}
