pub mod config;
pub mod deserialize;
pub mod image_cache;
pub mod mime;
