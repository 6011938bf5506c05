mod cache;
pub mod disk_cache;
pub mod errors;
pub mod fingerprint;
pub mod magick;
pub mod scratch;
pub(crate) mod traits;

#[cfg(test)]
mod test_support;

pub use cache::{BatchReport, ImageCache};
pub use errors::ImageCacheError;
