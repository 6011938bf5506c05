use crate::errors::ImageCacheError;

pub(crate) trait CacheMethod {
    fn has(&self, cache_key: &str) -> impl Future<Output = bool>;
    fn read(&self, cache_key: &str) -> impl Future<Output = Result<String, ImageCacheError>>;
    fn write(
        &self,
        cache_key: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), ImageCacheError>>;
}
