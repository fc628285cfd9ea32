use async_trait::async_trait;

/// Loads a URL in a hidden frame and resolves once it has loaded.
#[async_trait]
pub trait FrameLoader: Send + Sync {
    async fn open_url_with_iframe(&self, url: &str) -> Result<(), String>;
}
