use std::sync::Arc;

use projection_platform::ImageProvider;
use tracing::{debug, trace};

/// Callback invoked with the image id and bytes once a fetch completes.
pub type ImageReady = Arc<dyn Fn(String, Vec<u8>) + Send + Sync + 'static>;

/// Asynchronous avatar fetcher for the image URL scheme served by the
/// room list.
///
/// Requests resolve on a later task turn, never synchronously, and carry
/// the requested id back so the receiver can drop responses for rows that
/// have since scrolled away. A failed fetch is logged and swallowed; the
/// view keeps its placeholder.
pub struct AvatarLoader {
    provider: Arc<dyn ImageProvider>,
    on_ready: ImageReady,
}

impl AvatarLoader {
    pub fn new(provider: Arc<dyn ImageProvider>, on_ready: ImageReady) -> Self {
        Self { provider, on_ready }
    }

    /// Start fetching the avatar for `image_id`.
    pub fn request(&self, image_id: impl Into<String>) {
        let image_id = image_id.into();
        trace!(image_id = %image_id, "avatar fetch requested");
        let provider = Arc::clone(&self.provider);
        let on_ready = Arc::clone(&self.on_ready);
        tokio::spawn(async move {
            match provider.fetch(&image_id) {
                Ok(bytes) => (on_ready)(image_id, bytes),
                Err(err) => {
                    debug!(image_id = %image_id, error = %err, "avatar fetch failed; keeping placeholder");
                }
            }
        });
    }
}
