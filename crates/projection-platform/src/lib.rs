use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("no image stored for '{0}'")]
    NotFound(String),
    #[error("image backend failure: {0}")]
    Backend(String),
}

pub trait ImageProvider: Send + Sync {
    fn fetch(&self, image_id: &str) -> Result<Vec<u8>, ImageError>;
}

#[derive(Clone, Default)]
pub struct InMemoryImageProvider {
    images: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryImageProvider {
    pub fn insert(&self, image_id: impl Into<String>, bytes: Vec<u8>) -> Result<(), ImageError> {
        let mut images = self
            .images
            .write()
            .map_err(|_| ImageError::Backend("poisoned lock".to_owned()))?;
        images.insert(image_id.into(), bytes);
        Ok(())
    }

    pub fn remove(&self, image_id: &str) -> Result<(), ImageError> {
        let mut images = self
            .images
            .write()
            .map_err(|_| ImageError::Backend("poisoned lock".to_owned()))?;
        if images.remove(image_id).is_none() {
            return Err(ImageError::NotFound(image_id.to_owned()));
        }
        Ok(())
    }
}

impl ImageProvider for InMemoryImageProvider {
    fn fetch(&self, image_id: &str) -> Result<Vec<u8>, ImageError> {
        let images = self
            .images
            .read()
            .map_err(|_| ImageError::Backend("poisoned lock".to_owned()))?;
        images
            .get(image_id)
            .cloned()
            .ok_or_else(|| ImageError::NotFound(image_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_roundtrip() {
        let provider = InMemoryImageProvider::default();
        provider
            .insert("!room:example.org", vec![1, 2, 3])
            .expect("insert should work");

        let bytes = provider
            .fetch("!room:example.org")
            .expect("fetch should work");
        assert_eq!(bytes, vec![1, 2, 3]);

        provider
            .remove("!room:example.org")
            .expect("remove should work");
        assert_eq!(
            provider.fetch("!room:example.org"),
            Err(ImageError::NotFound("!room:example.org".to_owned()))
        );
    }

    #[test]
    fn fetch_of_unknown_id_reports_not_found() {
        let provider = InMemoryImageProvider::default();
        assert_eq!(
            provider.fetch("!missing:example.org"),
            Err(ImageError::NotFound("!missing:example.org".to_owned()))
        );
    }

    #[derive(Default)]
    struct FailingProvider;

    impl ImageProvider for FailingProvider {
        fn fetch(&self, _image_id: &str) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::Backend("mock outage".to_owned()))
        }
    }

    #[test]
    fn mock_failure_surfaces_backend_error() {
        let provider = FailingProvider;
        let err = provider
            .fetch("!room:example.org")
            .expect_err("fetch must fail");
        assert_eq!(err, ImageError::Backend("mock outage".to_owned()));
    }
}
