use crate::core::collection::ImageCollection;
use crate::types::{Image, VegResult};
use std::collections::HashMap;

/// Backend seam between the pipeline and whatever holds the imagery.
///
/// The pipeline only ever asks for whole collections by catalog id; the
/// heavy lifting (tiling, distributed evaluation) stays behind this
/// trait. A directory-backed store and an in-memory double both
/// implement it, so the same pipeline code runs against either.
pub trait ImageArchive {
    /// Load the collection registered under a catalog id. An unknown id
    /// yields an empty collection, matching archive semantics where a
    /// query that matches nothing is not an error.
    fn collection(&self, catalog_id: &str) -> VegResult<ImageCollection>;
}

/// In-memory archive, used as the test double and for demos.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    collections: HashMap<String, Vec<Image>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene under a catalog id.
    pub fn insert_scene(&mut self, catalog_id: &str, image: Image) {
        self.collections
            .entry(catalog_id.to_string())
            .or_default()
            .push(image);
    }

    pub fn catalog_ids(&self) -> Vec<&str> {
        self.collections.keys().map(|s| s.as_str()).collect()
    }
}

impl ImageArchive for MemoryArchive {
    fn collection(&self, catalog_id: &str) -> VegResult<ImageCollection> {
        let images = self
            .collections
            .get(catalog_id)
            .cloned()
            .unwrap_or_default();
        log::debug!("MemoryArchive: {} scenes under '{}'", images.len(), catalog_id);
        Ok(ImageCollection::from_images(images))
    }
}
