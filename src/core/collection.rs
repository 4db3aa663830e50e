use crate::types::{DateRange, Image, RegionOfInterest, VegError, VegResult};
use std::collections::BTreeSet;

/// A time-ordered set of scenes sharing a band schema.
///
/// Every operation is a pure stage: it returns a new collection value
/// and leaves the receiver untouched. Filtering that matches nothing
/// produces an empty collection, never an error.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self { images: Vec::new() }
    }

    /// Build a collection from scenes, ordering them by capture time.
    pub fn from_images(mut images: Vec<Image>) -> Self {
        images.sort_by_key(|image| image.metadata.timestamp);
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Uniform band schema of the collection, or `None` when empty.
    /// Diverging member schemas are an error.
    pub fn schema(&self) -> VegResult<Option<BTreeSet<String>>> {
        let mut schema: Option<BTreeSet<String>> = None;
        for image in &self.images {
            let names = image.band_names();
            match &schema {
                None => schema = Some(names),
                Some(expected) if *expected != names => {
                    return Err(VegError::Processing(format!(
                        "schema mismatch in collection: scene {} has bands {:?}, expected {:?}",
                        image.metadata.scene_id, names, expected
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(schema)
    }

    /// Keep only scenes whose footprint intersects the region.
    pub fn filter_bounds(&self, region: &RegionOfInterest) -> Self {
        let images: Vec<Image> = self
            .images
            .iter()
            .filter(|image| region.intersects(&image.metadata.bounds))
            .cloned()
            .collect();
        log::debug!(
            "filter_bounds: {} of {} scenes intersect the region",
            images.len(),
            self.images.len()
        );
        Self { images }
    }

    /// Keep only scenes captured within the inclusive date range.
    pub fn filter_date(&self, range: &DateRange) -> Self {
        let images: Vec<Image> = self
            .images
            .iter()
            .filter(|image| range.contains(image.metadata.timestamp))
            .cloned()
            .collect();
        log::debug!(
            "filter_date {}..{}: {} of {} scenes remain",
            range.start,
            range.end,
            images.len(),
            self.images.len()
        );
        Self { images }
    }

    /// Apply a scene transformation to every member.
    pub fn map<F>(&self, f: F) -> VegResult<Self>
    where
        F: Fn(&Image) -> VegResult<Image>,
    {
        let images: Vec<Image> = self.images.iter().map(|image| f(image)).collect::<VegResult<_>>()?;
        Ok(Self { images })
    }

    /// Project every scene down to the named bands.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> VegResult<Self> {
        self.map(|image| image.select(names))
    }

    /// Concatenate two schema-aligned collections.
    ///
    /// Order is source order: all of `self`, then all of `other`. No
    /// chronological interleaving happens here; callers wanting a global
    /// time order must sort afterwards.
    pub fn merge(self, other: ImageCollection) -> VegResult<Self> {
        let left = self.schema()?;
        let right = other.schema()?;
        if let (Some(left), Some(right)) = (&left, &right) {
            if left != right {
                return Err(VegError::Processing(format!(
                    "cannot merge collections with diverging schemas: {:?} vs {:?}",
                    left, right
                )));
            }
        }
        let mut images = self.images;
        images.extend(other.images);
        Ok(Self { images })
    }

    /// Explicit chronological sort across all members.
    pub fn sort_by_time(&self) -> Self {
        let mut images = self.images.clone();
        images.sort_by_key(|image| image.metadata.timestamp);
        Self { images }
    }
}

impl IntoIterator for ImageCollection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}
