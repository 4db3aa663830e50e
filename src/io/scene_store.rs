use crate::core::collection::ImageCollection;
use crate::io::archive::ImageArchive;
use crate::types::{
    BandData, BoundingBox, GeoTransform, Image, SceneMetadata, Sensor, VegError, VegResult,
};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};

/// One scene entry in the catalog index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    pub scene_id: String,
    pub sensor: Sensor,
    pub timestamp: DateTime<Utc>,
    pub bounds: BoundingBox,
    pub geo_transform: GeoTransform,
    /// Band name -> single-band GeoTIFF path, relative to the store root
    pub bands: HashMap<String, PathBuf>,
}

/// The `catalog.json` index at the root of a scene store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogIndex {
    pub collections: HashMap<String, Vec<SceneEntry>>,
}

/// Directory-backed image archive.
///
/// Layout: a `catalog.json` index mapping catalog ids to scene entries,
/// with each band stored as a single-band GeoTIFF relative to the root.
/// Integer band files (QA bitfields, digital numbers) are promoted to
/// f32 on read.
pub struct SceneStore {
    root: PathBuf,
    index: CatalogIndex,
}

impl SceneStore {
    /// Open a store rooted at a directory containing `catalog.json`.
    pub fn open<P: AsRef<Path>>(root: P) -> VegResult<Self> {
        let root = root.as_ref().to_path_buf();
        let index_path = root.join("catalog.json");
        let file = File::open(&index_path).map_err(|e| {
            VegError::Metadata(format!(
                "cannot open catalog index {}: {}",
                index_path.display(),
                e
            ))
        })?;
        let index: CatalogIndex = serde_json::from_reader(BufReader::new(file))?;
        log::info!(
            "Opened scene store at {} with {} collections",
            root.display(),
            index.collections.len()
        );
        Ok(Self { root, index })
    }

    pub fn catalog_ids(&self) -> Vec<&str> {
        self.index.collections.keys().map(|s| s.as_str()).collect()
    }

    fn load_scene(&self, entry: &SceneEntry) -> VegResult<Image> {
        let metadata = SceneMetadata {
            scene_id: entry.scene_id.clone(),
            sensor: entry.sensor,
            timestamp: entry.timestamp,
            bounds: entry.bounds,
            geo_transform: entry.geo_transform,
        };
        let mut image = Image::new(metadata);
        // Deterministic attach order keeps error messages stable
        let mut names: Vec<&String> = entry.bands.keys().collect();
        names.sort();
        for name in names {
            let band = read_band_tiff(&self.root.join(&entry.bands[name]))?;
            image = image.with_band(name, band)?;
        }
        Ok(image)
    }
}

impl ImageArchive for SceneStore {
    fn collection(&self, catalog_id: &str) -> VegResult<ImageCollection> {
        let entries = match self.index.collections.get(catalog_id) {
            Some(entries) => entries,
            None => {
                log::debug!("SceneStore: no collection '{}', returning empty", catalog_id);
                return Ok(ImageCollection::new());
            }
        };
        let images: Vec<Image> = entries
            .iter()
            .map(|entry| self.load_scene(entry))
            .collect::<VegResult<_>>()?;
        log::info!(
            "SceneStore: loaded {} scenes from '{}'",
            images.len(),
            catalog_id
        );
        Ok(ImageCollection::from_images(images))
    }
}

/// Read a single-band GeoTIFF into band data, promoting any integer
/// sample format to f32.
pub fn read_band_tiff(path: &Path) -> VegResult<BandData> {
    let file = File::open(path)
        .map_err(|e| VegError::Metadata(format!("cannot open band {}: {}", path.display(), e)))?;
    let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions()?;
    let values: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
    };

    let expected = (height as usize) * (width as usize);
    if values.len() != expected {
        return Err(VegError::InvalidFormat(format!(
            "band {} has {} samples, expected {} ({}x{})",
            path.display(),
            values.len(),
            expected,
            width,
            height
        )));
    }
    Array2::from_shape_vec((height as usize, width as usize), values)
        .map_err(|e| VegError::InvalidFormat(format!("band {}: {}", path.display(), e)))
}
