use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Real-valued raster band data (rows x columns)
pub type BandData = Array2<f32>;

/// Sentinel value for pixels with no valid observation.
///
/// A quiet NaN so that any arithmetic touching a no-data pixel
/// produces no-data again.
pub const NO_DATA: f32 = f32::NAN;

/// Returns true if a pixel value is the no-data sentinel.
#[inline]
pub fn is_no_data(value: f32) -> bool {
    value.is_nan()
}

/// Landsat sensor generations supported by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Landsat5,
    Landsat7,
    Landsat8,
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::Landsat5 => write!(f, "Landsat-5"),
            Sensor::Landsat7 => write!(f, "Landsat-7"),
            Sensor::Landsat8 => write!(f, "Landsat-8"),
        }
    }
}

/// Axis-aligned bounding box in ground units (degrees or projected)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// Affine transformation between pixel and ground coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with square pixels of the given ground size.
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_size: f64) -> Self {
        Self {
            top_left_x,
            pixel_width: pixel_size,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height: -pixel_size,
        }
    }

    /// Ground coordinates of the center of pixel (row, col).
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        let x = self.top_left_x + c * self.pixel_width + r * self.rotation_x;
        let y = self.top_left_y + c * self.rotation_y + r * self.pixel_height;
        (x, y)
    }

    /// Fractional (row, col) of a ground coordinate, or None for a
    /// degenerate transform.
    pub fn ground_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let dx = x - self.top_left_x;
        let dy = y - self.top_left_y;
        let col = (dx * self.pixel_height - dy * self.rotation_x) / det;
        let row = (dy * self.pixel_width - dx * self.rotation_y) / det;
        Some((row, col))
    }
}

/// Study-area geometry: one or more polygon exterior rings.
///
/// Rings are closed implicitly (last vertex connects back to the first).
/// Holes are not modelled; the stored geometry assets this stands in for
/// are simple polygons or multi-polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    rings: Vec<Vec<[f64; 2]>>,
}

impl RegionOfInterest {
    /// Single-polygon region from one exterior ring.
    pub fn from_ring(ring: Vec<[f64; 2]>) -> VegResult<Self> {
        Self::from_rings(vec![ring])
    }

    /// Multi-polygon region from several exterior rings.
    pub fn from_rings(rings: Vec<Vec<[f64; 2]>>) -> VegResult<Self> {
        if rings.is_empty() || rings.iter().any(|r| r.len() < 3) {
            return Err(VegError::InvalidFormat(
                "region requires at least one ring of 3+ vertices".to_string(),
            ));
        }
        Ok(Self { rings })
    }

    /// Axis-aligned rectangular region.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rings: vec![vec![
                [min_x, min_y],
                [max_x, min_y],
                [max_x, max_y],
                [min_x, max_y],
            ]],
        }
    }

    pub fn rings(&self) -> &[Vec<[f64; 2]>] {
        &self.rings
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for ring in &self.rings {
            for &[x, y] in ring {
                bbox.min_x = bbox.min_x.min(x);
                bbox.min_y = bbox.min_y.min(y);
                bbox.max_x = bbox.max_x.max(x);
                bbox.max_y = bbox.max_y.max(y);
            }
        }
        bbox
    }

    /// Even-odd point-in-polygon test across all rings.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let n = ring.len();
            let mut j = n - 1;
            for i in 0..n {
                let [xi, yi] = ring[i];
                let [xj, yj] = ring[j];
                if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }

    /// Coarse intersection test against a scene footprint.
    pub fn intersects(&self, bbox: &BoundingBox) -> bool {
        self.bounding_box().intersects(bbox)
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> VegResult<Self> {
        if end < start {
            return Err(VegError::InvalidFormat(format!(
                "date range end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Both endpoints are inclusive.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        date >= self.start && date <= self.end
    }
}

/// Per-scene acquisition metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub scene_id: String,
    pub sensor: Sensor,
    pub timestamp: DateTime<Utc>,
    pub bounds: BoundingBox,
    pub geo_transform: GeoTransform,
}

/// One satellite scene: acquisition metadata plus named raster bands.
///
/// All bands of a scene share one grid; that invariant is enforced when
/// bands are attached.
#[derive(Debug, Clone)]
pub struct Image {
    pub metadata: SceneMetadata,
    bands: HashMap<String, BandData>,
}

impl Image {
    pub fn new(metadata: SceneMetadata) -> Self {
        Self {
            metadata,
            bands: HashMap::new(),
        }
    }

    pub fn band(&self, name: &str) -> Option<&BandData> {
        self.bands.get(name)
    }

    /// Band schema as an ordered name set.
    pub fn band_names(&self) -> BTreeSet<String> {
        self.bands.keys().cloned().collect()
    }

    /// Grid shape (rows, cols) shared by all bands, if any band exists.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.values().next().map(|b| b.dim())
    }

    /// Attach a new band. Existing bands are never overwritten; a
    /// duplicate name or a grid mismatch is an error.
    pub fn with_band(mut self, name: &str, data: BandData) -> VegResult<Self> {
        if self.bands.contains_key(name) {
            return Err(VegError::Processing(format!(
                "band '{}' already exists on scene {}",
                name, self.metadata.scene_id
            )));
        }
        if let Some(shape) = self.shape() {
            if data.dim() != shape {
                return Err(VegError::Processing(format!(
                    "band '{}' shape {:?} does not match scene grid {:?}",
                    name,
                    data.dim(),
                    shape
                )));
            }
        }
        self.bands.insert(name.to_string(), data);
        Ok(self)
    }

    /// Project the scene down to the named bands, dropping all others.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> VegResult<Image> {
        let mut selected = Image::new(self.metadata.clone());
        for name in names {
            let name = name.as_ref();
            let data = self.bands.get(name).ok_or_else(|| {
                VegError::Metadata(format!(
                    "scene {} has no band '{}'",
                    self.metadata.scene_id, name
                ))
            })?;
            selected.bands.insert(name.to_string(), data.clone());
        }
        Ok(selected)
    }
}

/// Error types for pipeline processing
#[derive(Debug, thiserror::Error)]
pub enum VegError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("TIFF codec error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for pipeline operations
pub type VegResult<T> = Result<T, VegError>;
