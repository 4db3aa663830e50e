use crate::core::composite::CompositeRaster;
use crate::types::{is_no_data, GeoTransform, RegionOfInterest, VegError, VegResult, NO_DATA};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

// GeoTIFF tags the plain tiff crate has no names for
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

/// Export parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportParams {
    /// Human-readable task description, stored in the TIFF metadata
    pub description: String,
    /// Ground resolution in distance-units per pixel
    pub scale: f64,
    /// Maximum number of output pixels accepted for one export
    pub max_pixels: u64,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            description: "NDVI_Composite".to_string(),
            scale: 30.0,
            max_pixels: 10_000_000_000_000,
        }
    }
}

/// Outcome of a completed export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub valid_pixels: usize,
}

/// Writes a composite raster as a clipped, geo-referenced GeoTIFF.
///
/// The output grid derives from the region bounding box at the
/// configured scale; pixels outside the region polygon are no-data. The
/// composite is nearest-neighbor sampled onto that grid. A missing
/// composite (empty collection upstream) exports an all-no-data raster
/// without error.
pub struct GeoTiffExporter {
    params: ExportParams,
}

impl GeoTiffExporter {
    pub fn new() -> Self {
        Self {
            params: ExportParams::default(),
        }
    }

    pub fn with_params(params: ExportParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ExportParams {
        &self.params
    }

    pub fn export(
        &self,
        composite: Option<&CompositeRaster>,
        region: &RegionOfInterest,
        path: &Path,
    ) -> VegResult<ExportReport> {
        let bbox = region.bounding_box();
        if !bbox.min_x.is_finite() || self.params.scale <= 0.0 {
            return Err(VegError::Processing(
                "export requires a finite region and a positive scale".to_string(),
            ));
        }

        let width = ((bbox.width() / self.params.scale).ceil() as usize).max(1);
        let height = ((bbox.height() / self.params.scale).ceil() as usize).max(1);
        let pixel_count = width as u64 * height as u64;
        if pixel_count > self.params.max_pixels {
            return Err(VegError::Processing(format!(
                "export '{}' needs {} pixels, exceeding the {} pixel budget",
                self.params.description, pixel_count, self.params.max_pixels
            )));
        }

        let grid = GeoTransform::north_up(bbox.min_x, bbox.max_y, self.params.scale);
        let mut values = vec![NO_DATA; width * height];
        let mut valid_pixels = 0usize;
        for row in 0..height {
            for col in 0..width {
                let (x, y) = grid.pixel_center(row, col);
                if !region.contains(x, y) {
                    continue;
                }
                let value = composite
                    .map(|c| sample_nearest(c, x, y))
                    .unwrap_or(NO_DATA);
                if !is_no_data(value) {
                    valid_pixels += 1;
                }
                values[row * width + col] = value;
            }
        }

        self.write_geotiff(path, width, height, &grid, &values)?;
        log::info!(
            "Export '{}': {}x{} raster at scale {} -> {} ({} valid pixels)",
            self.params.description,
            width,
            height,
            self.params.scale,
            path.display(),
            valid_pixels
        );
        Ok(ExportReport {
            path: path.to_path_buf(),
            width,
            height,
            valid_pixels,
        })
    }

    fn write_geotiff(
        &self,
        path: &Path,
        width: usize,
        height: usize,
        grid: &GeoTransform,
        values: &[f32],
    ) -> VegResult<()> {
        let file = File::create(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
        let mut image = encoder.new_image::<colortype::Gray32Float>(width as u32, height as u32)?;

        let scale = [self.params.scale, self.params.scale, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, grid.top_left_x, grid.top_left_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), &scale[..])?;
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), &tiepoint[..])?;
        image
            .encoder()
            .write_tag(Tag::Unknown(TAG_GDAL_NODATA), "nan")?;
        image
            .encoder()
            .write_tag(Tag::ImageDescription, self.params.description.as_str())?;

        image.write_data(values)?;
        Ok(())
    }
}

impl Default for GeoTiffExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-neighbor sample of a composite at a ground coordinate.
fn sample_nearest(composite: &CompositeRaster, x: f64, y: f64) -> f32 {
    let (rows, cols) = composite.data.dim();
    match composite.geo_transform.ground_to_pixel(x, y) {
        Some((row, col)) => {
            let (row, col) = (row.floor(), col.floor());
            if row < 0.0 || col < 0.0 || row >= rows as f64 || col >= cols as f64 {
                NO_DATA
            } else {
                composite.data[[row as usize, col as usize]]
            }
        }
        None => NO_DATA,
    }
}
