use crate::core::collection::ImageCollection;
use crate::types::{
    is_no_data, BandData, GeoTransform, Image, RegionOfInterest, VegError, VegResult, NO_DATA,
};
use ndarray::Array2;
use rayon::prelude::*;

/// A single reduced raster with its geo-referencing, ready for export.
#[derive(Debug, Clone)]
pub struct CompositeRaster {
    pub data: BandData,
    pub geo_transform: GeoTransform,
}

/// Per-pixel temporal median of one band across a collection.
///
/// No-data samples are skipped; a pixel with no valid sample at all
/// stays no-data. An empty collection reduces to `None` rather than an
/// error, so empty filter results flow through silently. All member
/// scenes must share one grid; resampling between grids belongs to the
/// remote platform and is not attempted here.
pub fn median_composite(
    collection: &ImageCollection,
    band: &str,
) -> VegResult<Option<CompositeRaster>> {
    let first = match collection.images().first() {
        Some(first) => first,
        None => {
            log::info!("median_composite: empty collection, nothing to reduce");
            return Ok(None);
        }
    };

    let geo_transform = first.metadata.geo_transform;
    let shape = band_data(first, band)?.dim();
    for image in collection.iter() {
        let data = band_data(image, band)?;
        if data.dim() != shape || image.metadata.geo_transform != geo_transform {
            return Err(VegError::Processing(format!(
                "scene {} is on a different grid; compositing requires a common grid",
                image.metadata.scene_id
            )));
        }
    }

    let bands: Vec<&BandData> = collection
        .iter()
        .map(|image| band_data(image, band))
        .collect::<VegResult<_>>()?;

    let (rows, cols) = shape;
    let values: Vec<f32> = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (r, c) = (idx / cols, idx % cols);
            let mut samples: Vec<f32> = bands
                .iter()
                .map(|b| b[[r, c]])
                .filter(|v| !is_no_data(*v))
                .collect();
            median_of(&mut samples)
        })
        .collect();

    let data = Array2::from_shape_vec(shape, values)
        .map_err(|e| VegError::Processing(format!("composite reshape failed: {}", e)))?;

    log::info!(
        "median_composite: reduced {} scenes into one {}x{} raster",
        collection.len(),
        rows,
        cols
    );
    Ok(Some(CompositeRaster {
        data,
        geo_transform,
    }))
}

/// Arithmetic mean of one band over the region, skipping no-data.
///
/// Pixels participate when their center falls inside the region polygon.
/// `None` when no pixel qualifies.
pub fn mean_over_region(
    image: &Image,
    band: &str,
    region: &RegionOfInterest,
) -> VegResult<Option<f64>> {
    let data = band_data(image, band)?;
    let gt = &image.metadata.geo_transform;

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for ((row, col), &value) in data.indexed_iter() {
        if is_no_data(value) {
            continue;
        }
        let (x, y) = gt.pixel_center(row, col);
        if region.contains(x, y) {
            sum += value as f64;
            count += 1;
        }
    }
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}

fn band_data<'a>(image: &'a Image, band: &str) -> VegResult<&'a BandData> {
    image.band(band).ok_or_else(|| {
        VegError::Metadata(format!(
            "scene {} has no band '{}'",
            image.metadata.scene_id, band
        ))
    })
}

/// Median of a sample set. Even counts average the two central values.
fn median_of(samples: &mut [f32]) -> f32 {
    if samples.is_empty() {
        return NO_DATA;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = samples.len();
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        (samples[n / 2 - 1] + samples[n / 2]) / 2.0
    }
}
