use crate::types::{is_no_data, BandData, Image, VegError, VegResult, NO_DATA};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Normalized-difference vegetation index parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdviParams {
    /// Near-infrared band name (sensor-specific)
    pub nir_band: String,
    /// Red band name (sensor-specific)
    pub red_band: String,
    /// Name of the appended index band
    pub output_band: String,
}

impl Default for NdviParams {
    fn default() -> Self {
        // Landsat 8 OLI band numbering
        Self {
            nir_band: "B5".to_string(),
            red_band: "B4".to_string(),
            output_band: "NDVI".to_string(),
        }
    }
}

/// Computes `(NIR - RED) / (NIR + RED)` per pixel and appends the result
/// as a new band. Existing bands are never overwritten.
pub struct NdviCalculator {
    params: NdviParams,
}

impl NdviCalculator {
    pub fn new() -> Self {
        Self {
            params: NdviParams::default(),
        }
    }

    pub fn with_params(params: NdviParams) -> Self {
        Self { params }
    }

    /// Convenience constructor for a sensor-specific band pair.
    pub fn for_bands(nir_band: &str, red_band: &str, output_band: &str) -> Self {
        Self {
            params: NdviParams {
                nir_band: nir_band.to_string(),
                red_band: red_band.to_string(),
                output_band: output_band.to_string(),
            },
        }
    }

    pub fn params(&self) -> &NdviParams {
        &self.params
    }

    /// Index value for a single pixel pair. A zero denominator or a
    /// no-data operand yields no-data, not an error.
    #[inline]
    pub fn index_value(nir: f32, red: f32) -> f32 {
        if is_no_data(nir) || is_no_data(red) {
            return NO_DATA;
        }
        let denominator = nir + red;
        if denominator == 0.0 {
            return NO_DATA;
        }
        (nir - red) / denominator
    }

    /// Index raster for a NIR/RED band pair.
    pub fn index_band(&self, nir: &BandData, red: &BandData) -> BandData {
        Zip::from(nir)
            .and(red)
            .par_map_collect(|&n, &r| Self::index_value(n, r))
    }

    /// Append the index band to a scene.
    pub fn compute(&self, image: &Image) -> VegResult<Image> {
        let nir = image.band(&self.params.nir_band).ok_or_else(|| {
            VegError::Metadata(format!(
                "scene {} has no NIR band '{}'",
                image.metadata.scene_id, self.params.nir_band
            ))
        })?;
        let red = image.band(&self.params.red_band).ok_or_else(|| {
            VegError::Metadata(format!(
                "scene {} has no red band '{}'",
                image.metadata.scene_id, self.params.red_band
            ))
        })?;

        let index = self.index_band(nir, red);
        log::debug!(
            "NDVI for scene {}: {} -> appended band '{}'",
            image.metadata.scene_id,
            self.params.nir_band,
            self.params.output_band
        );
        image.clone().with_band(&self.params.output_band, index)
    }
}

impl Default for NdviCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, GeoTransform, SceneMetadata, Sensor};
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Utc};
    use ndarray::array;

    #[test]
    fn test_equal_bands_give_zero() {
        assert_eq!(NdviCalculator::index_value(0.3, 0.3), 0.0);
    }

    #[test]
    fn test_zero_denominator_gives_no_data() {
        assert!(is_no_data(NdviCalculator::index_value(0.0, 0.0)));
        assert!(is_no_data(NdviCalculator::index_value(0.2, -0.2)));
    }

    #[test]
    fn test_no_data_operand_propagates() {
        assert!(is_no_data(NdviCalculator::index_value(NO_DATA, 0.1)));
        assert!(is_no_data(NdviCalculator::index_value(0.5, NO_DATA)));
    }

    #[test]
    fn test_known_value() {
        let ndvi = NdviCalculator::index_value(0.5, 0.1);
        assert_abs_diff_eq!(ndvi, 0.4 / 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_bounded_for_nonnegative_reflectance() {
        for (nir, red) in [(0.9, 0.0), (0.0, 0.9), (0.8, 0.2), (0.01, 0.99)] {
            let v = NdviCalculator::index_value(nir, red);
            assert!((-1.0..=1.0).contains(&v), "NDVI({nir},{red}) = {v}");
        }
    }

    #[test]
    fn test_compute_appends_without_overwriting() {
        let image = test_scene();
        let calculator = NdviCalculator::new();
        let result = calculator.compute(&image).unwrap();

        let mut expected: Vec<String> =
            vec!["B4".to_string(), "B5".to_string(), "NDVI".to_string()];
        expected.sort();
        assert_eq!(result.band_names().into_iter().collect::<Vec<_>>(), expected);

        // Inputs remain untouched
        assert_eq!(result.band("B5").unwrap()[[0, 0]], 0.5);
        assert_abs_diff_eq!(
            result.band("NDVI").unwrap()[[0, 0]],
            (0.5 - 0.1) / (0.5 + 0.1),
            epsilon = 1e-6
        );

        // A second computation would clobber the index band and must fail
        assert!(calculator.compute(&result).is_err());
    }

    #[test]
    fn test_missing_input_band_is_an_error() {
        let image = test_scene();
        let calculator = NdviCalculator::for_bands("B8", "B4", "NDVI");
        assert!(calculator.compute(&image).is_err());
    }

    fn test_scene() -> Image {
        let metadata = SceneMetadata {
            scene_id: "ndvi-test".to_string(),
            sensor: Sensor::Landsat8,
            timestamp: Utc.with_ymd_and_hms(2021, 7, 1, 10, 30, 0).unwrap(),
            bounds: BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 30.0,
                max_y: 30.0,
            },
            geo_transform: GeoTransform::north_up(0.0, 30.0, 30.0),
        };
        Image::new(metadata)
            .with_band("B4", array![[0.1]])
            .unwrap()
            .with_band("B5", array![[0.5]])
            .unwrap()
    }
}
