use crate::types::{is_no_data, BandData, Image, VegError, VegResult, NO_DATA};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Cloud masking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudMaskParams {
    /// Name of the per-pixel quality bitfield band
    pub qa_band: String,
    /// Bit flagging cloud contamination
    pub cloud_bit: u8,
    /// Bit flagging cloud shadow
    pub shadow_bit: u8,
}

impl Default for CloudMaskParams {
    fn default() -> Self {
        // Landsat Collection 2 QA_PIXEL encoding
        Self {
            qa_band: "QA_PIXEL".to_string(),
            cloud_bit: 3,
            shadow_bit: 5,
        }
    }
}

/// QA-bitfield cloud and shadow mask.
///
/// A pixel passes only when both the cloud bit and the shadow bit are
/// unset in its quality word. Failing pixels are set to no-data on every
/// band of the scene; passing pixels are left untouched.
pub struct CloudMask {
    params: CloudMaskParams,
}

impl CloudMask {
    /// Create a cloud mask with the default QA_PIXEL encoding.
    pub fn new() -> Self {
        Self {
            params: CloudMaskParams::default(),
        }
    }

    /// Create a cloud mask with custom parameters.
    pub fn with_params(params: CloudMaskParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CloudMaskParams {
        &self.params
    }

    /// Per-pixel validity test. An undefined quality value (no-data in
    /// the QA band) propagates as a failure, never as a false pass.
    #[inline]
    pub fn pixel_passes(&self, qa: f32) -> bool {
        if is_no_data(qa) {
            return false;
        }
        let code = qa as u32;
        code & (1 << self.params.cloud_bit) == 0 && code & (1 << self.params.shadow_bit) == 0
    }

    /// Boolean validity mask derived from a QA band.
    pub fn validity_mask(&self, qa: &BandData) -> Array2<bool> {
        qa.mapv(|v| self.pixel_passes(v))
    }

    /// Apply the mask to every band of a scene.
    pub fn mask_image(&self, image: &Image) -> VegResult<Image> {
        let qa = image.band(&self.params.qa_band).ok_or_else(|| {
            VegError::Metadata(format!(
                "scene {} has no QA band '{}'",
                image.metadata.scene_id, self.params.qa_band
            ))
        })?;

        let mask = self.validity_mask(qa);
        log::debug!(
            "Cloud mask for scene {}: {}/{} pixels pass",
            image.metadata.scene_id,
            mask.iter().filter(|&&m| m).count(),
            mask.len()
        );

        let mut masked = Image::new(image.metadata.clone());
        for name in image.band_names() {
            // band_names() only lists bands that exist
            let band = image.band(&name).unwrap();
            let data = Zip::from(band)
                .and(&mask)
                .map_collect(|&v, &pass| if pass { v } else { NO_DATA });
            masked = masked.with_band(&name, data)?;
        }
        Ok(masked)
    }
}

impl Default for CloudMask {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, GeoTransform, SceneMetadata, Sensor};
    use chrono::{TimeZone, Utc};
    use ndarray::array;

    fn scene_with_qa(qa: BandData) -> Image {
        let metadata = SceneMetadata {
            scene_id: "qa-test".to_string(),
            sensor: Sensor::Landsat8,
            timestamp: Utc.with_ymd_and_hms(2021, 7, 1, 10, 30, 0).unwrap(),
            bounds: BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 60.0,
                max_y: 60.0,
            },
            geo_transform: GeoTransform::north_up(0.0, 60.0, 30.0),
        };
        let reflectance = BandData::from_elem(qa.dim(), 0.42);
        Image::new(metadata)
            .with_band("B5", reflectance)
            .unwrap()
            .with_band("QA_PIXEL", qa)
            .unwrap()
    }

    #[test]
    fn test_bit_truth_table() {
        let mask = CloudMask::new();
        let clear = 0.0;
        let cloud = (1u32 << 3) as f32;
        let shadow = (1u32 << 5) as f32;
        let both = ((1u32 << 3) | (1u32 << 5)) as f32;
        // Unrelated bits must not trip the mask
        let other_bits = ((1u32 << 1) | (1u32 << 7)) as f32;

        assert!(mask.pixel_passes(clear));
        assert!(!mask.pixel_passes(cloud));
        assert!(!mask.pixel_passes(shadow));
        assert!(!mask.pixel_passes(both));
        assert!(mask.pixel_passes(other_bits));
    }

    #[test]
    fn test_undefined_qa_fails_not_passes() {
        let mask = CloudMask::new();
        assert!(!mask.pixel_passes(NO_DATA));
    }

    #[test]
    fn test_mask_image_marks_failing_pixels_on_all_bands() {
        let qa = array![[0.0, (1u32 << 3) as f32], [(1u32 << 5) as f32, NO_DATA]];
        let image = scene_with_qa(qa);
        let masked = CloudMask::new().mask_image(&image).unwrap();

        let b5 = masked.band("B5").unwrap();
        assert_eq!(b5[[0, 0]], 0.42);
        assert!(is_no_data(b5[[0, 1]]));
        assert!(is_no_data(b5[[1, 0]]));
        assert!(is_no_data(b5[[1, 1]]));

        // The QA band itself is masked too
        let qa_out = masked.band("QA_PIXEL").unwrap();
        assert_eq!(qa_out[[0, 0]], 0.0);
        assert!(is_no_data(qa_out[[0, 1]]));
    }

    #[test]
    fn test_missing_qa_band_is_an_error() {
        let qa = array![[0.0]];
        let image = scene_with_qa(qa);
        let stripped = image.select(&["B5"]).unwrap();
        assert!(CloudMask::new().mask_image(&stripped).is_err());
    }

    #[test]
    fn test_custom_bit_positions() {
        let mask = CloudMask::with_params(CloudMaskParams {
            qa_band: "QA".to_string(),
            cloud_bit: 0,
            shadow_bit: 1,
        });
        assert!(!mask.pixel_passes(1.0));
        assert!(!mask.pixel_passes(2.0));
        assert!(mask.pixel_passes(4.0));
    }
}
