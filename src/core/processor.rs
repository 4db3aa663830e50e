use crate::core::cloud_mask::{CloudMask, CloudMaskParams};
use crate::core::collection::ImageCollection;
use crate::core::ndvi::NdviCalculator;
use crate::types::{DateRange, RegionOfInterest, VegResult};
use serde::{Deserialize, Serialize};

/// Sensor-specific band naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorBands {
    /// Near-infrared band name
    pub nir: String,
    /// Red band name
    pub red: String,
    /// Spectral bands retained in the output schema
    pub retained: Vec<String>,
}

impl SensorBands {
    pub fn new(nir: &str, red: &str, retained: &[&str]) -> Self {
        Self {
            nir: nir.to_string(),
            red: red.to_string(),
            retained: retained.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Per-sensor processing chain.
///
/// Applies, strictly in order: spatial filter, date filter, cloud mask,
/// NDVI, band selection. The order is load-bearing: masking needs the QA
/// band that the final selection drops, and the index must exist before
/// it can be selected. The output schema is always
/// `retained bands + index band`, regardless of the input schema, which
/// is what keeps differently-banded sensors mergeable downstream.
pub struct SensorProcessor {
    region: RegionOfInterest,
    date_range: DateRange,
    mask_params: CloudMaskParams,
    index_band: String,
}

impl SensorProcessor {
    pub fn new(region: RegionOfInterest, date_range: DateRange) -> Self {
        Self {
            region,
            date_range,
            mask_params: CloudMaskParams::default(),
            index_band: "NDVI".to_string(),
        }
    }

    pub fn with_mask_params(mut self, params: CloudMaskParams) -> Self {
        self.mask_params = params;
        self
    }

    pub fn with_index_band(mut self, name: &str) -> Self {
        self.index_band = name.to_string();
        self
    }

    pub fn index_band(&self) -> &str {
        &self.index_band
    }

    /// Run the full chain over one sensor collection. An empty result at
    /// any step propagates silently as an empty collection.
    pub fn process(
        &self,
        collection: &ImageCollection,
        bands: &SensorBands,
    ) -> VegResult<ImageCollection> {
        let input_len = collection.len();

        let filtered = collection
            .filter_bounds(&self.region)
            .filter_date(&self.date_range);

        let mask = CloudMask::with_params(self.mask_params.clone());
        let masked = filtered.map(|image| mask.mask_image(image))?;

        let ndvi = NdviCalculator::for_bands(&bands.nir, &bands.red, &self.index_band);
        let indexed = masked.map(|image| ndvi.compute(image))?;

        let mut selection = bands.retained.clone();
        if !selection.contains(&self.index_band) {
            selection.push(self.index_band.clone());
        }
        let selected = indexed.select(&selection)?;

        log::info!(
            "Processed sensor collection: {} scenes in, {} scenes out, schema {:?}",
            input_len,
            selected.len(),
            selection
        );
        Ok(selected)
    }
}
