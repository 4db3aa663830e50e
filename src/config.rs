use crate::core::{ChartOptions, CloudMaskParams, SensorBands};
use crate::io::ExportParams;
use crate::types::{DateRange, Sensor, VegError, VegResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One sensor branch of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sensor: Sensor,
    /// Catalog identifier of the sensor's image archive
    pub catalog: String,
    #[serde(flatten)]
    pub bands: SensorBands,
}

/// Explicit pipeline configuration.
///
/// Every knob the processing chain depends on lives here rather than
/// being embedded in pipeline code. The defaults reproduce the
/// historical study setup: the full 2000-2023 window over the three
/// Landsat Collection-2 Level-2 archives at 30 units/pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stored geometry asset holding the study area (GeoJSON)
    pub region_path: Option<PathBuf>,
    pub dates: DateRange,
    pub cloud_mask: CloudMaskParams,
    /// Name of the derived index band
    pub index_band: String,
    pub sensors: Vec<SensorConfig>,
    pub export: ExportParams,
    pub chart: ChartOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region_path: None,
            dates: DateRange {
                start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            },
            cloud_mask: CloudMaskParams::default(),
            index_band: "NDVI".to_string(),
            // Retained spectral bands default to none: sensor generations
            // name their bands differently, and only identically-named
            // schemas survive the merge. The index band is always kept.
            sensors: vec![
                SensorConfig {
                    sensor: Sensor::Landsat5,
                    catalog: "LANDSAT/LT05/C02/T1_L2".to_string(),
                    bands: SensorBands::new("B4", "B3", &[]),
                },
                SensorConfig {
                    sensor: Sensor::Landsat7,
                    catalog: "LANDSAT/LE07/C02/T1_L2".to_string(),
                    bands: SensorBands::new("B4", "B3", &[]),
                },
                SensorConfig {
                    sensor: Sensor::Landsat8,
                    catalog: "LANDSAT/LC08/C02/T1_L2".to_string(),
                    bands: SensorBands::new("B5", "B4", &[]),
                },
            ],
            export: ExportParams::default(),
            chart: ChartOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML configuration. Omitted sections fall back to the
    /// defaults.
    pub fn from_toml_str(text: &str) -> VegResult<Self> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> VegResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VegError::Metadata(format!("cannot read config {}: {}", path.display(), e))
        })?;
        log::info!("Loaded pipeline configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Structural checks that serde alone cannot express.
    pub fn validate(&self) -> VegResult<()> {
        if self.dates.end < self.dates.start {
            return Err(VegError::InvalidFormat(format!(
                "date range end {} precedes start {}",
                self.dates.end, self.dates.start
            )));
        }
        if self.sensors.is_empty() {
            return Err(VegError::InvalidFormat(
                "configuration lists no sensors".to_string(),
            ));
        }
        if self.export.scale <= 0.0 {
            return Err(VegError::InvalidFormat(format!(
                "export scale must be positive, got {}",
                self.export.scale
            )));
        }
        if self.export.max_pixels == 0 {
            return Err(VegError::InvalidFormat(
                "export pixel budget must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_study_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.dates.start, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(config.dates.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(config.sensors.len(), 3);
        assert_eq!(config.sensors[0].catalog, "LANDSAT/LT05/C02/T1_L2");
        assert_eq!(config.sensors[0].bands.nir, "B4");
        assert_eq!(config.sensors[2].bands.nir, "B5");
        assert!(config.sensors.iter().all(|s| s.bands.retained.is_empty()));
        assert_eq!(config.cloud_mask.cloud_bit, 3);
        assert_eq!(config.cloud_mask.shadow_bit, 5);
        assert_eq!(config.export.scale, 30.0);
        assert_eq!(config.export.max_pixels, 10_000_000_000_000);
        assert_eq!(config.export.description, "NDVI_Composite");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            index_band = "EVI"

            [dates]
            start = "2015-01-01"
            end = "2015-12-31"

            [export]
            description = "EVI_Composite"
            scale = 10.0
            max_pixels = 1000000
            "#,
        )
        .unwrap();
        assert_eq!(config.index_band, "EVI");
        assert_eq!(config.dates.start, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(config.export.scale, 10.0);
        // Untouched sections keep their defaults
        assert_eq!(config.sensors.len(), 3);
        assert_eq!(config.cloud_mask.qa_band, "QA_PIXEL");
    }

    #[test]
    fn test_sensor_table_round_trips() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[sensors]]
            sensor = "landsat8"
            catalog = "LANDSAT/LC08/C02/T1_L2"
            nir = "B5"
            red = "B4"
            retained = ["B4", "B5"]
            "#,
        )
        .unwrap();
        assert_eq!(config.sensors.len(), 1);
        assert_eq!(config.sensors[0].sensor, Sensor::Landsat8);
        assert_eq!(config.sensors[0].bands.retained, vec!["B4", "B5"]);
    }

    #[test]
    fn test_validation_rejects_bad_configs() {
        assert!(PipelineConfig::from_toml_str(
            r#"
            [dates]
            start = "2020-01-01"
            end = "2019-01-01"
            "#,
        )
        .is_err());

        assert!(PipelineConfig::from_toml_str("sensors = []").is_err());

        assert!(PipelineConfig::from_toml_str(
            r#"
            [export]
            description = "x"
            scale = -5.0
            max_pixels = 10
            "#,
        )
        .is_err());
    }
}
