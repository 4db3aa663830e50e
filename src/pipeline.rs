use crate::config::PipelineConfig;
use crate::core::{
    band_series, median_composite, CompositeRaster, ImageCollection, SensorProcessor, SeriesChart,
    SeriesPoint,
};
use crate::io::{ExportReport, GeoTiffExporter, ImageArchive};
use crate::types::{RegionOfInterest, VegResult};
use std::path::Path;

/// Everything one pipeline run produces
pub struct PipelineRun {
    /// Merged, chronologically sorted multi-sensor collection
    pub merged: ImageCollection,
    /// Temporal median of the index band; `None` when nothing survived
    /// filtering
    pub composite: Option<CompositeRaster>,
    /// Regional-mean index time series
    pub series: Vec<SeriesPoint>,
}

/// End-to-end NDVI compositing pipeline.
///
/// Mirrors the classic multi-sensor recipe: per-sensor filtering,
/// masking and index computation, a three-way merge, then a median
/// composite and a regional time series. One deliberate deviation from
/// the recipe: the merged collection is explicitly sorted by capture
/// time so the series is chronological across sensors, not just within
/// each sensor.
pub struct NdviPipeline {
    config: PipelineConfig,
}

impl NdviPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage against an archive backend.
    pub fn run(
        &self,
        archive: &dyn ImageArchive,
        region: &RegionOfInterest,
    ) -> VegResult<PipelineRun> {
        let processor = SensorProcessor::new(region.clone(), self.config.dates)
            .with_mask_params(self.config.cloud_mask.clone())
            .with_index_band(&self.config.index_band);

        let mut merged = ImageCollection::new();
        for sensor in &self.config.sensors {
            log::info!("Processing {} from '{}'", sensor.sensor, sensor.catalog);
            let raw = archive.collection(&sensor.catalog)?;
            let processed = processor.process(&raw, &sensor.bands)?;
            merged = merged.merge(processed)?;
        }
        let merged = merged.sort_by_time();
        log::info!("Merged collection holds {} scenes", merged.len());

        let series = band_series(&merged, &self.config.index_band, region)?;
        let composite = median_composite(&merged, &self.config.index_band)?;

        Ok(PipelineRun {
            merged,
            composite,
            series,
        })
    }

    /// Export the composite with the configured parameters.
    pub fn export(
        &self,
        run: &PipelineRun,
        region: &RegionOfInterest,
        path: &Path,
    ) -> VegResult<ExportReport> {
        GeoTiffExporter::with_params(self.config.export.clone()).export(
            run.composite.as_ref(),
            region,
            path,
        )
    }

    /// Chart of the run's time series with the configured labels.
    pub fn chart(&self, run: &PipelineRun) -> SeriesChart {
        SeriesChart::new(self.config.chart.clone(), run.series.clone())
    }
}
