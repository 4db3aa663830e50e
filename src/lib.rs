//! Verdant: A Fast, Modular Landsat NDVI Compositing Pipeline
//!
//! This library turns multi-sensor Landsat surface-reflectance scenes into
//! a cloud-free NDVI median composite and a regional NDVI time series.
//! Processing is expressed as pure stages over immutable image
//! collections; imagery comes in through the [`io::ImageArchive`] backend
//! seam, so the same pipeline runs against a directory-backed scene store
//! or an in-memory test double.

pub mod config;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    is_no_data, BandData, BoundingBox, DateRange, GeoTransform, Image, RegionOfInterest,
    SceneMetadata, Sensor, VegError, VegResult, NO_DATA,
};

pub use config::{PipelineConfig, SensorConfig};
pub use core::{
    band_series, mean_over_region, median_composite, ChartOptions, CloudMask, CloudMaskParams,
    CompositeRaster, ImageCollection, NdviCalculator, NdviParams, SensorBands, SensorProcessor,
    SeriesChart, SeriesPoint,
};
pub use io::{
    load_region, ExportParams, ExportReport, GeoTiffExporter, ImageArchive, MemoryArchive,
    SceneStore,
};
pub use pipeline::{NdviPipeline, PipelineRun};
