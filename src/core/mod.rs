//! Core pipeline stages: masking, index math, collection algebra,
//! temporal reduction and series building

pub mod cloud_mask;
pub mod collection;
pub mod composite;
pub mod ndvi;
pub mod processor;
pub mod series;

// Re-export main types
pub use cloud_mask::{CloudMask, CloudMaskParams};
pub use collection::ImageCollection;
pub use composite::{mean_over_region, median_composite, CompositeRaster};
pub use ndvi::{NdviCalculator, NdviParams};
pub use processor::{SensorBands, SensorProcessor};
pub use series::{band_series, ChartOptions, SeriesChart, SeriesPoint};
