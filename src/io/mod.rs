//! Archive access, region loading and raster export

pub mod archive;
pub mod export;
pub mod region;
pub mod scene_store;

// Re-export main types
pub use archive::{ImageArchive, MemoryArchive};
pub use export::{ExportParams, ExportReport, GeoTiffExporter};
pub use region::{load_region, parse_geojson};
pub use scene_store::{read_band_tiff, CatalogIndex, SceneEntry, SceneStore};
