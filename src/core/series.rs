use crate::core::collection::ImageCollection;
use crate::core::composite::mean_over_region;
use crate::types::{RegionOfInterest, VegResult};
use chrono::{DateTime, Utc};
use comfy_table::{presets, Table};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One observation of the regional index mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub mean: f64,
}

/// Chart labelling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "NDVI Time Series".to_string(),
            x_label: "Date".to_string(),
            y_label: "NDVI".to_string(),
        }
    }
}

/// Regional-mean time series of one band across a collection.
///
/// Scenes without a single valid in-region pixel contribute no point;
/// an empty collection yields an empty series, never an error.
pub fn band_series(
    collection: &ImageCollection,
    band: &str,
    region: &RegionOfInterest,
) -> VegResult<Vec<SeriesPoint>> {
    let mut points = Vec::with_capacity(collection.len());
    for image in collection.iter() {
        if let Some(mean) = mean_over_region(image, band, region)? {
            points.push(SeriesPoint {
                timestamp: image.metadata.timestamp,
                mean,
            });
        }
    }
    log::info!(
        "band_series: {} points from {} scenes",
        points.len(),
        collection.len()
    );
    Ok(points)
}

/// Console rendering of a time series as a labelled table, plus a CSV
/// writer for downstream plotting. Purely observational: nothing here
/// touches the exported composite.
pub struct SeriesChart {
    options: ChartOptions,
    points: Vec<SeriesPoint>,
}

impl SeriesChart {
    pub fn new(options: ChartOptions, points: Vec<SeriesPoint>) -> Self {
        Self { options, points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Render the chart for the console.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_header(vec![
            self.options.x_label.clone(),
            self.options.y_label.clone(),
        ]);
        for point in &self.points {
            table.add_row(vec![
                point.timestamp.format("%Y-%m-%d").to_string(),
                format!("{:.4}", point.mean),
            ]);
        }
        format!("{}\n{}", self.options.title, table)
    }

    /// Persist the series as CSV for external plotting tools.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> VegResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            self.options.x_label.as_str(),
            self.options.y_label.as_str(),
        ])?;
        for point in &self.points {
            writer.write_record([
                point.timestamp.to_rfc3339(),
                format!("{:.6}", point.mean),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BandData, BoundingBox, GeoTransform, Image, SceneMetadata, Sensor, NO_DATA,
    };
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn scene(id: &str, day: u32, value: f32) -> Image {
        let metadata = SceneMetadata {
            scene_id: id.to_string(),
            sensor: Sensor::Landsat7,
            timestamp: Utc.with_ymd_and_hms(2012, 4, day, 10, 0, 0).unwrap(),
            bounds: BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 60.0,
                max_y: 60.0,
            },
            geo_transform: GeoTransform::north_up(0.0, 60.0, 30.0),
        };
        Image::new(metadata)
            .with_band("NDVI", BandData::from_elem((2, 2), value))
            .unwrap()
    }

    #[test]
    fn test_series_one_point_per_valid_scene() {
        let collection = ImageCollection::from_images(vec![
            scene("a", 1, 0.2),
            scene("b", 15, 0.6),
        ]);
        let region = RegionOfInterest::rectangle(0.0, 0.0, 60.0, 60.0);
        let points = band_series(&collection, "NDVI", &region).unwrap();
        assert_eq!(points.len(), 2);
        assert_abs_diff_eq!(points[0].mean, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(points[1].mean, 0.6, epsilon = 1e-6);
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn test_fully_masked_scene_contributes_no_point() {
        let collection = ImageCollection::from_images(vec![
            scene("valid", 1, 0.2),
            scene("masked", 2, NO_DATA),
        ]);
        let region = RegionOfInterest::rectangle(0.0, 0.0, 60.0, 60.0);
        let points = band_series(&collection, "NDVI", &region).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_empty_collection_gives_empty_series() {
        let region = RegionOfInterest::rectangle(0.0, 0.0, 60.0, 60.0);
        let points = band_series(&ImageCollection::new(), "NDVI", &region).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_chart_renders_labels_and_rows() {
        let points = vec![SeriesPoint {
            timestamp: Utc.with_ymd_and_hms(2012, 4, 1, 10, 0, 0).unwrap(),
            mean: 0.1234,
        }];
        let chart = SeriesChart::new(ChartOptions::default(), points);
        let rendered = chart.render();
        assert!(rendered.contains("NDVI Time Series"));
        assert!(rendered.contains("Date"));
        assert!(rendered.contains("2012-04-01"));
        assert!(rendered.contains("0.1234"));
    }

    #[test]
    fn test_chart_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let points = vec![SeriesPoint {
            timestamp: Utc.with_ymd_and_hms(2012, 4, 1, 10, 0, 0).unwrap(),
            mean: 0.5,
        }];
        let chart = SeriesChart::new(ChartOptions::default(), points);
        chart.write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "Date,NDVI");
        assert!(lines.next().unwrap().starts_with("2012-04-01T10:00:00"));
    }
}
