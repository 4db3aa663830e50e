use crate::types::{RegionOfInterest, VegError, VegResult};
use serde_json::Value;
use std::path::Path;

/// Load a region of interest from a GeoJSON file.
///
/// Accepts a bare Polygon/MultiPolygon geometry, a Feature wrapping one,
/// or a FeatureCollection (all polygon features contribute rings). Only
/// exterior rings are used; holes are ignored.
pub fn load_region<P: AsRef<Path>>(path: P) -> VegResult<RegionOfInterest> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        VegError::Metadata(format!("cannot read region {}: {}", path.display(), e))
    })?;
    let region = parse_geojson(&text)?;
    log::info!(
        "Loaded region from {} ({} ring(s))",
        path.display(),
        region.rings().len()
    );
    Ok(region)
}

/// Parse GeoJSON text into a region of interest.
pub fn parse_geojson(text: &str) -> VegResult<RegionOfInterest> {
    let value: Value = serde_json::from_str(text)?;
    let mut rings = Vec::new();
    collect_rings(&value, &mut rings)?;
    RegionOfInterest::from_rings(rings)
}

fn collect_rings(value: &Value, rings: &mut Vec<Vec<[f64; 2]>>) -> VegResult<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| VegError::InvalidFormat("GeoJSON object without 'type'".to_string()))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    VegError::InvalidFormat("FeatureCollection without 'features'".to_string())
                })?;
            for feature in features {
                collect_rings(feature, rings)?;
            }
            Ok(())
        }
        "Feature" => {
            let geometry = value.get("geometry").ok_or_else(|| {
                VegError::InvalidFormat("Feature without 'geometry'".to_string())
            })?;
            collect_rings(geometry, rings)
        }
        "Polygon" => {
            let coords = coordinates(value)?;
            rings.push(exterior_ring(coords)?);
            Ok(())
        }
        "MultiPolygon" => {
            let coords = coordinates(value)?;
            for polygon in coords.as_array().into_iter().flatten() {
                rings.push(exterior_ring(polygon)?);
            }
            Ok(())
        }
        other => Err(VegError::InvalidFormat(format!(
            "unsupported GeoJSON geometry '{}'; expected Polygon or MultiPolygon",
            other
        ))),
    }
}

fn coordinates(value: &Value) -> VegResult<&Value> {
    value
        .get("coordinates")
        .ok_or_else(|| VegError::InvalidFormat("geometry without 'coordinates'".to_string()))
}

/// First ring of a polygon coordinate array, with the GeoJSON closing
/// vertex dropped (our rings close implicitly).
fn exterior_ring(polygon: &Value) -> VegResult<Vec<[f64; 2]>> {
    let ring = polygon
        .as_array()
        .and_then(|rings| rings.first())
        .and_then(Value::as_array)
        .ok_or_else(|| VegError::InvalidFormat("polygon without exterior ring".to_string()))?;

    let mut vertices = Vec::with_capacity(ring.len());
    for position in ring {
        let pair = position.as_array().ok_or_else(|| {
            VegError::InvalidFormat("ring position is not an array".to_string())
        })?;
        if pair.len() < 2 {
            return Err(VegError::InvalidFormat(
                "ring position needs two coordinates".to_string(),
            ));
        }
        let x = pair[0].as_f64().ok_or_else(|| {
            VegError::InvalidFormat("non-numeric coordinate in ring".to_string())
        })?;
        let y = pair[1].as_f64().ok_or_else(|| {
            VegError::InvalidFormat("non-numeric coordinate in ring".to_string())
        })?;
        vertices.push([x, y]);
    }
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_polygon() {
        let region = parse_geojson(
            r#"{"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,10],[0,0]]]}"#,
        )
        .unwrap();
        assert_eq!(region.rings().len(), 1);
        assert_eq!(region.rings()[0].len(), 4);
        assert!(region.contains(5.0, 5.0));
    }

    #[test]
    fn test_feature_collection_multi_polygon() {
        let region = parse_geojson(
            r#"{
              "type": "FeatureCollection",
              "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                   [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                   [[[5,5],[6,5],[6,6],[5,6],[5,5]]]
                 ]}}
              ]
            }"#,
        )
        .unwrap();
        assert_eq!(region.rings().len(), 2);
        assert!(region.contains(0.5, 0.5));
        assert!(region.contains(5.5, 5.5));
        assert!(!region.contains(3.0, 3.0));
    }

    #[test]
    fn test_unsupported_geometry_is_rejected() {
        assert!(parse_geojson(r#"{"type":"Point","coordinates":[0,0]}"#).is_err());
        assert!(parse_geojson(r#"{"coordinates":[]}"#).is_err());
    }

    #[test]
    fn test_load_region_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study_area.geojson");
        std::fs::write(
            &path,
            r#"{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}"#,
        )
        .unwrap();
        let region = load_region(&path).unwrap();
        assert!(region.contains(1.0, 1.0));
    }
}
