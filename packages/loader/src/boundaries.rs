//! District boundary `GeoJSON` parsing.
//!
//! Accepts a `FeatureCollection` (or a lone `Feature`) of `Polygon` /
//! `MultiPolygon` features. The name property is picked once from the first
//! feature's properties using [`schema::REGION_NAME`], falling back to that
//! feature's first property key.

use care_map_facility_models::{Region, RegionId};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson, JsonObject, JsonValue};

use crate::LoadError;
use crate::schema;

/// Name used for features that have no value for the name property.
pub const UNNAMED_REGION: &str = "—";

/// Parses district polygons from `GeoJSON` text.
///
/// Features without a usable areal geometry are kept (so they still show up
/// in reports) with `geometry: None`.
///
/// # Errors
///
/// Returns an error if the text is not valid `GeoJSON` or is a bare
/// geometry rather than features.
pub fn read_regions(text: &str, input: &str) -> Result<Vec<Region>, LoadError> {
    let geojson: GeoJson = text.parse().map_err(|e| LoadError::GeoJson {
        input: input.to_owned(),
        source: Box::new(e),
    })?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(LoadError::InvalidBoundary {
                input: input.to_owned(),
                message: "expected a FeatureCollection, found a bare geometry".to_owned(),
            });
        }
    };

    let name_field = detect_name_field(&features);
    match &name_field {
        Some(field) => log::debug!("{input}: district name property = {field:?}"),
        None => log::warn!("{input}: features have no properties, districts will be unnamed"),
    }

    let regions: Vec<Region> = features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let name = region_name(feature.properties.as_ref(), name_field.as_deref());
            let geometry = feature_geometry(feature);
            if geometry.is_none() {
                log::warn!("{input}: district {name:?} has no polygon geometry");
            }
            Region {
                id: RegionId(idx),
                name,
                geometry,
            }
        })
        .collect();

    log::info!("{input}: loaded {} districts", regions.len());

    Ok(regions)
}

/// Picks the property key holding district names.
fn detect_name_field(features: &[Feature]) -> Option<String> {
    let properties = features.first()?.properties.as_ref()?;

    schema::REGION_NAME
        .iter()
        .find(|candidate| properties.contains_key(**candidate))
        .map(|candidate| (*candidate).to_owned())
        .or_else(|| properties.keys().next().cloned())
}

fn region_name(properties: Option<&JsonObject>, field: Option<&str>) -> String {
    let value = field.and_then(|field| properties?.get(field));

    match value {
        None | Some(JsonValue::Null) => UNNAMED_REGION.to_owned(),
        Some(JsonValue::String(s)) if s.trim().is_empty() => UNNAMED_REGION.to_owned(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn feature_geometry(feature: Feature) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = feature.geometry?.try_into().ok()?;
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_feature(props: &str, x0: f64, y0: f64) -> String {
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;
        format!(
            r#"{{"type":"Feature","properties":{props},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}"#
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn reads_named_polygons_in_order() {
        let text = collection(&[
            square_feature(r#"{"amp_th":"พระนคร","code":1}"#, 100.0, 13.0),
            square_feature(r#"{"amp_th":"ราชเทวี","code":2}"#, 101.0, 13.0),
        ]);
        let regions = read_regions(&text, "districts.geojson").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, RegionId(0));
        assert_eq!(regions[0].name, "พระนคร");
        assert_eq!(regions[1].name, "ราชเทวี");
        assert!(regions[1].geometry.is_some());
    }

    #[test]
    fn name_property_follows_candidate_priority() {
        let text = collection(&[square_feature(
            r#"{"name":"English","amp_th":"ไทย"}"#,
            100.0,
            13.0,
        )]);
        let regions = read_regions(&text, "districts.geojson").unwrap();
        assert_eq!(regions[0].name, "ไทย");
    }

    #[test]
    fn name_falls_back_to_first_property() {
        let text = collection(&[square_feature(
            r#"{"zeta":"First","alpha":"Second"}"#,
            100.0,
            13.0,
        )]);
        let regions = read_regions(&text, "districts.geojson").unwrap();
        assert_eq!(regions[0].name, "First");
    }

    #[test]
    fn missing_names_and_geometries_are_kept() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"amp_th":null},"geometry":null},
            {"type":"Feature","properties":{"amp_th":42},"geometry":{"type":"Point","coordinates":[100.0,13.0]}}
        ]}"#;
        let regions = read_regions(text, "districts.geojson").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, UNNAMED_REGION);
        assert!(regions[0].geometry.is_none());
        assert_eq!(regions[1].name, "42");
        assert!(regions[1].geometry.is_none());
    }

    #[test]
    fn rejects_invalid_geojson() {
        let err = read_regions("{not json", "districts.geojson").unwrap_err();
        assert!(matches!(err, LoadError::GeoJson { .. }));

        let err = read_regions(
            r#"{"type":"Point","coordinates":[100.0,13.0]}"#,
            "districts.geojson",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidBoundary { .. }));
    }
}
