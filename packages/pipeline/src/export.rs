//! District choropleth export.
//!
//! Renders the loaded districts as a `GeoJSON` `FeatureCollection`
//! with the aggregated counters injected as feature properties, ready for
//! any map renderer to shade by `choropleth_norm`.

use care_map_aggregate::Aggregation;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

use crate::Dataset;

/// Builds one feature per district, in district order.
///
/// Districts without geometry are still emitted, with a `null` geometry.
#[must_use]
pub fn regions_geojson(dataset: &Dataset, aggregation: &Aggregation) -> FeatureCollection {
    let features = dataset
        .regions
        .iter()
        .zip(&aggregation.regions)
        .map(|(region, metrics)| {
            let mut properties = JsonObject::new();
            properties.insert(
                "district_name".to_owned(),
                JsonValue::from(metrics.name.clone()),
            );
            properties.insert(
                "num_hospitals".to_owned(),
                JsonValue::from(metrics.hospital_count),
            );
            properties.insert(
                "num_communities".to_owned(),
                JsonValue::from(metrics.community_count),
            );
            properties.insert(
                "sum_hospital_weights".to_owned(),
                JsonValue::from(metrics.sum_assigned_weight),
            );
            properties.insert(
                "sum_population".to_owned(),
                JsonValue::from(metrics.sum_population),
            );
            properties.insert(
                "choropleth_norm".to_owned(),
                JsonValue::from(metrics.normalized_score),
            );

            Feature {
                bbox: None,
                geometry: region
                    .geometry
                    .as_ref()
                    .map(|g| Geometry::new(geojson::Value::from(g))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
