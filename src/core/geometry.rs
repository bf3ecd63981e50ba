//! Geometry assembly: materialized routes to styled multi-line features

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::Value as JsonValue;
use serde::Serialize;

use crate::core::entity::{Coord, Tags};
use crate::core::materialize::MaterializedRoute;

/// Way role marking passenger platforms, left out of the track geometry
pub const PLATFORM_ROLE: &str = "platform";

/// Route types drawn with a heavier stroke
const HEAVY_RAIL_ROUTES: [&str; 2] = ["subway", "light_rail"];

/// Final output for one route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub id: u64,
    pub parent: u64,
    /// Route tags plus `id`, `parent`, `stroke` and `stroke-width`
    pub tags: Tags,
    /// One line per track way, each in node order
    pub geometry: Vec<Vec<Coord>>,
}

pub fn stroke_width(tags: &Tags) -> u32 {
    match tags.get("route") {
        Some(route) if HEAVY_RAIL_ROUTES.contains(&route.as_str()) => 2,
        _ => 1,
    }
}

/// Build the styled track geometry of one route
pub fn assemble(route: &MaterializedRoute) -> RouteGeometry {
    let mut tags = route.relation.tags.clone();
    tags.insert("id".to_string(), route.id().to_string());
    tags.insert("parent".to_string(), route.parent.to_string());
    if let Some(colour) = route.relation.tags.get("colour") {
        tags.insert("stroke".to_string(), colour.clone());
    }
    tags.insert("stroke-width".to_string(), stroke_width(&route.relation.tags).to_string());

    let geometry = route
        .ways
        .iter()
        .filter(|way| way.role != PLATFORM_ROLE)
        .map(|way| way.coordinates.clone())
        .collect();

    RouteGeometry {
        id: route.id(),
        parent: route.parent,
        tags,
        geometry,
    }
}

impl RouteGeometry {
    /// GeoJSON feature with a MultiLineString and the tags as properties
    pub fn to_feature(&self) -> Feature {
        let lines = self
            .geometry
            .iter()
            .map(|line| line.iter().map(|c| vec![c.lon, c.lat]).collect())
            .collect();

        let mut properties = JsonObject::new();
        for (key, value) in &self.tags {
            properties.insert(key.clone(), JsonValue::from(value.as_str()));
        }
        // Numeric in the output, as simplestyle consumers expect
        properties.insert("id".to_string(), JsonValue::from(self.id));
        properties.insert("parent".to_string(), JsonValue::from(self.parent));
        properties.insert(
            "stroke-width".to_string(),
            JsonValue::from(stroke_width(&self.tags)),
        );

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::MultiLineString(lines))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Wrap all routes into one collection, in the given order
pub fn feature_collection(routes: &[RouteGeometry]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: routes.iter().map(RouteGeometry::to_feature).collect(),
        foreign_members: None,
    }
}
