use std::error::Error;

use serde_json::{json, Value};

use crate::materialize::{PathRow, ResultRelation};

/// Renders the relation as a GeoJSON FeatureCollection, one feature per
/// path. Pairs without a path (unreachable, unresolved, aborted) keep
/// their properties but carry a null geometry.
pub fn render(relation: &ResultRelation) -> Result<String, Box<dyn Error>> {
    let features: Vec<Value> = relation.rows.iter().map(feature).collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    Ok(serde_json::to_string_pretty(&collection)?)
}

fn feature(row: &PathRow) -> Value {
    let geometry = match row.geometry.as_slice() {
        [] => Value::Null,
        [(x, y)] => json!({ "type": "Point", "coordinates": [x, y] }),
        points => {
            let coordinates: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
            json!({ "type": "LineString", "coordinates": coordinates })
        }
    };

    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "path_id": row.path_id,
            "outcome": row.outcome.as_str(),
            "cost": row.cost,
            "node_count": row.node_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::PathOutcome;

    fn row(geometry: Vec<(f64, f64)>, cost: Option<f64>, outcome: PathOutcome) -> PathRow {
        PathRow {
            path_id: 0,
            outcome,
            source_x: 0.0,
            source_y: 0.0,
            target_x: 1.0,
            target_y: 1.0,
            cost,
            node_count: geometry.len(),
            geometry,
        }
    }

    #[test]
    fn found_paths_become_linestring_features() {
        let relation = ResultRelation {
            graph_name: "roads".to_string(),
            solve_name: "commute".to_string(),
            rows: vec![row(
                vec![(0.0, 0.0), (1.0, 0.0)],
                Some(2.0),
                PathOutcome::Found,
            )],
        };
        let value: Value = serde_json::from_str(&render(&relation).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let feature = &value["features"][0];
        assert_eq!(feature["geometry"]["type"], "LineString");
        assert_eq!(feature["properties"]["cost"], 2.0);
    }

    #[test]
    fn unreachable_paths_keep_properties_with_null_geometry() {
        let relation = ResultRelation {
            graph_name: "roads".to_string(),
            solve_name: "commute".to_string(),
            rows: vec![row(vec![], None, PathOutcome::Unreachable)],
        };
        let value: Value = serde_json::from_str(&render(&relation).unwrap()).unwrap();
        let feature = &value["features"][0];
        assert!(feature["geometry"].is_null());
        assert_eq!(feature["properties"]["outcome"], "unreachable");
        assert!(feature["properties"]["cost"].is_null());
    }
}
