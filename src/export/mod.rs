pub mod to_csv_paths;
pub mod to_custom;
pub mod to_geojson;
pub mod to_json;

/// Common rendering context used by the template-driven exporters.
pub mod renderer {
    use serde_json::{json, Value};

    use crate::materialize::ResultRelation;

    pub fn create_relation_context(relation: &ResultRelation) -> Value {
        json!({
            "graph_name": relation.graph_name,
            "solve_name": relation.solve_name,
            "row_count": relation.rows.len(),
            "rows": relation.rows,
        })
    }
}
