use std::error::Error;

use crate::materialize::ResultRelation;

pub fn render(relation: &ResultRelation) -> Result<String, Box<dyn Error>> {
    let context = super::renderer::create_relation_context(relation);
    Ok(serde_json::to_string_pretty(&context)?)
}
