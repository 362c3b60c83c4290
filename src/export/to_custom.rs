use std::error::Error;
use std::fs;

use tracing::error;

use crate::materialize::ResultRelation;
use crate::plan::CustomExportProfile;

pub fn render(
    relation: &ResultRelation,
    params: &CustomExportProfile,
) -> Result<String, Box<dyn Error>> {
    let mut handlebars = crate::common::get_handlebars();

    if let Some(partials) = &params.partials {
        for (name, partial) in partials {
            match fs::read_to_string(partial) {
                Ok(partial_content) => {
                    if let Err(err) = handlebars.register_partial(name, partial_content) {
                        error!("Failed to register partial '{}': {}", name, err);
                    }
                }
                Err(err) => {
                    error!("Failed to read partial file '{}': {}", partial, err);
                    return Err(
                        format!("Failed to read partial file '{}': {}", partial, err).into(),
                    );
                }
            }
        }
    }

    let template_content = fs::read_to_string(&params.template).map_err(|err| {
        format!(
            "Failed to read template file '{}': {}",
            params.template, err
        )
    })?;

    let context = super::renderer::create_relation_context(relation);
    let res = handlebars.render_template(&template_content, &context)?;
    Ok(res)
}

/// Default template for a plain-text solve summary.
pub fn get_template() -> String {
    let template = r##"{{solve_name}} on {{graph_name}} ({{row_count}} paths)
{{#each rows as |row|}}
path {{row.path_id}}: {{row.outcome}}{{#if (finite row.cost)}}, cost {{fixed row.cost 2}}, {{row.node_count}} nodes{{/if}}
{{/each}}
"##;

    template.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::get_handlebars;
    use crate::export::renderer::create_relation_context;
    use crate::materialize::PathRow;
    use crate::solver::PathOutcome;

    fn sample_relation() -> ResultRelation {
        ResultRelation {
            graph_name: "roads".to_string(),
            solve_name: "commute".to_string(),
            rows: vec![
                PathRow {
                    path_id: 0,
                    outcome: PathOutcome::Found,
                    source_x: 0.0,
                    source_y: 0.0,
                    target_x: 2.0,
                    target_y: 0.0,
                    cost: Some(5.0),
                    node_count: 3,
                    geometry: vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)],
                },
                PathRow {
                    path_id: 1,
                    outcome: PathOutcome::Unreachable,
                    source_x: 0.0,
                    source_y: 0.0,
                    target_x: 9.0,
                    target_y: 9.0,
                    cost: None,
                    node_count: 0,
                    geometry: vec![],
                },
            ],
        }
    }

    #[test]
    fn template_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(&get_template(), &create_relation_context(&sample_relation()))
            .expect("This to render");
        assert!(res.contains("commute on roads (2 paths)"));
        assert!(res.contains("path 0: found, cost 5.00, 3 nodes"));
        assert!(res.contains("path 1: unreachable"));
    }

    #[test]
    fn render_reads_template_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("summary.hbs");
        std::fs::write(&template_path, "{{row_count}} solved against {{graph_name}}").unwrap();

        let params = CustomExportProfile {
            template: template_path.to_string_lossy().to_string(),
            partials: None,
        };
        let res = render(&sample_relation(), &params).unwrap();
        assert_eq!(res, "2 solved against roads");
    }

    #[test]
    fn render_fails_on_missing_template() {
        let params = CustomExportProfile {
            template: "does-not-exist.hbs".to_string(),
            partials: None,
        };
        assert!(render(&sample_relation(), &params).is_err());
    }
}
