use csv::Writer;
use std::error::Error;

use crate::geometry::points_to_wkt;
use crate::materialize::ResultRelation;

pub fn render(relation: &ResultRelation) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record([
        "path_id",
        "outcome",
        "source_x",
        "source_y",
        "target_x",
        "target_y",
        "cost",
        "node_count",
        "geometry",
    ])?;

    for row in &relation.rows {
        wtr.write_record(&[
            row.path_id.to_string(),
            row.outcome.as_str().to_string(),
            row.source_x.to_string(),
            row.source_y.to_string(),
            row.target_x.to_string(),
            row.target_y.to_string(),
            row.cost.map(|c| c.to_string()).unwrap_or_default(),
            row.node_count.to_string(),
            points_to_wkt(&row.geometry),
        ])?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::PathRow;
    use crate::solver::PathOutcome;

    #[test]
    fn renders_header_and_one_line_per_row() {
        let relation = ResultRelation {
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
        };

        let output = render(&relation).unwrap();
        let lines: Vec<&str> = output.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("path_id,outcome"));
        assert!(lines[1].contains("found"));
        assert!(lines[1].contains("LINESTRING (0 0, 1 0, 2 0)"));
        // Unreachable: empty cost column, no geometry.
        assert!(lines[2].contains("unreachable"));
        assert!(lines[2].contains(",,"));
    }
}
