use std::fs;

use waygraph::plan_execution::execute_plan;

fn write_sample_inputs(dir: &std::path::Path) {
    let roads = r#"geometry,weight,two_way
"LINESTRING (0 0, 1 0)",2.0,no
"LINESTRING (1 0, 2 0)",3.0,no
"LINESTRING (0 0, 1 1, 2 0)",10.0,no
"LINESTRING (7 7, 8 7)",1.0,no
"#;
    fs::write(dir.join("roads.csv"), roads).unwrap();
}

#[test]
fn plan_runs_end_to_end_and_writes_exports() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());

    let csv_out = dir.path().join("paths.csv");
    let geojson_out = dir.path().join("paths.geojson");
    let json_out = dir.path().join("paths.json");

    let plan = format!(
        r#"meta:
  name: test-roads
import:
  profiles:
    - filename: roads.csv
solves:
  - name: fanout
    mode: one_to_many
    sources:
      - [0.0, 0.0]
    destinations:
      - [2.0, 0.0]
      - [7.0, 7.0]
export:
  profiles:
    - filename: {csv}
      exporter: CSVPaths
    - filename: {geojson}
      exporter: GeoJSON
      solve: fanout
    - filename: {json}
      exporter: JSON
      solve: fanout
"#,
        csv = csv_out.display(),
        geojson = geojson_out.display(),
        json = json_out.display(),
    );
    let plan_path = dir.path().join("plan.yaml");
    fs::write(&plan_path, plan).unwrap();

    execute_plan(plan_path.to_string_lossy().to_string(), false).unwrap();

    // CSV: header plus one line per destination, detour cost 5 not 10.
    let csv_content = fs::read_to_string(&csv_out).unwrap();
    let lines: Vec<&str> = csv_content.trim_end().lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("found"));
    assert!(lines[1].contains(",5,"));
    assert!(lines[2].contains("unreachable"));

    // GeoJSON parses and carries one feature per path.
    let geojson: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&geojson_out).unwrap()).unwrap();
    assert_eq!(geojson["type"], "FeatureCollection");
    assert_eq!(geojson["features"].as_array().unwrap().len(), 2);
    assert_eq!(geojson["features"][0]["geometry"]["type"], "LineString");
    assert!(geojson["features"][1]["geometry"].is_null());

    // JSON relation keeps pairing order and graph metadata.
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    assert_eq!(json["graph_name"], "test-roads");
    assert_eq!(json["solve_name"], "fanout");
    assert_eq!(json["rows"][0]["cost"], 5.0);
    assert!(json["rows"][1]["cost"].is_null());
}

#[test]
fn plan_with_bad_weight_fails_without_exports() {
    let dir = tempfile::tempdir().unwrap();
    let roads = r#"geometry,weight,two_way
"LINESTRING (0 0, 1 0)",-2.0,no
"#;
    fs::write(dir.path().join("roads.csv"), roads).unwrap();

    let out = dir.path().join("paths.csv");
    let plan = format!(
        r#"import:
  profiles:
    - filename: roads.csv
solves:
  - name: s
    mode: one_to_one
    sources:
      - [0.0, 0.0]
    destinations:
      - [1.0, 0.0]
export:
  profiles:
    - filename: {out}
      exporter: CSVPaths
"#,
        out = out.display(),
    );
    let plan_path = dir.path().join("plan.yaml");
    fs::write(&plan_path, plan).unwrap();

    let result = execute_plan(plan_path.to_string_lossy().to_string(), false);
    assert!(result.is_err());
    assert!(!out.exists());
}

#[test]
fn plan_with_mismatched_pairing_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_inputs(dir.path());

    let plan = r#"import:
  profiles:
    - filename: roads.csv
solves:
  - name: broken
    mode: many_to_many
    sources:
      - [0.0, 0.0]
      - [1.0, 0.0]
    destinations:
      - [2.0, 0.0]
"#;
    let plan_path = dir.path().join("plan.yaml");
    fs::write(&plan_path, plan).unwrap();

    let result = execute_plan(plan_path.to_string_lossy().to_string(), false);
    assert!(result.is_err());
}
