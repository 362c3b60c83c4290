use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::channel;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use anyhow::{anyhow, Result};
use csv::StringRecord;

use crate::builder::EdgeRecord;
use crate::data_loader;
use crate::materialize::ResultRelation;
use crate::plan::{ExportFileType, ExportProfileItem, Plan};
use crate::services::SolveService;
use crate::solver::PathOutcome;

/// Loads a data file from disk, supporting CSV and TSV formats
fn load_file(file_path: &str) -> Result<(Vec<String>, Vec<StringRecord>)> {
    let extension = std::path::Path::new(file_path)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");

    let separator = match extension {
        "csv" => b',',
        "tsv" => b'\t',
        _ => {
            error!("Error: unsupported extension {}", extension);
            anyhow::bail!("Unsupported extension");
        }
    };

    let headers = data_loader::get_headers_from_file(file_path, separator)?;
    let records = match extension {
        "csv" => data_loader::load_csv(file_path),
        "tsv" => data_loader::load_tsv(file_path),
        _ => unreachable!(), // We already checked extension above
    }?;

    debug!(
        "Loaded {} records with headers: {:?}",
        records.len(),
        headers
    );
    Ok((headers, records))
}

/// Loads raw edge records from every import profile of the plan.
fn load_edge_records(plan: &Plan, plan_file_path: &Path) -> Result<Vec<EdgeRecord>> {
    let mut edge_records = Vec::new();

    for profile in &plan.import.profiles {
        let parent_dir = plan_file_path
            .parent()
            .ok_or_else(|| anyhow!("Plan file has no parent directory"))?;
        let import_file_path = parent_dir.join(&profile.filename);
        info!("Importing file: {}", import_file_path.display());

        let file_path_str = import_file_path.to_str().ok_or_else(|| {
            anyhow!(
                "Import file path contains invalid UTF-8: {}",
                import_file_path.display()
            )
        })?;
        let (headers, records) = load_file(file_path_str)?;

        data_loader::verify_edges_headers(&headers)?;
        let edge_profile = data_loader::create_edge_load_profile(&headers);
        info!("{}", edge_profile);

        for (i, record) in records.iter().enumerate() {
            let index = edge_records.len();
            match data_loader::edge_from_record(record, &edge_profile, i) {
                Ok(edge) => edge_records.push(edge),
                Err(e) => return Err(anyhow!("Error creating edge record {}: {}", index, e)),
            };
        }
    }

    info!("Loaded {} edge records", edge_records.len());
    Ok(edge_records)
}

fn graph_name_from_plan(plan: &Plan) -> String {
    plan.meta
        .as_ref()
        .and_then(|meta| meta.name.clone())
        .unwrap_or_else(|| "unnamed-graph".to_string())
}

/// Runs every solve profile, keyed by solve name.
fn run_solves(
    service: &SolveService,
    graph_name: &str,
    plan: &Plan,
) -> Result<HashMap<String, ResultRelation>> {
    let mut relations = HashMap::new();

    for profile in &plan.solves {
        info!(
            "Running solve '{}' ({:?}): {} source(s), {} destination(s)",
            profile.name,
            profile.mode,
            profile.sources.len(),
            profile.destinations.len()
        );
        let relation = service
            .solve_named(graph_name, &profile.name, &profile.to_request(), &profile.options())
            .map_err(|e| anyhow!("Solve '{}' failed: {}", profile.name, e))?;

        let found = relation
            .rows
            .iter()
            .filter(|r| r.outcome == PathOutcome::Found)
            .count();
        let aborted = relation
            .rows
            .iter()
            .filter(|r| r.outcome == PathOutcome::Aborted)
            .count();
        info!(
            "Solve '{}' produced {} path(s): {} found, {} not found, {} aborted",
            profile.name,
            relation.rows.len(),
            found,
            relation.rows.len() - found - aborted,
            aborted
        );
        relations.insert(profile.name.clone(), relation);
    }

    Ok(relations)
}

/// Renders one export profile to its file using the appropriate renderer
fn export_relation(relation: &ResultRelation, profile: &ExportProfileItem) -> Result<()> {
    info!(
        "Starting export to file: {} using exporter {:?}",
        profile.filename, profile.exporter
    );

    let result = match &profile.exporter {
        ExportFileType::CSVPaths => crate::export::to_csv_paths::render(relation),
        ExportFileType::JSON => crate::export::to_json::render(relation),
        ExportFileType::GeoJSON => crate::export::to_geojson::render(relation),
        ExportFileType::Custom(params) => crate::export::to_custom::render(relation, params),
    };

    match result {
        Ok(output) => {
            if let Err(e) = crate::common::write_string_to_file(&profile.filename, &output) {
                error!("Failed to write to file {}: {}", profile.filename, e);
            }
        }
        Err(e) => {
            error!("Failed to export file {}: {}", profile.filename, e);
        }
    }

    Ok(())
}

/// Executes a single solve plan
fn run_plan(plan: Plan, plan_file_path: &Path) -> Result<()> {
    let records = load_edge_records(&plan, plan_file_path)?;

    let service = SolveService::new();
    let graph_name = graph_name_from_plan(&plan);
    let graph = service
        .build_and_register(&graph_name, &records, plan.graph.epsilon)
        .map_err(|e| anyhow!("Failed to build graph '{}': {}", graph_name, e))?;
    info!("Graph '{}' ready: {}", graph_name, graph.stats());

    let relations = run_solves(&service, &graph_name, &plan)?;

    for profile in &plan.export.profiles {
        let solve_name = profile
            .solve
            .clone()
            .or_else(|| plan.solves.first().map(|s| s.name.clone()));
        let relation = solve_name.as_ref().and_then(|name| relations.get(name));

        match relation {
            Some(relation) => {
                if let Err(e) = export_relation(relation, profile) {
                    error!("Failed to export relation: {}", e);
                }
            }
            None => warn!(
                "Export profile '{}' references no known solve, skipping",
                profile.filename
            ),
        }
    }

    Ok(())
}

/// Main function to execute a plan, with optional file watching
pub fn execute_plan(plan: String, watch: bool) -> Result<()> {
    info!("Executing plan {}", plan);

    let plan_file_path = std::path::Path::new(&plan);
    let path_content = std::fs::read_to_string(plan_file_path)?;
    let plan: Plan = serde_yaml::from_str(&path_content)?;

    debug!("Executing plan: {:?}", plan);
    run_plan(plan.clone(), plan_file_path)?;

    if watch {
        watch_for_changes(plan, plan_file_path)?;
    }

    Ok(())
}

/// Sets up file watching for input files to re-run the plan on changes
fn watch_for_changes(plan: Plan, plan_file_path: &Path) -> Result<()> {
    info!("Watching for changes");
    let files: Vec<String> = plan
        .import
        .profiles
        .iter()
        .map(|profile| profile.filename.clone())
        .collect();

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    for file in &files {
        let parent_dir = plan_file_path
            .parent()
            .ok_or_else(|| anyhow!("Plan file has no parent directory"))?;
        let path = parent_dir.join(file);
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
    }

    loop {
        match rx.recv() {
            Ok(event) => {
                if let Ok(event) = event {
                    if let EventKind::Modify(_) = event.kind {
                        debug!("File modified {:?}", event.paths);
                        info!("Change detected, re-executing plan");
                        if let Err(e) = run_plan(plan.clone(), plan_file_path) {
                            error!("Failed to re-execute plan: {}", e);
                        }
                    }
                }
            }
            Err(e) => {
                error!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}
