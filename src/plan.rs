use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use geo::Coord;

use crate::solver::{SolveMode, SolveOptions, SolveRequest};

/// ## Structure
/// This module contains the data structures for the solve-plan file.
///
/// ```text
/// Plan
///   ├── meta: PlanMeta (graph name)
///   ├── import: ImportConfig
///   │   └── profiles: Vec<ImportProfile>
///   │       └── filename: String
///   ├── graph: GraphSection (endpoint snap epsilon)
///   ├── solves: Vec<SolveProfile>
///   │       ├── name: String
///   │       ├── mode: one_to_one | one_to_many | many_to_many
///   │       ├── sources / destinations: point lists
///   │       └── timeout_ms: Option<u64>
///   └── export: ExportProfile
///       └── profiles: Vec<ExportProfileItem>
///           ├── filename: String
///           ├── exporter: ExportFileType
///           │       ├── CSVPaths
///           │       ├── JSON
///           │       ├── GeoJSON
///           │       └── Custom(CustomExportProfile)
///           └── solve: Option<String>
/// ```

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Plan {
    #[serde(default)]
    pub meta: Option<PlanMeta>,
    pub import: ImportConfig,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub solves: Vec<SolveProfile>,
    #[serde(default)]
    pub export: ExportProfile,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PlanMeta {
    pub name: Option<String>,
}

//
// Import configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ImportConfig {
    pub profiles: Vec<ImportProfile>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImportProfile {
    pub filename: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct GraphSection {
    /// Edge endpoints within this distance collapse to one node. Zero
    /// means exact coordinate identity.
    #[serde(default)]
    pub epsilon: f64,
}

//
// Solve configuration
//

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SolveProfile {
    pub name: String,
    pub mode: SolveMode,
    pub sources: Vec<[f64; 2]>,
    pub destinations: Vec<[f64; 2]>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SolveProfile {
    pub fn to_request(&self) -> SolveRequest {
        let as_coords = |points: &[[f64; 2]]| {
            points
                .iter()
                .map(|&[x, y]| Coord { x, y })
                .collect::<Vec<_>>()
        };
        SolveRequest {
            mode: self.mode,
            sources: as_coords(&self.sources),
            destinations: as_coords(&self.destinations),
        }
    }

    pub fn options(&self) -> SolveOptions {
        SolveOptions {
            timeout: self.timeout_ms.map(Duration::from_millis),
            cancel: None,
        }
    }
}

//
// Export configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExportProfile {
    pub profiles: Vec<ExportProfileItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExportProfileItem {
    pub filename: String,
    pub exporter: ExportFileType,
    /// Name of the solve whose result relation to render; the first solve
    /// when omitted.
    #[serde(default)]
    pub solve: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CustomExportProfile {
    pub template: String,
    pub partials: Option<HashMap<String, String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ExportFileType {
    CSVPaths,
    JSON,
    GeoJSON,
    Custom(CustomExportProfile),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let config = ImportConfig {
            profiles: vec![ImportProfile {
                filename: "roads.csv".to_string(),
            }],
        };

        let yaml_str = serde_yaml::to_string(&config).unwrap();
        assert!(yaml_str.contains("profiles"));
    }

    #[test]
    fn test_deserialization() {
        let yaml_str = r#"
profiles:
  - filename: roads.csv
"#;

        let config: ImportConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].filename, "roads.csv");
    }

    #[test]
    fn test_planfile_deserialization() {
        let yaml_str = r#"
meta:
  name: city-roads
import:
  profiles:
    - filename: roads.csv
graph:
  epsilon: 0.001
solves:
  - name: commute
    mode: one_to_many
    sources:
      - [0.0, 0.0]
    destinations:
      - [5.0, 5.0]
      - [9.0, 1.0]
    timeout_ms: 2000
export:
  profiles:
    - filename: commute.csv
      exporter: CSVPaths
    - filename: commute.geojson
      exporter: GeoJSON
      solve: commute
"#;

        let plan: Plan = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(plan.graph.epsilon, 0.001);
        assert_eq!(plan.solves.len(), 1);
        assert_eq!(plan.solves[0].destinations.len(), 2);
        assert_eq!(plan.export.profiles.len(), 2);

        let request = plan.solves[0].to_request();
        assert_eq!(request.sources.len(), 1);
        assert_eq!(request.destinations[1].x, 9.0);
        let options = plan.solves[0].options();
        assert_eq!(options.timeout, Some(std::time::Duration::from_secs(2)));
    }

    #[test]
    fn test_custom_exporter_deserialization() {
        let yaml_str = r#"
profiles:
  - filename: summary.txt
    exporter: !Custom
      template: summary.hbs
      partials: null
"#;

        let config: ExportProfile = serde_yaml::from_str(yaml_str).unwrap();
        assert!(matches!(
            config.profiles[0].exporter,
            ExportFileType::Custom(_)
        ));
    }
}
