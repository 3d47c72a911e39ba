//! Scenario validation against files on disk.

use std::path::Path;

use combat_core::error::CombatError;
use combat_tools::validate::{validate_path, validate_scenario_directory, validate_scenario_file};

const VALID: &str = r#"ScenarioData(
    name: "pair",
    units: [
        (id: 1, name: "A", team: 0, position: (x: 0.0, y: 0.0, z: 0.0), armor: 10.0, core: 10.0),
        (id: 2, name: "B", team: 1, position: (x: 1.0, y: 0.0, z: 0.0), armor: 10.0, core: 10.0),
    ],
    engagements: [
        (attacker: 1, target: 2, lock_time_ms: 100, cycle_ms: 100, damages: [(Toxic, 1.0)]),
    ],
)"#;

#[test]
fn test_shipped_scenarios_are_valid() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenarios");
    let reports = validate_scenario_directory(&dir).unwrap();
    assert!(reports.iter().any(|report| report.name == "skirmish"));
}

#[test]
fn test_directory_reports_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.ron"), VALID.replace("pair", "second")).unwrap();
    std::fs::write(dir.path().join("a.ron"), VALID).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a scenario").unwrap();

    let reports = validate_path(dir.path()).unwrap();
    let names: Vec<_> = reports.iter().map(|report| report.name.as_str()).collect();
    assert_eq!(names, ["pair", "second"]);
    assert_eq!(reports[0].units, 2);
    assert_eq!(reports[0].engagements, 1);
}

#[test]
fn test_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.ron");
    std::fs::write(&path, VALID).unwrap();

    let reports = validate_path(&path).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].path, path);
}

#[test]
fn test_negative_damage_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ron");
    std::fs::write(&path, VALID.replace("(Toxic, 1.0)", "(Toxic, -1.0)")).unwrap();

    assert!(matches!(
        validate_scenario_file(&path),
        Err(CombatError::InvalidScenario(_))
    ));
}

#[test]
fn test_missing_file_names_path() {
    let err = validate_scenario_file(Path::new("/nonexistent/scenario.ron")).unwrap_err();
    assert!(matches!(err, CombatError::DataParseError { .. }));
    assert!(err.to_string().contains("/nonexistent/scenario.ron"));
}
