//! Command-line behaviour of the s2f tools

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const ADJUST: &str = env!("CARGO_BIN_EXE_adjust-s2f-recipe");
const VALIDATE_BOUTONS: &str = env!("CARGO_BIN_EXE_validate-bouton-density");
const VALIDATE_SYNS: &str = env!("CARGO_BIN_EXE_validate-syns-con");

const RECIPE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ConnectionRules>
  <rule from="L23_PC" to="L23_PC" bouton_reduction_factor="0.5"/>
  <rule from="L4_SS" to="L23_PC" bouton_reduction_factor="2.0"/>
  <rule from="L5_TTPC" to="L5_TTPC" bouton_reduction_factor="-1.0"/>
</ConnectionRules>
"#;

// Mean (ref.) = 1.5 * Mean (data)
const BOUTON_CSV: &str = "mtype,Mean (data),Std (data),Mean (ref.),Std (ref.),Error\n\
    L23_PC,1.0,0.1,1.5,0.1,-500.0\n\
    L4_SS,2.0,0.1,3.0,0.1,-1000.0\n";

fn run(program: &str, args: &[&str]) -> Output {
    Command::new(program)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run binary")
}

fn write_recipe(dir: &TempDir) -> String {
    let path = dir.path().join("recipe.xml");
    fs::write(&path, RECIPE).unwrap();
    path.display().to_string()
}

fn bouton_values(path: &Path) -> Vec<String> {
    let tree = s2f_core::recipe::read_recipe(path).unwrap();
    tree.nodes()
        .iter()
        .filter_map(|n| n.attribute("bouton_reduction_factor"))
        .map(String::from)
        .collect()
}

#[test]
fn test_adjust_without_input_is_usage_error() {
    let output = run(ADJUST, &["-b", "boutons.csv"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_validate_tools_need_three_arguments() {
    for program in [VALIDATE_BOUTONS, VALIDATE_SYNS] {
        let output = run(program, &["CircuitConfig", "mc2_Column"]);
        assert_eq!(output.status.code(), Some(2), "{}", program);
    }
}

#[test]
fn test_adjust_without_tables_copies_recipe() {
    let dir = TempDir::new().unwrap();
    let input = write_recipe(&dir);

    let output = run(ADJUST, &["-i", &input]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No adjustments will be performed"));

    let adjusted = dir.path().join("recipe_adjusted.xml");
    assert_eq!(bouton_values(&adjusted), vec!["0.5", "2.0", "-1.0"]);
}

#[test]
fn test_adjust_bouton_density() {
    let dir = TempDir::new().unwrap();
    let input = write_recipe(&dir);
    let table = dir.path().join("boutons.csv");
    fs::write(&table, BOUTON_CSV).unwrap();
    let out = dir.path().join("adjusted.xml");
    let report = dir.path().join("report.json");

    let output = run(
        ADJUST,
        &[
            "-i",
            &input,
            "-b",
            &table.display().to_string(),
            "-o",
            &out.display().to_string(),
            "--report",
            &report.display().to_string(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(bouton_values(&out), vec!["0.75", "1.0", "0.0"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Scale factor:  1.5"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["adjustments"][0]["attribute"], "bouton_reduction_factor");
    assert_eq!(json["adjustments"][0]["nodes_updated"], 3);
}

#[test]
fn test_adjust_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let input = write_recipe(&dir);
    let existing = dir.path().join("recipe_adjusted.xml");
    fs::write(&existing, "previous").unwrap();

    let output = run(ADJUST, &["-i", &input]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not overwriting"));
    assert_eq!(fs::read_to_string(&existing).unwrap(), "previous");
}

#[test]
fn test_validate_syns_without_reference_exits_2() {
    let dir = TempDir::new().unwrap();
    let circuit = dir.path().join("CircuitConfig");
    fs::write(&circuit, "Run Default\n").unwrap();
    let csv = dir.path().join("syns.csv");

    let output = run(
        VALIDATE_SYNS,
        &[
            &circuit.display().to_string(),
            "mc2_Column",
            &csv.display().to_string(),
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(!csv.exists());
}

#[test]
fn test_validate_bouton_density_missing_tool_exits_1() {
    let dir = TempDir::new().unwrap();
    let circuit = dir.path().join("CircuitConfig");
    fs::write(&circuit, "Run Default\n").unwrap();
    let reference = dir.path().join("bouton_density.tsv");
    fs::write(&reference, "mtype mean std\nL23_PC 0.3 0.05\n").unwrap();
    let config = dir.path().join("calibration.yaml");
    fs::write(&config, "stats_tool:\n  program: surely-not-an-installed-program-s2f\n").unwrap();
    let csv = dir.path().join("boutons.csv");

    let output = run(
        VALIDATE_BOUTONS,
        &[
            &circuit.display().to_string(),
            "mc2_Column",
            &csv.display().to_string(),
            &reference.display().to_string(),
            "--config",
            &config.display().to_string(),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(!csv.exists());
}

#[cfg(unix)]
#[test]
fn test_validate_bouton_density_with_fake_tool() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let circuit = dir.path().join("CircuitConfig");
    fs::write(&circuit, "Run Default\n").unwrap();
    let reference = dir.path().join("bouton_density.tsv");
    fs::write(&reference, "mtype mean std\nL23_PC 0.3 0.05\nL4_SS 0.6 0.05\n").unwrap();

    let tool = dir.path().join("connectome-stats");
    fs::write(
        &tool,
        "#!/bin/sh\nprintf 'mtype mean std\\nL23_PC 0.2 0.05\\nL4_SS 0.4 0.05\\n'\n",
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let config = dir.path().join("calibration.yaml");
    fs::write(&config, format!("stats_tool:\n  program: {}\n", tool.display())).unwrap();
    let csv = dir.path().join("boutons.csv");

    let output = run(
        VALIDATE_BOUTONS,
        &[
            &circuit.display().to_string(),
            "mc2_Column",
            &csv.display().to_string(),
            &reference.display().to_string(),
            "--config",
            &config.display().to_string(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records = s2f_core::validation::read_validation_table(&csv).unwrap();
    assert_eq!(records.len(), 2);
    assert!((records[0].error.unwrap() + 200.0).abs() < 1e-9);
}
