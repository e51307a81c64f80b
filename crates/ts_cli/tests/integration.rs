//! End-to-end tests of the CLI's loading and scheduling harness, exercised
//! through its library surface rather than by spawning the binary.

use std::io::Write;

use ts_cli::{run_with_retries, Inputs};
use ts_core::{Circuit, Config, Device};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

/// Two qubits, one edge, no inter-core links -- matches `device_a` from
/// `ts_core::device::fixtures`.
const DEVICE_A_JSON: &str = r#"{
    "device": {
        "name": "a",
        "num_qubits": 2,
        "num_cores": 1,
        "intra_core_edges": [[0, 1]],
        "inter_core_edges": []
    }
}"#;

/// Two cores of two qubits each, joined by one inter-core edge -- matches
/// `device_c`.
const DEVICE_C_JSON: &str = r#"{
    "device": {
        "name": "c",
        "num_qubits": 4,
        "num_cores": 2,
        "intra_core_edges": [[0, 1], [2, 3]],
        "inter_core_edges": [[1, 2]]
    }
}"#;

#[test]
fn loads_a_device_config_and_qasm_circuit_from_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = write_file(&dir, "device.json", DEVICE_A_JSON);
    let config_path = write_file(&dir, "config.json", r#"{"config": {"seed": 3}}"#);
    let circuit_path = write_file(&dir, "circuit.qasm", "OPENQASM 2.0;\nqreg q[2];\ncx q[0], q[1];\n");

    let inputs = Inputs::load(&[device_path, config_path, circuit_path]).unwrap();
    let (device, config, circuit) = inputs.into_complete().unwrap();
    assert_eq!(device.num_qubits, 2);
    assert_eq!(config.seed, 3);
    assert_eq!(circuit.num_gates(), 1);
}

#[test]
fn a_single_json_bundle_supplies_all_three_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = format!(
        r#"{{"device": {}, "config": {{}}, "circuit": {{"name": "c", "num_qubits": 2, "gates": [[0, 1]]}}}}"#,
        serde_json::from_str::<serde_json::Value>(DEVICE_A_JSON).unwrap()["device"]
    );
    let path = write_file(&dir, "bundle.json", &bundle);

    let inputs = Inputs::load(&[path]).unwrap();
    let (device, _config, circuit) = inputs.into_complete().unwrap();
    assert_eq!(device.num_qubits, 2);
    assert_eq!(circuit.num_gates(), 1);
}

#[test]
fn missing_circuit_file_is_reported_as_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let device_path = write_file(&dir, "device.json", DEVICE_A_JSON);
    let config_path = write_file(&dir, "config.json", r#"{"config": {}}"#);

    let inputs = Inputs::load(&[device_path, config_path]).unwrap();
    let err = inputs.into_complete().unwrap_err();
    assert!(err.to_string().contains("circuit"));
}

#[test]
fn a_trivial_same_core_circuit_schedules_without_any_inter_core_ops() {
    let device = Device::from_json(DEVICE_A_JSON).unwrap();
    let circuit = Circuit::new(
        "c",
        2,
        vec![ts_core::GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }],
    )
    .unwrap();
    let mut config = Config::default();
    config.max_attempts = 1;
    config.required_successes = 1;

    let outcome = run_with_retries(&device, &circuit, &config).unwrap();
    assert!(outcome.result.success);
    assert_eq!(outcome.result.num_teledata, 0);
    assert_eq!(outcome.result.num_telegate, 0);
}

#[test]
fn a_cross_core_gate_needs_at_least_one_inter_core_op_and_the_report_has_one_entry_per_iteration() {
    let device = Device::from_json(DEVICE_C_JSON).unwrap();
    let circuit = Circuit::new(
        "c",
        4,
        vec![ts_core::GateSpec { gate_type: "cx".into(), targets: vec![0, 3] }],
    )
    .unwrap();
    let mut config = Config::default();
    config.max_iterations = 2000;
    config.max_attempts = 1;
    config.required_successes = 1;

    let outcome = run_with_retries(&device, &circuit, &config).unwrap();
    assert!(outcome.result.success);
    assert!(outcome.result.inter_core_op_total() >= 1);
    assert_eq!(outcome.report.iterations.len(), outcome.result.iterations as usize);
}

#[test]
fn save_as_json_round_trips_the_report_to_disk() {
    let device = Device::from_json(DEVICE_A_JSON).unwrap();
    let circuit = Circuit::new(
        "c",
        2,
        vec![ts_core::GateSpec { gate_type: "cx".into(), targets: vec![0, 1] }],
    )
    .unwrap();
    let config = Config::default();

    let outcome = run_with_retries(&device, &circuit, &config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    outcome.report.save_as_json(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"iterations\""));
}
