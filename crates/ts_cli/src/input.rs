//! File-extension-routed loading of device/config/circuit inputs.
//!
//! Mirrors the original command line's file loop: each positional argument
//! is routed by its extension, `.qasm` always becomes the circuit and
//! `.json` documents are scanned for whichever of `device`/`config`/`circuit`
//! keys they carry. Each of the three inputs is filled at most once, in the
//! order the files are given.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use ts_core::{Circuit, Config, Device};

/// The three inputs a run needs, accumulated from the command line.
#[derive(Default)]
pub struct Inputs {
    pub device: Option<Device>,
    pub config: Option<Config>,
    pub circuit: Option<Circuit>,
}

impl Inputs {
    /// Loads every file in order, filling in whichever of device/config/
    /// circuit each one supplies. Later files never overwrite a value an
    /// earlier file already set.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut inputs = Self::default();
        for path in paths {
            inputs.load_one(path)?;
        }
        Ok(inputs)
    }

    fn load_one(&mut self, path: &Path) -> Result<()> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "qasm" => {
                if self.circuit.is_none() {
                    self.circuit = Some(load_qasm_circuit(path)?);
                }
            }
            "json" => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let root: Value = serde_json::from_str(&text)
                    .with_context(|| format!("parsing {} as JSON", path.display()))?;

                if self.device.is_none() && root.get("device").is_some() {
                    self.device = Some(Device::from_json(&text).map_err(anyhow::Error::from)?);
                }
                if self.config.is_none() && root.get("config").is_some() {
                    self.config = Some(Config::from_json(&text).map_err(anyhow::Error::from)?);
                }
                if self.circuit.is_none() && root.get("circuit").is_some() {
                    self.circuit = Some(Circuit::from_json(&text).map_err(anyhow::Error::from)?);
                }
            }
            other => bail!(
                "file '{}' does not have a .json or .qasm extension (got '{other}')",
                path.display()
            ),
        }
        Ok(())
    }

    /// Checks that all three inputs were found, returning a descriptive
    /// error naming whichever are missing.
    pub fn into_complete(self) -> Result<(Device, Config, Circuit)> {
        let mut missing = Vec::new();
        if self.device.is_none() {
            missing.push("device");
        }
        if self.config.is_none() {
            missing.push("config");
        }
        if self.circuit.is_none() {
            missing.push("circuit");
        }
        if !missing.is_empty() {
            bail!("missing input(s): {}", missing.join(", "));
        }
        Ok((self.device.unwrap(), self.config.unwrap(), self.circuit.unwrap()))
    }
}

fn load_qasm_circuit(path: &Path) -> Result<Circuit> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resolved = ts_qasm::resolve_includes(&text, base).map_err(anyhow::Error::from)?;
    ts_qasm::parse_qasm(&resolved).map_err(anyhow::Error::from)
}
