//! Scheduler configuration.
//!
//! One flat, serializable record of every knob the scheduler loop and the
//! energy evaluator read. Usage penalties are tracked as a single flat
//! value rather than split per primitive, since every op type feeds the
//! same decaying counter.

use serde::{Deserialize, Serialize};

/// Selects which lookahead cost function the energy evaluator uses.
///
/// `Exponential` is accepted as a config value for JSON round-tripping but
/// is currently evaluated identically to `ExtendedSet` — no distinct
/// formula is implemented for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    ExtendedSet,
    Exponential,
}

/// Selects the initial virt-to-phys placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialLayoutType {
    /// Greedy first-fit by core capacity. Not a true assignment solver —
    /// the name is a misnomer kept for compatibility with existing configs.
    Hungarian,
    RoundRobin,
    Random,
}

/// Scheduler configuration: every knob the scheduler loop and CLI expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// RNG seed for initial-layout shuffles and tie-breaking among
    /// equal-energy candidates.
    pub seed: u64,
    pub name: String,

    pub energy_type: EnergyType,

    /// Amount added to `usage_penalties[p]` for every qubit touched by an
    /// applied op or executed gate.
    pub usage_penalty: f32,
    /// Number of iterations between resets of every usage penalty to 1.0.
    pub usage_penalties_reset_interval: u32,

    pub optimize_initial: bool,
    pub initial_layout_type: InitialLayoutType,

    /// Subtracted from a TELEDATA candidate's energy before selection.
    pub teleport_bonus: f32,
    /// Subtracted from a TELEGATE candidate's energy before selection.
    pub telegate_bonus: f32,

    /// Iterations without progress before the safety valve activates.
    pub safety_valve_iters: u32,

    pub extended_set_size: u32,
    pub extended_set_factor: f32,

    /// Distance penalty applied to a contracted-graph edge touching a
    /// core with `remaining_capacity <= 2`.
    pub full_core_penalty: i32,
    pub inter_core_edge_weight: i32,
    pub max_solving_deadlock_iterations: u32,

    pub init_layout_hun_min_free_gate: i32,
    pub init_layout_hun_min_free_qubit: i32,

    pub max_iterations: u32,

    pub save_report: bool,
    pub report_filename: String,

    /// CLI retry-best-of-N harness (spec §7): number of scheduler runs to
    /// attempt, each with `seed` incremented by one, keeping the best
    /// successful result by `teledata + telegate` total.
    pub max_attempts: u32,
    /// Stop retrying once this many attempts have succeeded.
    pub required_successes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            name: "default".to_string(),
            energy_type: EnergyType::ExtendedSet,
            usage_penalty: 0.002,
            usage_penalties_reset_interval: 5,
            optimize_initial: false,
            initial_layout_type: InitialLayoutType::RoundRobin,
            teleport_bonus: 100.0,
            telegate_bonus: 100.0,
            safety_valve_iters: 300,
            extended_set_size: 20,
            extended_set_factor: 0.05,
            full_core_penalty: 10,
            inter_core_edge_weight: 2,
            max_solving_deadlock_iterations: 300,
            init_layout_hun_min_free_gate: 4,
            init_layout_hun_min_free_qubit: 3,
            max_iterations: 1_000_000,
            save_report: true,
            report_filename: "report.json".to_string(),
            max_attempts: 10,
            required_successes: 1,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from the `"config"` key of a JSON document,
    /// falling back to defaults for any field the document omits.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let config_value = root.get("config").cloned().unwrap_or(serde_json::json!({}));
        Self::from_json_value(config_value)
    }

    /// Merges a JSON object's fields into a default config.
    pub fn from_json_value(value: serde_json::Value) -> crate::Result<Self> {
        let mut defaults = serde_json::to_value(Self::default())?;
        if let (Some(defaults_obj), Some(overrides_obj)) = (defaults.as_object_mut(), value.as_object()) {
            for (k, v) in overrides_obj {
                defaults_obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(defaults).map_err(Into::into)
    }

    /// Serializes the config, wrapped under a `"config"` key, to a JSON string.
    pub fn to_json(&self) -> crate::Result<String> {
        let wrapped = serde_json::json!({ "config": self });
        serde_json::to_string_pretty(&wrapped).map_err(Into::into)
    }

    /// Overrides a single field by CLI-style name (`--key value`).
    /// Booleans accept `true|True|1`; `initial_layout_type` accepts
    /// `hungarian|round-robin|random`; `energy_type` accepts
    /// `extended-set|exponential`; everything else parses as the field's
    /// native numeric or string type.
    pub fn apply_override(&mut self, key: &str, value: &str) -> crate::Result<()> {
        let mut as_value = serde_json::to_value(&*self)?;
        let obj = as_value
            .as_object_mut()
            .expect("Config always serializes to a JSON object");

        let normalized = value.replace('-', "_");
        let json_value = match key {
            "initial_layout_type" | "energy_type" => serde_json::Value::String(normalized),
            "optimize_initial" | "save_report" => {
                serde_json::Value::Bool(matches!(value, "true" | "True" | "1"))
            }
            _ => match value.parse::<i64>() {
                Ok(i) => serde_json::Value::from(i),
                Err(_) => match value.parse::<f64>() {
                    Ok(f) => serde_json::Value::from(f),
                    Err(_) => serde_json::Value::String(value.to_string()),
                },
            },
        };

        if !obj.contains_key(key) {
            return Err(crate::TsError::config(format!("unknown config field '{key}'")));
        }
        obj.insert(key.to_string(), json_value);
        *self = serde_json::from_value(as_value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.safety_valve_iters, 300);
        assert_eq!(config.extended_set_size, 20);
        assert_eq!(config.initial_layout_type, InitialLayoutType::RoundRobin);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default();
        let json = config.to_json().unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let parsed = Config::from_json(r#"{"config": {"seed": 7}}"#).unwrap();
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.safety_valve_iters, Config::default().safety_valve_iters);
    }

    #[test]
    fn test_apply_override_bool_and_enum() {
        let mut config = Config::default();
        config.apply_override("optimize_initial", "true").unwrap();
        assert!(config.optimize_initial);
        config.apply_override("initial_layout_type", "round-robin").unwrap();
        assert_eq!(config.initial_layout_type, InitialLayoutType::RoundRobin);
    }

    #[test]
    fn test_apply_override_unknown_field() {
        let mut config = Config::default();
        assert!(config.apply_override("does_not_exist", "1").is_err());
    }

    #[test]
    fn test_retry_harness_defaults() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.required_successes, 1);
    }

    #[test]
    fn test_apply_override_max_attempts() {
        let mut config = Config::default();
        config.apply_override("max_attempts", "3").unwrap();
        assert_eq!(config.max_attempts, 3);
    }
}
