mod error;
mod logging;
mod probability;
mod simulation;
mod types;

pub use error::SimError;
pub use logging::{install_console_logging, LineSink, LineWriter};
pub use probability::{binomial_pmf, n_choose_k, success_probability};
pub use simulation::{
    simulate, simulate_with_source, AttemptOutcome, CompensatedSum, RandomSource, RngSource,
    SampleRun, Simulation,
};
pub use types::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    install_console_logging();
}

/// WASM-exposed simulation wrapper
#[wasm_bindgen]
pub struct SimulationEngine {
    sim: Simulation,
}

#[wasm_bindgen]
impl SimulationEngine {
    /// Create a new simulation with the baseline config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<SimulationEngine, JsValue> {
        let sim = Simulation::new(UnlockConfig::default(), seed).map_err(to_js)?;
        Ok(SimulationEngine { sim })
    }

    /// Create with custom config (omitted fields use the baseline)
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<SimulationEngine, JsValue> {
        let config = parse_config(config_json, "Config").map_err(|e| JsValue::from_str(&e))?;
        let sim = Simulation::new(config, seed).map_err(to_js)?;
        Ok(SimulationEngine { sim })
    }

    /// Run all samples, returning the average matches to unlock
    pub fn run(&mut self) -> Result<f64, JsValue> {
        self.sim.run().map_err(to_js)
    }

    /// Per-match, per-friend chance of seeing Cho'gall
    pub fn success_chance(&self) -> f64 {
        self.sim.chance()
    }

    /// Get statistics of the last run as JSON
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.sim.stats).unwrap_or_default()
    }

    /// Get current config as JSON
    pub fn get_config(&self) -> String {
        serde_json::to_string(&self.sim.config).unwrap_or_default()
    }

    /// Replace the config, keeping the seed
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = parse_config(config_json, "Config").map_err(|e| JsValue::from_str(&e))?;
        self.sim = Simulation::new(config, self.sim.seed()).map_err(to_js)?;
        Ok(())
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&UnlockConfig::default()).unwrap_or_default()
    }
}

/// Run a parameter sweep experiment
#[wasm_bindgen]
pub fn run_experiment(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    seed: u64,
) -> Result<String, JsValue> {
    experiment_json(base_config_json, parameter, values_json, seed)
        .map_err(|e| JsValue::from_str(&e))
}

/// Compare two configs
#[wasm_bindgen]
pub fn compare_configs(config_a_json: &str, config_b_json: &str, seed: u64) -> Result<String, JsValue> {
    comparison_json(config_a_json, config_b_json, seed).map_err(|e| JsValue::from_str(&e))
}

/// Run the four reference scenarios with a shared sample count
#[wasm_bindgen]
pub fn run_reference_scenarios(num_samples: usize, seed: u64) -> Result<String, JsValue> {
    scenarios_json(num_samples, seed).map_err(|e| JsValue::from_str(&e))
}

fn to_js(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_config(json: &str, what: &str) -> Result<UnlockConfig, String> {
    serde_json::from_str(json).map_err(|e| format!("{} parse error: {}", what, e))
}

fn run_config(config: UnlockConfig, seed: u64) -> Result<Simulation, String> {
    let mut sim = Simulation::new(config, seed).map_err(|e| e.to_string())?;
    sim.run().map_err(|e| e.to_string())?;
    Ok(sim)
}

fn experiment_json(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    seed: u64,
) -> Result<String, String> {
    let base_config = parse_config(base_config_json, "Config")?;
    let values: Vec<f64> = serde_json::from_str(values_json)
        .map_err(|e| format!("Values parse error: {}", e))?;
    let parameter = SweepParameter::from_name(parameter)
        .ok_or_else(|| format!("Unknown parameter: {}", parameter))?;

    let mut results = Vec::new();

    for (i, &value) in values.iter().enumerate() {
        let config = parameter.apply(&base_config, value).map_err(|e| e.to_string())?;
        let sim = run_config(config, seed + i as u64)?;

        results.push(serde_json::json!({
            "parameter_value": value,
            "avg_attempts": sim.stats.avg_attempts,
            "attempts_p50": sim.stats.attempts_p50,
            "attempts_p90": sim.stats.attempts_p90,
            "success_chance": sim.chance(),
        }));
    }

    serde_json::to_string(&results).map_err(|e| format!("Serialization error: {}", e))
}

fn comparison_json(config_a_json: &str, config_b_json: &str, seed: u64) -> Result<String, String> {
    let config_a = parse_config(config_a_json, "Config A")?;
    let config_b = parse_config(config_b_json, "Config B")?;

    let sim_a = run_config(config_a, seed)?;
    let sim_b = run_config(config_b, seed)?;

    let comparison = serde_json::json!({
        "config_a": {
            "config": sim_a.config,
            "stats": sim_a.stats,
        },
        "config_b": {
            "config": sim_b.config,
            "stats": sim_b.stats,
        }
    });

    serde_json::to_string(&comparison).map_err(|e| format!("Serialization error: {}", e))
}

fn reference_scenarios(num_samples: usize, seed: u64) -> Result<Vec<ScenarioResult>, String> {
    let scenarios = [
        ("1 game to unlock, queuing separately", UnlockConfig::baseline()),
        ("1 game to unlock, queuing together", UnlockConfig::queued_together()),
        ("100 games to unlock, queuing separately", UnlockConfig::high_threshold()),
        (
            "100 games to unlock, queuing together",
            UnlockConfig::high_threshold_queued_together(),
        ),
    ];

    scenarios
        .into_iter()
        .map(|(label, config)| -> Result<ScenarioResult, String> {
            let sim = run_config(config.with_num_samples(num_samples), seed)?;
            Ok(ScenarioResult {
                label: label.to_string(),
                avg_attempts: sim.stats.avg_attempts,
                config: sim.config,
            })
        })
        .collect()
}

fn scenarios_json(num_samples: usize, seed: u64) -> Result<String, String> {
    let results = reference_scenarios(num_samples, seed)?;
    serde_json::to_string(&results).map_err(|e| format!("Serialization error: {}", e))
}
