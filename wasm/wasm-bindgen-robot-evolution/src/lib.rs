use robot_evolution::{Evolution, EvolutionConfig, EvolutionState, Step};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct EvolutionWrapper {
    evolution: Evolution,
}

#[wasm_bindgen]
pub enum State {
    Idle,
    Running,
    Paused,
    Completed,
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl EvolutionWrapper {
    /// `config` may be undefined, or an object with any subset of the config fields.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, config: JsValue) -> Result<EvolutionWrapper, JsValue> {
        console_error_panic_hook::set_once();
        let config = if config.is_undefined() || config.is_null() {
            EvolutionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let evolution = Evolution::new(config, seed).map_err(to_js_error)?;
        Ok(Self { evolution })
    }

    pub fn state(&self) -> State {
        match self.evolution.state() {
            EvolutionState::Idle => State::Idle,
            EvolutionState::Running => State::Running,
            EvolutionState::Paused => State::Paused,
            EvolutionState::Completed => State::Completed,
        }
    }

    pub fn start(&mut self) {
        self.evolution.start();
    }

    pub fn toggle_pause(&mut self) {
        self.evolution.toggle_pause();
    }

    pub fn reset(&mut self) {
        self.evolution.reset();
    }

    /// Run one generation. Returns its snapshot, or null if the loop is not running. Call again
    /// from the next animation frame to keep the page responsive.
    pub fn step(&mut self) -> Result<JsValue, JsValue> {
        match self.evolution.step().map_err(to_js_error)? {
            Step::Advanced(snapshot) => Ok(serde_wasm_bindgen::to_value(&snapshot)?),
            Step::Waiting(_) => Ok(JsValue::NULL),
        }
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.evolution.snapshot())?)
    }

    pub fn grid_size(&self) -> usize {
        self.evolution.config().grid_size
    }

    /// Best-ever trial with its path and grid cells, or null.
    pub fn best(&self) -> Result<JsValue, JsValue> {
        match self.evolution.best() {
            Some(best) => Ok(serde_wasm_bindgen::to_value(best)?),
            None => Ok(JsValue::NULL),
        }
    }

    /// Top trial of the first generation, or null before it has run.
    pub fn first_generation(&self) -> Result<JsValue, JsValue> {
        match self.evolution.first_generation() {
            Some(first) => Ok(serde_wasm_bindgen::to_value(first)?),
            None => Ok(JsValue::NULL),
        }
    }
}
