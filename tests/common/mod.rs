#![allow(dead_code)]

use std::sync::Arc;

use charlton::internals::algorithms::factor::{Factor, FactorRef};
use charlton::internals::algorithms::state::{FactorState, StateEntry};
use charlton::internals::algorithms::transforms::TransformRegistry;
use charlton::internals::primitives::chunk::{Chunk, EvalEnv};
use charlton::internals::primitives::errors::ModelError;
use charlton::internals::primitives::value::Value;

/// Factor that records every memorize call in its own state.
///
/// Evaluates to `value` when set, otherwise to the variable bound to its name.
#[derive(Debug, Clone)]
pub struct MockFactor {
    pub name: String,
    pub passes: usize,
    pub value: Option<Value<f64>>,
}

impl MockFactor {
    pub fn new(name: &str, passes: usize) -> Self {
        Self {
            name: name.to_string(),
            passes,
            value: None,
        }
    }

    pub fn with_value(name: &str, value: Value<f64>) -> Self {
        Self {
            name: name.to_string(),
            passes: 0,
            value: Some(value),
        }
    }

    pub fn shared(self) -> FactorRef<f64> {
        Arc::new(self)
    }
}

fn append_log(state: &mut FactorState<f64>, entry: String) {
    match state.get_mut("log") {
        Some(StateEntry::Text(log)) => {
            log.push(' ');
            log.push_str(&entry);
        }
        _ => {
            state.insert("log", StateEntry::Text(entry));
        }
    }
}

/// The call log recorded by a [`MockFactor`], as space-separated events.
pub fn call_log(state: &FactorState<f64>) -> String {
    match state.get("log") {
        Some(StateEntry::Text(log)) => log.clone(),
        _ => String::new(),
    }
}

impl Factor<f64> for MockFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn memorize_passes_needed(
        &self,
        state: &mut FactorState<f64>,
        _registry: &TransformRegistry<f64>,
    ) -> Result<usize, ModelError> {
        state.bump("passes_needed");
        Ok(self.passes)
    }

    fn memorize_chunk(
        &self,
        state: &mut FactorState<f64>,
        which_pass: usize,
        _env: &EvalEnv<'_, f64>,
    ) -> Result<(), ModelError> {
        state.bump(&format!("chunk:{}", which_pass));
        append_log(state, format!("c{}", which_pass));
        Ok(())
    }

    fn memorize_finish(
        &self,
        state: &mut FactorState<f64>,
        which_pass: usize,
    ) -> Result<(), ModelError> {
        state.bump(&format!("finish:{}", which_pass));
        append_log(state, format!("f{}", which_pass));
        Ok(())
    }

    fn eval(&self, _state: &FactorState<f64>, env: &EvalEnv<'_, f64>) -> Result<Value<f64>, ModelError> {
        match &self.value {
            Some(value) => Ok(value.clone()),
            None => env.lookup(&self.name).cloned(),
        }
    }
}

/// Split `chunk` into windows of `size` rows.
pub fn windows(chunk: &Chunk<f64>, size: usize) -> Vec<Chunk<f64>> {
    let n = chunk.nrows().unwrap_or(0);
    (0..n)
        .step_by(size)
        .map(|start| chunk.slice_rows(start, start + size))
        .collect()
}
