use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime settings used when loading a classifier.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 1,
            intra_threads: 1,
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

/// Initializes the process-wide ONNX Runtime environment once.
///
/// A failed initialization is remembered and reported on every later call.
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| {
        ort::init()
            .with_name("symptomatic")
            .commit()
            .map(|_| ())
            .map_err(|e| format!("Failed to initialize ONNX Runtime environment: {}", e))
    })
    .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, crate::DiagnosisError> {
    ensure_initialized().map_err(crate::DiagnosisError::ModelError)?;
    Ok(configure(Session::builder()?, config)?)
}

fn configure(mut builder: SessionBuilder, config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder.with_optimization_level(copy_level(&config.optimization_level))
}
