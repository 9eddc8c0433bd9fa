use crate::compiler::{CompilationResult, TargetLanguage};
use crate::error::BackendError;
use std::collections::BTreeMap;
use std::time::Duration;

/// A native function the runner exposes to compiled code under `name`.
pub type Callback = Box<dyn Fn(&[serde_json::Value]) -> serde_json::Value + Send + Sync>;

/// Everything the sandboxed runner needs to execute one program.
pub struct ExecutionRequest {
    pub code: String,
    pub entrypoint: String,
    /// Runtime callbacks by name. Must cover the compiled program's `arg_names`.
    pub callbacks: BTreeMap<String, Callback>,
    pub timeout: Duration,
    /// Pause per statement for animated runs; `None` runs at full speed.
    pub execution_delay: Option<Duration>,
}

impl ExecutionRequest {
    /// Wraps a compiled program. Callbacks start empty.
    pub fn new(program: CompilationResult, timeout: Duration) -> Self {
        Self {
            code: program.code,
            entrypoint: program.entrypoint,
            callbacks: BTreeMap::new(),
            timeout,
            execution_delay: None,
        }
    }

    pub fn with_callback(mut self, name: &str, callback: Callback) -> Self {
        self.callbacks.insert(name.to_string(), callback);
        self
    }

    pub fn with_execution_delay(mut self, delay: Duration) -> Self {
        self.execution_delay = Some(delay);
        self
    }

    /// Names from `arg_names` that have no callback yet.
    pub fn missing_callbacks(&self, arg_names: &[String]) -> Vec<String> {
        arg_names
            .iter()
            .filter(|name| !self.callbacks.contains_key(*name))
            .cloned()
            .collect()
    }
}

/// What the runner reports back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub output: Vec<String>,
    pub return_value: Option<serde_json::Value>,
    /// Blocks marked as executing, in order.
    pub executed: Vec<String>,
}

/// A sandbox that runs compiled JavaScript.
pub trait ExecutionBackend {
    fn execute(&self, request: ExecutionRequest) -> Result<ExecutionOutcome, BackendError>;
}

/// JavaScript produced from ReasonML source.
#[derive(Debug, Clone, PartialEq)]
pub struct TranspiledProgram {
    pub javascript: String,
    pub source_map: Option<String>,
}

/// The server-side ReasonML to JavaScript service.
pub trait TranspileService {
    fn transpile(&self, source: &str) -> Result<TranspiledProgram, BackendError>;
}

/// Turns a compiled program into runnable JavaScript, going through
/// `service` when the program is ReasonML.
pub fn prepare<S: TranspileService + ?Sized>(
    program: CompilationResult,
    target: TargetLanguage,
    service: &S,
) -> Result<CompilationResult, BackendError> {
    match target {
        TargetLanguage::JavaScript => Ok(program),
        TargetLanguage::ReasonML => {
            let transpiled = service.transpile(&program.code)?;
            tracing::debug!(
                "transpiled {} bytes of ReasonML into {} bytes of JavaScript",
                program.code.len(),
                transpiled.javascript.len()
            );
            Ok(CompilationResult {
                code: transpiled.javascript,
                ..program
            })
        }
    }
}
