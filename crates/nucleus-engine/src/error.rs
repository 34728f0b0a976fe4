//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps one subsystem's error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Kernel configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nucleus_core::ConfigError,
    },

    /// Assembly or the run failed.
    #[error("kernel error: {source}")]
    Kernel {
        /// The underlying kernel error.
        #[from]
        source: nucleus_core::KernelError,
    },

    /// The `demo` section of the configuration file is malformed.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the problem.
        message: String,
    },

    /// The run summary could not be serialized.
    #[error("failed to serialize run summary: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
