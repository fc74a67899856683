use thiserror::Error;

/// Errors raised while walking a schema. These indicate malformed model metadata
/// and are never recovered inside the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid ref: '{target}' does not match any key in the schema definitions")]
    InvalidReference { target: String },

    #[error("Reference '{target}' points back to itself through a chain of definitions")]
    ReferenceCycle { target: String },

    #[error("Field '{path}' declares pattern '{pattern}' which is not a valid regular expression: {message}")]
    InvalidPattern {
        path: String,
        pattern: String,
        message: String,
    },
}

/// Errors that can occur when converting raw JSON metadata into a `SchemaNode`.
#[derive(Error, Debug, Clone)]
pub enum SchemaConversionError {
    #[error("'allOf' must list at least one schema")]
    EmptyComposition,

    #[error("'items' tuple must list at least one schema")]
    EmptyTuple,
}

/// Errors produced while compiling or evaluating a transform expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Undefined symbol '{0}'")]
    UnknownVariable(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{name}' expects {expected} argument(s), but received {found}")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Index {index} is out of range for '{path}' (size {size})")]
    IndexOutOfRange {
        path: String,
        index: String,
        size: usize,
    },

    #[error("Cannot read property '{property}' of '{path}'")]
    NotAnObject { path: String, property: String },

    #[error("Cannot index '{path}': it is not a list")]
    NotAList { path: String },

    #[error("Operation '{operation}' is not defined for {operand}")]
    InvalidOperand { operation: String, operand: String },
}

/// Errors raised by the gateway transport.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway responded to '{url}' with status {status}")]
    Status { url: String, status: u16 },

    #[error("Could not decode gateway response from '{url}': {message}")]
    Decode { url: String, message: String },

    #[error("Invalid gateway URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors surfaced by the model run orchestrator.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Run #{generation} was superseded by run #{current} before its response arrived")]
    Superseded { generation: u64, current: u64 },
}

/// Errors raised while loading the model catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No models are available")]
    NotFound,

    #[error("Failed to read catalog file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse model metadata: {0}")]
    JsonParseError(String),
}

/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Environment variable '{name}' has invalid value '{value}': {message}")]
    InvalidValue {
        name: String,
        value: String,
        message: String,
    },
}

/// Errors surfaced while submitting a model session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
