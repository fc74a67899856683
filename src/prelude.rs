//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load a catalog, fill in a model's form, run
//! it and chart the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use model_runner::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let catalog = Catalog::from_file("path/to/models.json")?;
//! let model = catalog.models()[0].clone();
//!
//! let mut form = FormState::new(model.input.clone())?;
//! form.set_value("address", serde_json::json!("0x00"));
//! println!("{}", render_form(&form)?);
//!
//! let evaluator = TransformEvaluator::default();
//! println!("valid: {}", evaluator.validate("val * 2", &[]));
//! # Ok(())
//! # }
//! ```

// Schema and form
pub use crate::form::{ArrayAction, Field, FormErrors, FormState, InputKind, render_form};
pub use crate::schema::{ObjectSchema, SchemaNode};

// Expressions
pub use crate::ast::{Expression, Number};
pub use crate::compiler::{CompiledExpression, Compiler};
pub use crate::evaluator::{Scope, TransformEvaluator};

// Output
pub use crate::output::{ChartKey, ChartLine, ChartView, discover};

// Runs
pub use crate::catalog::{Catalog, Selection};
pub use crate::config::Config;
pub use crate::data::ModelMetadata;
pub use crate::gateway::{
    BlockNumber, HttpGateway, ModelGateway, RunError, RunRequest, RunResponse, StackFrame,
};
pub use crate::runner::{ModelRunner, ModelVersion, RunConfig, RunOutcome};
pub use crate::session::{ModelSession, Submission};

// Error types
pub use crate::error::{
    CatalogError, ConfigError, ExpressionError, GatewayError, RunnerError, SchemaError, SessionError,
};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
