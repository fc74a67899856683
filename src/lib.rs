//! # Model Runner - Schema-Driven Forms, Runs and Charts
//!
//! **Model Runner** drives gateway-hosted computational models from their
//! published metadata. A model describes its input and output with a small
//! JSON-Schema subset; from that description this crate builds an editable
//! form with defaults and validation, sends the run to the gateway, and turns
//! a successful result into chartable series with optional user-written
//! transform expressions.
//!
//! ## Core Workflow
//!
//! 1.  **Load the catalog**: `Catalog::fetch` lists models from the gateway
//!     (or `Catalog::from_file` reads a saved list).
//! 2.  **Build the form**: `FormState::new` synthesizes initial values and a
//!     validator from the model's input schema; `render_form` produces the
//!     field tree, and array fields are edited with `ArrayAction`s.
//! 3.  **Run**: `ModelRunner::run` posts the validated values together with
//!     the `RunConfig` and yields a `RunOutcome`.
//! 4.  **Chart**: `discover` enumerates the numeric keys of the result and a
//!     `ChartView` plots them, optionally through a `TransformEvaluator`.
//!
//! `ModelSession` bundles steps 2 to 4 for one selected model.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_runner::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run_example() -> Result<()> {
//! let config = Config::from_env()?;
//! let gateway = Arc::new(HttpGateway::from_config(&config)?);
//!
//! let catalog = Catalog::fetch(gateway.as_ref()).await?;
//! let model = catalog.models()[0].clone();
//!
//! let mut session = ModelSession::new(model, gateway, TransformEvaluator::new(config.precision))?;
//! println!("{}", session.fields()?);
//!
//! if let Submission::Completed(RunOutcome::Success(result)) = session.submit().await? {
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod form;
pub mod gateway;
pub mod output;
pub mod path;
pub mod prelude;
pub mod runner;
pub mod schema;
pub mod session;
pub mod trace;
