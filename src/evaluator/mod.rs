use crate::ast::Number;
use crate::compiler::{CompiledExpression, Compiler, DEFAULT_PRECISION};
use crate::error::ExpressionError;
use crate::output::ChartKey;
use tracing::debug;

mod engine;
pub mod scope;

use engine::AstEngine;
pub use scope::{SELECTED_VALUE, Scope, ScopeValue};

/// Compiles and evaluates transform expressions at a fixed decimal precision.
///
/// An evaluator is an ordinary value owned by whoever displays a chart; there
/// is no shared configuration between instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformEvaluator {
    precision: u64,
}

impl Default for TransformEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl TransformEvaluator {
    /// Creates an evaluator working with `precision` significant digits.
    pub fn new(precision: u64) -> Self {
        Self {
            precision: precision.max(1),
        }
    }

    pub fn precision(&self) -> u64 {
        self.precision
    }

    pub fn compile(&self, text: &str) -> Result<CompiledExpression, ExpressionError> {
        Compiler::builder()
            .with_precision(self.precision)
            .build()
            .compile(text)
    }

    /// Whether `text` compiles and evaluates against a scope where `val` and
    /// every key are zero. Blank text is valid.
    pub fn validate(&self, text: &str, keys: &[ChartKey]) -> bool {
        let outcome = self
            .compile(text)
            .and_then(|compiled| self.evaluate(&compiled, &Scope::trial(keys)));
        if let Err(e) = &outcome {
            debug!(source = text, error = %e, "transform rejected");
        }
        outcome.is_ok()
    }

    /// Evaluates a compiled expression. Blank expressions produce `None`.
    pub fn evaluate(
        &self,
        compiled: &CompiledExpression,
        scope: &Scope,
    ) -> Result<Option<Number>, ExpressionError> {
        match &compiled.root {
            Some(root) => AstEngine::new(scope, self.precision).evaluate(root).map(Some),
            None => Ok(None),
        }
    }

    /// Compiles and evaluates in one step.
    pub fn evaluate_text(&self, text: &str, scope: &Scope) -> Result<Option<Number>, ExpressionError> {
        let compiled = self.compile(text)?;
        self.evaluate(&compiled, scope)
    }
}
