use crate::ast::Expression;
use crate::error::ExpressionError;
use indexmap::IndexSet;
use tracing::debug;

pub mod lexer;
mod optimizer;
pub mod parsing;

use optimizer::AstOptimizer;
use parsing::Parser;

pub const DEFAULT_PRECISION: u64 = 64;

/// A parsed transform, ready for repeated evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub source: String,
    /// `None` when the source text is blank.
    pub root: Option<Expression>,
}

impl CompiledExpression {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root symbols the expression reads.
    pub fn symbols(&self) -> IndexSet<String> {
        let mut symbols = IndexSet::new();
        if let Some(root) = &self.root {
            root.collect_symbols(&mut symbols);
        }
        symbols
    }
}

pub struct Compiler {
    precision: u64,
    optimize: bool,
}

pub struct CompilerBuilder {
    precision: u64,
    optimize: bool,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            optimize: true,
        }
    }

    /// Significant digits used when folding constants.
    pub fn with_precision(mut self, precision: u64) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_optimization(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            precision: self.precision,
            optimize: self.optimize,
        }
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn compile(&self, text: &str) -> Result<CompiledExpression, ExpressionError> {
        let tokens = lexer::tokenize(text)?;
        let parsed = Parser::new(tokens).parse()?;
        let root = match parsed {
            Some(expr) if self.optimize => Some(AstOptimizer::new(self.precision).optimize(expr)),
            other => other,
        };
        if let Some(root) = &root {
            debug!(source = text, ast = %root, "compiled transform");
        }
        Ok(CompiledExpression {
            source: text.to_string(),
            root,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::builder().build()
    }
}
