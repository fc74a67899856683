use super::scope::{Scope, ScopeValue};
use crate::ast::{Expression, Number};
use crate::error::ExpressionError;
use std::cmp::Ordering;
use std::str::FromStr;

const PI: &str = "3.14159265358979323846264338327950288419716939937510582097494459230781640628620899";
const E: &str = "2.71828182845904523536028747135266249775724709369995957496696762772407663035354759";

// Generates the match arm for an arithmetic operator.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $method:ident) => {{
        let left = $self.number($l, $op_str)?;
        let right = $self.number($r, $op_str)?;
        Ok(ScopeValue::Number(left.$method(&right, $self.precision)))
    }};
}

/// The recursive engine evaluating one expression against one scope.
pub(super) struct AstEngine<'a> {
    scope: &'a Scope,
    precision: u64,
}

impl<'a> AstEngine<'a> {
    pub(super) fn new(scope: &'a Scope, precision: u64) -> Self {
        Self { scope, precision }
    }

    /// Evaluates an expression that must produce a single number.
    pub(super) fn evaluate(&self, expr: &Expression) -> Result<Number, ExpressionError> {
        match self.evaluate_recursive(expr)? {
            ScopeValue::Number(n) => Ok(n),
            other => Err(ExpressionError::InvalidOperand {
                operation: "result".to_string(),
                operand: other.describe().to_string(),
            }),
        }
    }

    fn evaluate_recursive(&self, expr: &Expression) -> Result<ScopeValue, ExpressionError> {
        match expr {
            Expression::Sum(l, r) => eval_op!(self, l, r, "+", add),
            Expression::Subtract(l, r) => eval_op!(self, l, r, "-", sub),
            Expression::Multiply(l, r) => eval_op!(self, l, r, "*", mul),
            Expression::Divide(l, r) => eval_op!(self, l, r, "/", div),
            Expression::Modulo(l, r) => eval_op!(self, l, r, "%", rem),
            Expression::Power(l, r) => eval_op!(self, l, r, "^", pow),
            Expression::Negate(v) => Ok(ScopeValue::Number(self.number(v, "-")?.neg())),

            Expression::Member(target, property) => match self.evaluate_recursive(target)? {
                ScopeValue::Record(fields) => match fields.get(property) {
                    Some(ScopeValue::Missing) | None => {
                        Err(ExpressionError::UnknownVariable(format!("{}.{}", target, property)))
                    }
                    Some(value) => Ok(value.clone()),
                },
                _ => Err(ExpressionError::NotAnObject {
                    path: target.to_string(),
                    property: property.clone(),
                }),
            },
            Expression::Index(target, index) => {
                let items = match self.evaluate_recursive(target)? {
                    ScopeValue::List(items) => items,
                    _ => {
                        return Err(ExpressionError::NotAList {
                            path: target.to_string(),
                        });
                    }
                };
                let position = self.number(index, "[]")?;
                let out_of_range = || ExpressionError::IndexOutOfRange {
                    path: target.to_string(),
                    index: position.to_string(),
                    size: items.len(),
                };
                let one_based = position
                    .to_integer()
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i >= 1)
                    .ok_or_else(out_of_range)?;
                match items.get(one_based - 1) {
                    Some(ScopeValue::Missing) | None => Err(out_of_range()),
                    Some(value) => Ok(value.clone()),
                }
            }
            Expression::Call { name, args } => self.call(name, args).map(ScopeValue::Number),

            Expression::Literal(n) => Ok(ScopeValue::Number(n.clone())),
            Expression::Symbol(name) => match self.scope.get(name) {
                Some(ScopeValue::Missing) => Err(ExpressionError::UnknownVariable(name.clone())),
                Some(value) => Ok(value.clone()),
                None => self
                    .constant(name)
                    .map(ScopeValue::Number)
                    .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
            },
        }
    }

    fn number(&self, expr: &Expression, operation: &str) -> Result<Number, ExpressionError> {
        match self.evaluate_recursive(expr)? {
            ScopeValue::Number(n) => Ok(n),
            other => Err(ExpressionError::InvalidOperand {
                operation: operation.to_string(),
                operand: other.describe().to_string(),
            }),
        }
    }

    fn constant(&self, name: &str) -> Option<Number> {
        let digits = match name {
            "pi" | "PI" => PI,
            "e" | "E" => E,
            "Infinity" => return Some(Number::Infinite { negative: false }),
            "NaN" => return Some(Number::NaN),
            _ => return None,
        };
        bigdecimal::BigDecimal::from_str(digits)
            .ok()
            .map(|d| Number::Finite(d.with_prec(self.precision)))
    }

    fn call(&self, name: &str, args: &[Expression]) -> Result<Number, ExpressionError> {
        let p = self.precision;
        match name {
            "abs" => Ok(self.unary_arg(name, args)?.abs()),
            "sqrt" => Ok(self.unary_arg(name, args)?.sqrt(p)),
            "exp" => Ok(self.unary_arg(name, args)?.exp(p)),
            "floor" => Ok(self.unary_arg(name, args)?.floor()),
            "ceil" => Ok(self.unary_arg(name, args)?.ceil()),
            "log10" => Ok(Number::from_f64(self.unary_arg(name, args)?.to_f64().log10())),
            "log" => {
                let values = self.args_in_range(name, args, 1, 2, "1 or 2")?;
                let x = values[0].to_f64();
                Ok(match values.get(1) {
                    Some(base) => Number::from_f64(x.ln() / base.to_f64().ln()),
                    None => Number::from_f64(x.ln()),
                })
            }
            "round" => {
                let values = self.args_in_range(name, args, 1, 2, "1 or 2")?;
                let digits = match values.get(1) {
                    Some(n) => n
                        .to_integer()
                        .filter(|d| (0..=p as i64).contains(d))
                        .ok_or_else(|| ExpressionError::InvalidOperand {
                            operation: "round".to_string(),
                            operand: format!("{} decimals", n),
                        })?,
                    None => 0,
                };
                Ok(values[0].round(digits))
            }
            "pow" => {
                let values = self.args_in_range(name, args, 2, 2, "2")?;
                Ok(values[0].pow(&values[1], p))
            }
            "min" | "max" => {
                let mut values = Vec::new();
                for arg in args {
                    flatten(self.evaluate_recursive(arg)?, name, &mut values)?;
                }
                let wanted = if name == "min" { Ordering::Less } else { Ordering::Greater };
                let mut iter = values.into_iter();
                let first = iter.next().ok_or_else(|| ExpressionError::WrongArity {
                    name: name.to_string(),
                    expected: "at least 1".to_string(),
                    found: 0,
                })?;
                Ok(iter.fold(first, |best, next| {
                    if matches!(best, Number::NaN) || matches!(next, Number::NaN) {
                        Number::NaN
                    } else if next.partial_cmp_value(&best) == Some(wanted) {
                        next
                    } else {
                        best
                    }
                }))
            }
            _ => Err(ExpressionError::UnknownFunction(name.to_string())),
        }
    }

    fn unary_arg(&self, name: &str, args: &[Expression]) -> Result<Number, ExpressionError> {
        let mut values = self.args_in_range(name, args, 1, 1, "1")?;
        Ok(values.remove(0))
    }

    fn args_in_range(
        &self,
        name: &str,
        args: &[Expression],
        min: usize,
        max: usize,
        expected: &str,
    ) -> Result<Vec<Number>, ExpressionError> {
        if args.len() < min || args.len() > max {
            return Err(ExpressionError::WrongArity {
                name: name.to_string(),
                expected: expected.to_string(),
                found: args.len(),
            });
        }
        args.iter().map(|arg| self.number(arg, name)).collect()
    }
}

fn flatten(value: ScopeValue, operation: &str, out: &mut Vec<Number>) -> Result<(), ExpressionError> {
    match value {
        ScopeValue::Number(n) => out.push(n),
        ScopeValue::List(items) => {
            for item in items {
                flatten(item, operation, out)?;
            }
        }
        other => {
            return Err(ExpressionError::InvalidOperand {
                operation: operation.to_string(),
                operand: other.describe().to_string(),
            });
        }
    }
    Ok(())
}
