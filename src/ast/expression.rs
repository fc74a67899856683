use super::Number;
use indexmap::IndexSet;
use std::fmt;

/// The syntax tree of a compiled transform expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Modulo(Box<Expression>, Box<Expression>),
    Power(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),

    // Access
    /// `target.property`
    Member(Box<Expression>, String),
    /// `target[index]`, where `index` counts from 1.
    Index(Box<Expression>, Box<Expression>),
    Call { name: String, args: Vec<Expression> },

    // Leaf nodes
    Literal(Number),
    Symbol(String),
}

impl Expression {
    /// Collects the root symbols the expression reads, in order of first use.
    /// Function names are not included.
    pub fn collect_symbols(&self, symbols: &mut IndexSet<String>) {
        match self {
            Expression::Symbol(name) => {
                symbols.insert(name.clone());
            }
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r)
            | Expression::Modulo(l, r)
            | Expression::Power(l, r)
            | Expression::Index(l, r) => {
                l.collect_symbols(symbols);
                r.collect_symbols(symbols);
            }
            Expression::Negate(v) | Expression::Member(v, _) => v.collect_symbols(symbols),
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_symbols(symbols);
                }
            }
            Expression::Literal(_) => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Sum(..) | Expression::Subtract(..) => 1,
            Expression::Multiply(..) | Expression::Divide(..) | Expression::Modulo(..) => 2,
            Expression::Negate(_) => 3,
            Expression::Power(..) => 4,
            Expression::Literal(n) if n.is_negative() => 3,
            _ => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }

    fn fmt_binary(
        f: &mut fmt::Formatter<'_>,
        op: &str,
        l: &Expression,
        r: &Expression,
        level: u8,
        right_assoc: bool,
    ) -> fmt::Result {
        let (left_min, right_min) = if right_assoc {
            (level + 1, level)
        } else {
            (level, level + 1)
        };
        l.fmt_operand(f, left_min)?;
        write!(f, " {} ", op)?;
        r.fmt_operand(f, right_min)
    }
}

/// Renders the expression back to source form with the minimum parentheses.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Sum(l, r) => Self::fmt_binary(f, "+", l, r, 1, false),
            Expression::Subtract(l, r) => Self::fmt_binary(f, "-", l, r, 1, false),
            Expression::Multiply(l, r) => Self::fmt_binary(f, "*", l, r, 2, false),
            Expression::Divide(l, r) => Self::fmt_binary(f, "/", l, r, 2, false),
            Expression::Modulo(l, r) => Self::fmt_binary(f, "%", l, r, 2, false),
            Expression::Power(l, r) => Self::fmt_binary(f, "^", l, r, 4, true),
            Expression::Negate(v) => {
                write!(f, "-")?;
                v.fmt_operand(f, 3)
            }
            Expression::Member(target, property) => {
                target.fmt_operand(f, 5)?;
                write!(f, ".{}", property)
            }
            Expression::Index(target, index) => {
                target.fmt_operand(f, 5)?;
                write!(f, "[{}]", index)
            }
            Expression::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Literal(n) => write!(f, "{}", n),
            Expression::Symbol(name) => write!(f, "{}", name),
        }
    }
}
