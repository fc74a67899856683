use crate::ast::{Expression, Number};

/// Folds constant sub-expressions of a parsed transform.
///
/// Only folds whose result is finite are applied, so `1 / 0` stays a division
/// and is evaluated (to Infinity) at run time.
pub struct AstOptimizer {
    precision: u64,
}

impl AstOptimizer {
    pub fn new(precision: u64) -> Self {
        Self { precision }
    }

    /// Runs folding passes until the tree no longer changes.
    pub fn optimize(&self, expr: Expression) -> Expression {
        let mut current = expr;
        loop {
            let next = self.fold(current.clone());
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn fold(&self, expr: Expression) -> Expression {
        let p = self.precision;
        match expr {
            Expression::Sum(l, r) => self.fold_binary(*l, *r, Expression::Sum, |a, b| a.add(b, p)),
            Expression::Subtract(l, r) => {
                self.fold_binary(*l, *r, Expression::Subtract, |a, b| a.sub(b, p))
            }
            Expression::Multiply(l, r) => {
                self.fold_binary(*l, *r, Expression::Multiply, |a, b| a.mul(b, p))
            }
            Expression::Divide(l, r) => self.fold_binary(*l, *r, Expression::Divide, |a, b| a.div(b, p)),
            Expression::Modulo(l, r) => self.fold_binary(*l, *r, Expression::Modulo, |a, b| a.rem(b, p)),
            Expression::Power(l, r) => self.fold_binary(*l, *r, Expression::Power, |a, b| a.pow(b, p)),
            Expression::Negate(v) => match self.fold(*v) {
                Expression::Literal(n) => Expression::Literal(n.neg()),
                // --x => x
                Expression::Negate(inner) => *inner,
                other => Expression::Negate(Box::new(other)),
            },
            Expression::Member(target, property) => {
                Expression::Member(Box::new(self.fold(*target)), property)
            }
            Expression::Index(target, index) => {
                Expression::Index(Box::new(self.fold(*target)), Box::new(self.fold(*index)))
            }
            Expression::Call { name, args } => Expression::Call {
                name,
                args: args.into_iter().map(|a| self.fold(a)).collect(),
            },
            leaf @ (Expression::Literal(_) | Expression::Symbol(_)) => leaf,
        }
    }

    fn fold_binary(
        &self,
        l: Expression,
        r: Expression,
        build: fn(Box<Expression>, Box<Expression>) -> Expression,
        op: impl Fn(&Number, &Number) -> Number,
    ) -> Expression {
        let left = self.fold(l);
        let right = self.fold(r);
        if let (Expression::Literal(a), Expression::Literal(b)) = (&left, &right) {
            let folded = op(a, b);
            if folded.is_finite() {
                return Expression::Literal(folded);
            }
        }
        build(Box::new(left), Box::new(right))
    }
}
