use bigdecimal::{BigDecimal, FromPrimitive, One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest decimal exponent a finite value keeps. Larger results overflow to
/// an infinity, smaller ones underflow to zero.
pub const MAX_EXPONENT: i64 = 9_000_000_000_000_000;

// Remainders of operands further apart than this many digits are computed
// at double precision.
const EXACT_REMAINDER_DIGITS: i128 = 100_000;

// Extra digits carried while squaring in `exp`.
const GUARD_DIGITS: u64 = 20;

/// Arbitrary-precision number used by the transform engine.
///
/// Finite values are exact decimals rounded to the evaluator's precision after
/// every operation. Division by zero produces an infinity (or NaN for `0 / 0`)
/// instead of an error; arithmetic touching a non-finite operand is carried
/// out at double precision.
#[derive(Debug, Clone)]
pub enum Number {
    Finite(BigDecimal),
    Infinite { negative: bool },
    NaN,
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Finite(a), Number::Finite(b)) => compare_decimals(a, b) == Ordering::Equal,
            (Number::Infinite { negative: a }, Number::Infinite { negative: b }) => a == b,
            (Number::NaN, Number::NaN) => true,
            _ => false,
        }
    }
}

impl Number {
    pub fn zero() -> Self {
        Number::Finite(BigDecimal::zero())
    }

    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        match trimmed {
            "Infinity" | "+Infinity" => Some(Number::Infinite { negative: false }),
            "-Infinity" => Some(Number::Infinite { negative: true }),
            "NaN" => Some(Number::NaN),
            _ if trimmed.starts_with('.') => BigDecimal::from_str(&format!("0{}", trimmed))
                .ok()
                .map(Number::bounded),
            _ => BigDecimal::from_str(trimmed).ok().map(Number::bounded),
        }
    }

    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value.is_infinite() {
            Number::Infinite {
                negative: value < 0.0,
            }
        } else {
            BigDecimal::from_f64(value)
                .map(Number::Finite)
                .unwrap_or(Number::NaN)
        }
    }

    /// Wraps a decimal, overflowing or underflowing it past `MAX_EXPONENT`.
    fn bounded(d: BigDecimal) -> Number {
        if d.is_zero() {
            return Number::Finite(d);
        }
        let m = magnitude(&d);
        if m > MAX_EXPONENT as i128 {
            Number::Infinite {
                negative: d.is_negative(),
            }
        } else if m < -(MAX_EXPONENT as i128) {
            Number::zero()
        } else {
            Number::Finite(d)
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Finite(d) if d.is_zero() => 0.0,
            Number::Finite(d) => {
                let m = magnitude(d);
                if m > 400 {
                    if d.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY }
                } else if m < -400 {
                    0.0
                } else {
                    d.to_f64().unwrap_or(f64::NAN)
                }
            }
            Number::Infinite { negative: true } => f64::NEG_INFINITY,
            Number::Infinite { negative: false } => f64::INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    /// The value as an `i64` when it is a whole number in range.
    pub fn to_integer(&self) -> Option<i64> {
        let Number::Finite(d) = self else {
            return None;
        };
        if d.is_zero() {
            return Some(0);
        }
        // Fractions below one and anything wider than an i64 are rejected
        // before touching the digits.
        if !(1..=19).contains(&magnitude(d)) || !d.is_integer() {
            return None;
        }
        d.to_i64()
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Number::Finite(_))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Finite(d) => d.is_negative(),
            Number::Infinite { negative } => *negative,
            Number::NaN => false,
        }
    }

    pub fn add(&self, rhs: &Number, precision: u64) -> Number {
        match (self, rhs) {
            (Number::Finite(a), Number::Finite(b)) => Number::bounded(add_decimals(a, b, precision)),
            _ => Number::from_f64(self.to_f64() + rhs.to_f64()),
        }
    }

    pub fn sub(&self, rhs: &Number, precision: u64) -> Number {
        match (self, rhs) {
            (Number::Finite(a), Number::Finite(b)) => Number::bounded(add_decimals(a, &-b, precision)),
            _ => Number::from_f64(self.to_f64() - rhs.to_f64()),
        }
    }

    pub fn mul(&self, rhs: &Number, precision: u64) -> Number {
        match (self, rhs) {
            (Number::Finite(a), Number::Finite(b)) => Number::bounded((a * b).with_prec(precision)),
            _ => Number::from_f64(self.to_f64() * rhs.to_f64()),
        }
    }

    pub fn div(&self, rhs: &Number, precision: u64) -> Number {
        match (self, rhs) {
            (Number::Finite(a), Number::Finite(b)) if b.is_zero() => {
                if a.is_zero() {
                    Number::NaN
                } else {
                    Number::Infinite {
                        negative: a.is_negative(),
                    }
                }
            }
            (Number::Finite(a), Number::Finite(b)) => Number::bounded((a / b).with_prec(precision)),
            _ => Number::from_f64(self.to_f64() / rhs.to_f64()),
        }
    }

    /// Modulo with the sign of the divisor; `x mod 0` is `x`.
    pub fn rem(&self, rhs: &Number, precision: u64) -> Number {
        match (self, rhs) {
            (Number::Finite(_), Number::Finite(b)) if b.is_zero() => self.clone(),
            (Number::Finite(a), Number::Finite(_)) if a.is_zero() => Number::zero(),
            (Number::Finite(a), Number::Finite(b))
                if magnitude(a) - magnitude(b) <= EXACT_REMAINDER_DIGITS =>
            {
                let r = if magnitude(a) < magnitude(b) { a.clone() } else { a % b };
                if !r.is_zero() && r.is_negative() != b.is_negative() {
                    Number::bounded(add_decimals(&r, b, precision))
                } else {
                    Number::bounded(r.with_prec(precision))
                }
            }
            _ => {
                let (a, b) = (self.to_f64(), rhs.to_f64());
                Number::from_f64(a - b * (a / b).floor())
            }
        }
    }

    pub fn pow(&self, rhs: &Number, precision: u64) -> Number {
        if let (Number::Finite(base), Some(n)) = (self, rhs.to_integer()) {
            return integer_power(base, n, precision);
        }
        Number::from_f64(self.to_f64().powf(rhs.to_f64()))
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Finite(d) => Number::Finite(-d),
            Number::Infinite { negative } => Number::Infinite {
                negative: !negative,
            },
            Number::NaN => Number::NaN,
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Finite(d) => Number::Finite(d.abs()),
            Number::Infinite { .. } => Number::Infinite { negative: false },
            Number::NaN => Number::NaN,
        }
    }

    /// Largest integer not greater than the value.
    pub fn floor(&self) -> Number {
        match self {
            Number::Finite(d) if d.is_zero() || scale(d) <= 0 => self.clone(),
            Number::Finite(d) if magnitude(d) <= 0 => {
                if d.is_negative() {
                    Number::Finite(-BigDecimal::one())
                } else {
                    Number::zero()
                }
            }
            Number::Finite(d) => {
                let truncated = d.with_scale(0);
                if d.is_negative() && &truncated != d {
                    Number::Finite(truncated - BigDecimal::one())
                } else {
                    Number::Finite(truncated)
                }
            }
            other => other.clone(),
        }
    }

    pub fn ceil(&self) -> Number {
        self.neg().floor().neg()
    }

    /// Rounds half away from zero to `digits` decimal places.
    pub fn round(&self, digits: i64) -> Number {
        match self {
            Number::Finite(d) if d.is_zero() || scale(d) <= digits => self.clone(),
            // Below half a unit of the last kept place.
            Number::Finite(d) if magnitude(d) + (digits as i128) < 0 => Number::zero(),
            Number::Finite(d) => {
                let (int, s) = d.abs().as_bigint_and_exponent();
                let shifted = BigDecimal::new(int, s - digits);
                let half = BigDecimal::new(5.into(), 1);
                let (whole, _) = (shifted + half).with_scale(0).as_bigint_and_exponent();
                let rounded = BigDecimal::new(whole, digits);
                Number::Finite(if d.is_negative() { -rounded } else { rounded })
            }
            other => other.clone(),
        }
    }

    pub fn sqrt(&self, precision: u64) -> Number {
        match self {
            Number::Finite(d) if d.is_negative() => Number::NaN,
            Number::Finite(d) if d.is_zero() => Number::zero(),
            Number::Finite(d) => {
                // sqrt(m * 10^2k) = sqrt(m) * 10^k, with m kept near one.
                let k = magnitude(d).div_euclid(2) as i64;
                let (int, s) = d.as_bigint_and_exponent();
                BigDecimal::new(int, s + 2 * k)
                    .sqrt()
                    .map(|root| {
                        let (int, s) = root.as_bigint_and_exponent();
                        Number::bounded(BigDecimal::new(int, s - k).with_prec(precision))
                    })
                    .unwrap_or(Number::NaN)
            }
            Number::Infinite { negative: false } => self.clone(),
            _ => Number::NaN,
        }
    }

    pub fn exp(&self, precision: u64) -> Number {
        match self {
            // e^x leaves the representable range long before |x| reaches 10^17.
            Number::Finite(d) if magnitude(d) > 17 => {
                if d.is_negative() {
                    Number::zero()
                } else {
                    Number::Infinite { negative: false }
                }
            }
            Number::Finite(d) => {
                // e^x = (e^(x / 2^k))^(2^k) with |x / 2^k| <= 1.
                let working = precision + GUARD_DIGITS;
                let halvings = self.to_f64().abs().log2().ceil().max(0.0) as u32;
                let reduced = (d / &BigDecimal::from(1u64 << halvings)).with_prec(working);
                let mut result = reduced.exp().with_prec(working);
                for _ in 0..halvings {
                    result = (&result * &result).with_prec(working);
                    if magnitude(&result).abs() > MAX_EXPONENT as i128 {
                        break;
                    }
                }
                Number::bounded(result.with_prec(precision))
            }
            Number::Infinite { negative: true } => Number::zero(),
            other => other.clone(),
        }
    }

    /// Comparison used by `min` / `max`. NaN compares as unordered.
    pub fn partial_cmp_value(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Finite(a), Number::Finite(b)) => Some(compare_decimals(a, b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

fn scale(d: &BigDecimal) -> i64 {
    d.as_bigint_and_exponent().1
}

/// Decimal exponent of a non-zero value: `10^(m-1) <= |d| < 10^m`.
fn magnitude(d: &BigDecimal) -> i128 {
    d.digits() as i128 - scale(d) as i128
}

fn log10_abs(d: &BigDecimal) -> f64 {
    let (int, scale) = d.as_bigint_and_exponent();
    let digits = int.magnitude().to_string();
    let lead = &digits[..digits.len().min(17)];
    let mantissa: f64 = lead.parse().unwrap_or(1.0);
    mantissa.log10() + (digits.len() - lead.len()) as f64 - scale as f64
}

// Orders by sign and magnitude first, so values far apart are never aligned
// to a common scale.
fn compare_decimals(a: &BigDecimal, b: &BigDecimal) -> Ordering {
    let sign = |d: &BigDecimal| {
        if d.is_zero() {
            0
        } else if d.is_negative() {
            -1
        } else {
            1
        }
    };
    let (sa, sb) = (sign(a), sign(b));
    if sa != sb || sa == 0 {
        return sa.cmp(&sb);
    }
    match magnitude(a).cmp(&magnitude(b)) {
        Ordering::Equal => a.cmp(b),
        by_size if sa > 0 => by_size,
        by_size => by_size.reverse(),
    }
}

// An operand more than `precision` digits below the other cannot change the
// rounded sum and is dropped.
fn add_decimals(a: &BigDecimal, b: &BigDecimal, precision: u64) -> BigDecimal {
    if a.is_zero() {
        return b.with_prec(precision);
    }
    if b.is_zero() {
        return a.with_prec(precision);
    }
    let gap = magnitude(a) - magnitude(b);
    let limit = precision as i128 + 2;
    if gap > limit {
        a.with_prec(precision)
    } else if gap < -limit {
        b.with_prec(precision)
    } else {
        (a + b).with_prec(precision)
    }
}

fn integer_power(base: &BigDecimal, exponent: i64, precision: u64) -> Number {
    let unit = base.is_zero() || (magnitude(base) == 1 && base.abs() == BigDecimal::one());
    if !unit {
        let estimate = log10_abs(base) * exponent as f64;
        if estimate > MAX_EXPONENT as f64 {
            return Number::Infinite {
                negative: base.is_negative() && exponent % 2 != 0,
            };
        }
        if estimate < -(MAX_EXPONENT as f64) {
            return Number::zero();
        }
    }

    let mut result = BigDecimal::one();
    let mut factor = base.clone();
    let mut remaining = exponent.unsigned_abs();
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = (&result * &factor).with_prec(precision);
        }
        remaining >>= 1;
        if remaining > 0 {
            factor = (&factor * &factor).with_prec(precision);
        }
    }
    if exponent < 0 {
        Number::Finite(BigDecimal::one()).div(&Number::Finite(result), precision)
    } else {
        Number::bounded(result)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Finite(d) => write_decimal(f, d),
            Number::Infinite { negative: true } => write!(f, "-Infinity"),
            Number::Infinite { negative: false } => write!(f, "Infinity"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

// Plain notation for exponents in [-7, 21), scientific (`1.5e+21`) outside.
fn write_decimal(f: &mut fmt::Formatter<'_>, d: &BigDecimal) -> fmt::Result {
    if d.is_zero() {
        return write!(f, "0");
    }
    let (int, scale) = d.normalized().as_bigint_and_exponent();
    let sign = if int.is_negative() { "-" } else { "" };
    let digits = int.magnitude().to_string();
    let len = digits.len() as i128;
    let exponent = len - 1 - scale as i128;

    if !(-7..21).contains(&exponent) {
        let (head, tail) = digits.split_at(1);
        let exponent_sign = if exponent < 0 { "-" } else { "+" };
        if tail.is_empty() {
            write!(f, "{}{}e{}{}", sign, head, exponent_sign, exponent.abs())
        } else {
            write!(f, "{}{}.{}e{}{}", sign, head, tail, exponent_sign, exponent.abs())
        }
    } else if scale <= 0 {
        write!(f, "{}{}{}", sign, digits, "0".repeat(scale.unsigned_abs() as usize))
    } else if (scale as i128) < len {
        let (whole, fraction) = digits.split_at((len - scale as i128) as usize);
        write!(f, "{}{}.{}", sign, whole, fraction)
    } else {
        let zeros = "0".repeat((scale as i128 - len) as usize);
        write!(f, "{}0.{}{}", sign, zeros, digits)
    }
}
