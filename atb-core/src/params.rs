//! Positional algorithm parameters
//!
//! Trust models are configured with an ordered list of values. Each model
//! reads its positions through typed accessors that validate the value
//! against a named [`Condition`]; a violation reports the position, the
//! constraint and the offending value.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{:.2}", x),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamError {
    #[error("Parameter {position} is missing")]
    Missing { position: usize },

    #[error("Parameter {position} {constraint}, but was {value}")]
    Violated {
        position: usize,
        constraint: &'static str,
        value: String,
    },

    #[error("Parameter {position} must be {expected}, but was {value}")]
    WrongType {
        position: usize,
        expected: &'static str,
        value: String,
    },

    #[error("Expected at least {expected} parameters, but got {actual}")]
    TooFew { expected: usize, actual: usize },
}

/// Named predicate a parameter value must satisfy
#[derive(Clone, Copy)]
pub struct Condition<T> {
    description: &'static str,
    check: fn(T) -> bool,
}

impl<T: Copy> Condition<T> {
    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn holds(&self, value: T) -> bool {
        (self.check)(value)
    }
}

impl<T> fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description)
    }
}

fn in_unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

fn non_negative(v: f64) -> bool {
    v >= 0.0
}

fn positive_int(v: i64) -> bool {
    v >= 1
}

fn non_negative_int(v: i64) -> bool {
    v >= 0
}

/// Value in [0, 1]
pub const UNIT_INTERVAL: Condition<f64> = Condition {
    description: "must be between 0 and 1 inclusively",
    check: in_unit_interval,
};

/// Value ≥ 0
pub const NON_NEGATIVE: Condition<f64> = Condition {
    description: "must be non-negative",
    check: non_negative,
};

/// Integer ≥ 1
pub const AT_LEAST_ONE: Condition<i64> = Condition {
    description: "must be at least 1",
    check: positive_int,
};

/// Integer ≥ 0
pub const NON_NEGATIVE_INT: Condition<i64> = Condition {
    description: "must be non-negative",
    check: non_negative_int,
};

/// Ordered list of parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Vec<ParamValue>);

impl Params {
    pub fn new(values: Vec<ParamValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[ParamValue] {
        &self.0
    }

    fn at(&self, position: usize) -> Result<ParamValue, ParamError> {
        self.0
            .get(position)
            .copied()
            .ok_or(ParamError::Missing { position })
    }

    /// Read a float; integers are accepted and widened
    pub fn float(&self, position: usize, condition: Condition<f64>) -> Result<f64, ParamError> {
        let value = match self.at(position)? {
            ParamValue::Float(x) => x,
            ParamValue::Int(i) => i as f64,
            other => {
                return Err(ParamError::WrongType {
                    position,
                    expected: "a number",
                    value: other.to_string(),
                })
            }
        };

        if !condition.holds(value) {
            return Err(ParamError::Violated {
                position,
                constraint: condition.description(),
                value: format!("{:.2}", value),
            });
        }
        Ok(value)
    }

    /// Read an integer
    pub fn int(&self, position: usize, condition: Condition<i64>) -> Result<i64, ParamError> {
        let value = match self.at(position)? {
            ParamValue::Int(i) => i,
            other => {
                return Err(ParamError::WrongType {
                    position,
                    expected: "an integer",
                    value: other.to_string(),
                })
            }
        };

        if !condition.holds(value) {
            return Err(ParamError::Violated {
                position,
                constraint: condition.description(),
                value: value.to_string(),
            });
        }
        Ok(value)
    }

    /// Read a boolean flag
    pub fn flag(&self, position: usize) -> Result<bool, ParamError> {
        match self.at(position)? {
            ParamValue::Bool(b) => Ok(b),
            other => Err(ParamError::WrongType {
                position,
                expected: "a boolean",
                value: other.to_string(),
            }),
        }
    }

    /// Split off the last `count` values
    ///
    /// Decision-making wrappers append their own settings after the wrapped
    /// model's parameters; this hands each side its own list.
    pub fn split_tail(&self, count: usize) -> Result<(Params, Params), ParamError> {
        if self.0.len() < count {
            return Err(ParamError::TooFew {
                expected: count,
                actual: self.0.len(),
            });
        }
        let at = self.0.len() - count;
        Ok((Params(self.0[..at].to_vec()), Params(self.0[at..].to_vec())))
    }
}

impl From<Vec<ParamValue>> for Params {
    fn from(values: Vec<ParamValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<ParamValue> for Params {
    fn from_iter<I: IntoIterator<Item = ParamValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build [`Params`] from a list of literals
///
/// ```
/// use atb_core::params;
/// let p = params![0.5, 0.5, 10, 0.1];
/// assert_eq!(p.len(), 4);
/// ```
#[macro_export]
macro_rules! params {
    ($($value:expr),* $(,)?) => {
        $crate::Params::new(vec![$($crate::ParamValue::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_validation() {
        let p = params![0.5, 1.5];
        assert_eq!(p.float(0, UNIT_INTERVAL), Ok(0.5));

        let err = p.float(1, UNIT_INTERVAL).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter 1 must be between 0 and 1 inclusively, but was 1.50"
        );
    }

    #[test]
    fn test_int_validation() {
        let p = params![10, 0, 0.5];
        assert_eq!(p.int(0, AT_LEAST_ONE), Ok(10));
        assert!(matches!(
            p.int(1, AT_LEAST_ONE),
            Err(ParamError::Violated { position: 1, .. })
        ));
        assert!(matches!(
            p.int(2, AT_LEAST_ONE),
            Err(ParamError::WrongType { position: 2, .. })
        ));
        // integers widen to floats
        assert_eq!(p.float(1, UNIT_INTERVAL), Ok(0.0));
    }

    #[test]
    fn test_missing_position() {
        let p = params![0.5];
        assert_eq!(p.float(3, UNIT_INTERVAL), Err(ParamError::Missing { position: 3 }));
    }

    #[test]
    fn test_flag() {
        let p = params![true, 1];
        assert_eq!(p.flag(0), Ok(true));
        assert!(p.flag(1).is_err());
    }

    #[test]
    fn test_split_tail() {
        let p = params![0.5, 0.5, 10, 0.1, true, 0.2];
        let (head, tail) = p.split_tail(2).unwrap();
        assert_eq!(head.len(), 4);
        assert_eq!(tail, params![true, 0.2]);

        assert!(matches!(
            params![1].split_tail(2),
            Err(ParamError::TooFew { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_deserialize_untagged() {
        let p: Params = serde_json::from_str("[0.5, 10, true]").unwrap();
        assert_eq!(p, params![0.5, 10, true]);
    }
}
