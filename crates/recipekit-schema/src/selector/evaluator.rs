//! Selector condition evaluator.
//!
//! Evaluation is side-effect free and only reads the [`Namespace`].

use super::parser::{CmpOp, Expr};
use super::ExprError;
use crate::namespace::{Namespace, NsValue};
use std::cmp::Ordering;

/// Runtime value of a condition sub-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Booleans participate in arithmetic comparisons as 0 and 1.
    fn as_number(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            Self::Str(_) | Self::Tuple(_) => None,
        }
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn ordering(&self, other: &Value, op: CmpOp) -> Result<Ordering, ExprError> {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::Tuple(a), Self::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.loose_eq(y) {
                        return x.ordering(y, op);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => Err(self.mismatch(other, op)),
            },
        }
    }

    fn mismatch(&self, other: &Value, op: CmpOp) -> ExprError {
        ExprError::TypeMismatch {
            op: op.symbol(),
            left: self.type_name(),
            right: other.type_name(),
        }
    }
}

impl From<NsValue> for Value {
    fn from(value: NsValue) -> Self {
        match value {
            NsValue::Bool(b) => Self::Bool(b),
            NsValue::Int(i) => Self::Int(i),
        }
    }
}

/// Evaluate a parsed condition against the namespace.
///
/// Every identifier is checked up front, so an unknown name fails even when
/// short-circuiting would never reach it.
pub fn evaluate(expr: &Expr, ns: &Namespace) -> Result<Value, ExprError> {
    if let Some(unknown) = expr.names().into_iter().find(|n| !ns.contains(n)) {
        return Err(ExprError::UnknownName(unknown.to_owned()));
    }
    eval(expr, ns)
}

fn eval(expr: &Expr, ns: &Namespace) -> Result<Value, ExprError> {
    match expr {
        Expr::Name(name) => ns
            .get(name)
            .map(Value::from)
            .ok_or_else(|| ExprError::UnknownName(name.clone())),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Tuple(items) => items
            .iter()
            .map(|e| eval(e, ns))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, ns)?.is_truthy())),
        Expr::And(operands) => short_circuit(operands, ns, false),
        Expr::Or(operands) => short_circuit(operands, ns, true),
        Expr::Compare { first, rest } => {
            let mut left = eval(first, ns)?;
            for (op, rhs) in rest {
                let right = eval(rhs, ns)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
    }
}

/// Value of the first operand whose truthiness equals `stop_on`, else the last one.
fn short_circuit(operands: &[Expr], ns: &Namespace, stop_on: bool) -> Result<Value, ExprError> {
    let mut last = Value::Bool(!stop_on);
    for operand in operands {
        last = eval(operand, ns)?;
        if last.is_truthy() == stop_on {
            break;
        }
    }
    Ok(last)
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => Ok(left.loose_eq(right)),
        CmpOp::NotEq => Ok(!left.loose_eq(right)),
        CmpOp::Lt => Ok(left.ordering(right, op)? == Ordering::Less),
        CmpOp::LtE => Ok(left.ordering(right, op)? != Ordering::Greater),
        CmpOp::Gt => Ok(left.ordering(right, op)? == Ordering::Greater),
        CmpOp::GtE => Ok(left.ordering(right, op)? != Ordering::Less),
        CmpOp::In => contains(left, right, op),
        CmpOp::NotIn => contains(left, right, op).map(|found| !found),
    }
}

fn contains(needle: &Value, haystack: &Value, op: CmpOp) -> Result<bool, ExprError> {
    match (needle, haystack) {
        (_, Value::Tuple(items)) => Ok(items.iter().any(|item| needle.loose_eq(item))),
        (Value::Str(n), Value::Str(h)) => Ok(h.contains(n.as_str())),
        _ => Err(needle.mismatch(haystack, op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parser::parse_condition;

    fn eval_str(cond: &str, ns: &Namespace) -> Result<bool, ExprError> {
        let expr = parse_condition(cond)?;
        evaluate(&expr, ns).map(|v| v.is_truthy())
    }

    fn linux_py27() -> Namespace {
        Namespace::new("linux-64", 27, 19)
    }

    #[test]
    fn evaluates_boolean_facts() {
        let ns = linux_py27();
        assert!(eval_str("linux64", &ns).unwrap());
        assert!(!eval_str("win", &ns).unwrap());
        assert!(eval_str("not win", &ns).unwrap());
        assert!(eval_str("linux64 and py==27", &ns).unwrap());
        assert!(eval_str("win or unix", &ns).unwrap());
    }

    #[test]
    fn integer_comparisons() {
        let ns = linux_py27();
        assert!(eval_str("py >= 27", &ns).unwrap());
        assert!(!eval_str("py > 27", &ns).unwrap());
        assert!(eval_str("np != 17", &ns).unwrap());
        assert!(eval_str("20 <= py < 30", &ns).unwrap());
        assert!(!eval_str("30 <= py < 40", &ns).unwrap());
    }

    #[test]
    fn membership_in_tuples_and_strings() {
        let ns = linux_py27();
        assert!(eval_str("py in (26, 27)", &ns).unwrap());
        assert!(!eval_str("py not in (26, 27)", &ns).unwrap());
        assert!(eval_str("'nu' in 'linux'", &ns).unwrap());
    }

    #[test]
    fn booleans_compare_as_integers() {
        let ns = linux_py27();
        assert!(eval_str("linux == 1", &ns).unwrap());
        assert!(eval_str("win == False", &ns).unwrap());
        assert!(eval_str("True > win", &ns).unwrap());
    }

    #[test]
    fn unknown_name_is_an_error_even_when_short_circuited() {
        let ns = linux_py27();
        let err = eval_str("win and nonexistent", &ns).unwrap_err();
        assert!(matches!(err, ExprError::UnknownName(ref n) if n == "nonexistent"));
    }

    #[test]
    fn ordering_string_against_int_is_an_error() {
        let ns = linux_py27();
        let err = eval_str("py < 'x'", &ns).unwrap_err();
        assert!(matches!(
            err,
            ExprError::TypeMismatch {
                left: "int",
                right: "str",
                ..
            }
        ));
    }

    #[test]
    fn mismatched_equality_is_false_not_error() {
        let ns = linux_py27();
        assert!(!eval_str("py == '27'", &ns).unwrap());
        assert!(eval_str("py != '27'", &ns).unwrap());
    }

    #[test]
    fn membership_needs_a_container() {
        let ns = linux_py27();
        assert!(eval_str("py in 27", &ns).is_err());
    }

    #[test]
    fn integer_truthiness() {
        let ns = linux_py27();
        assert!(eval_str("np", &ns).unwrap());
        assert!(!eval_str("0", &ns).unwrap());
        assert!(!eval_str("()", &ns).unwrap());
        assert!(!eval_str("''", &ns).unwrap());
    }

    #[test]
    fn connectives_return_deciding_operand() {
        let ns = linux_py27();
        let or = evaluate(&parse_condition("win or np").unwrap(), &ns).unwrap();
        assert_eq!(or, Value::Int(19));
        let and = evaluate(&parse_condition("linux and py and win").unwrap(), &ns).unwrap();
        assert_eq!(and, Value::Bool(false));
    }

    #[test]
    fn long_chains_evaluate_without_recursion() {
        let ns = linux_py27();
        let chain = vec!["linux"; 10_000].join(" and ");
        assert!(eval_str(&chain, &ns).unwrap());
        let chain = vec!["win"; 10_000].join(" or ");
        assert!(!eval_str(&chain, &ns).unwrap());
    }

    #[test]
    fn tuple_ordering_is_lexicographic() {
        let ns = linux_py27();
        assert!(eval_str("(2, 7) < (3, 0)", &ns).unwrap());
        assert!(eval_str("(2, 7) < (2, 7, 1)", &ns).unwrap());
    }
}
