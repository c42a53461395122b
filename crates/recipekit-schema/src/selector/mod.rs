//! Line selectors: `content  [condition]` suffixes evaluated per target platform.

mod evaluator;
mod parser;

pub use evaluator::{evaluate, Value};
pub use parser::{parse_condition, CmpOp, Expr, MAX_NESTING};

use crate::namespace::Namespace;
use thiserror::Error;

/// Failure to parse or evaluate a single condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("invalid condition at position {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("'{op}' not supported between {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
}

/// A selector failure, located by line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("selector on line {line} [{condition}]: {source}")]
pub struct SelectorError {
    pub line: usize,
    pub condition: String,
    #[source]
    pub source: ExprError,
}

/// Split a right-trimmed line into `(content, condition)` if it ends with a selector.
///
/// The selector is the last `[...]` group and must close the line. Lines whose final
/// group is blank, nested, or unbalanced, or that have no content before it, are not
/// selectors.
pub fn split_selector(line: &str) -> Option<(&str, &str)> {
    let body = line.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let condition = &body[open + 1..];
    if condition.contains(']') || condition.trim().is_empty() {
        return None;
    }
    let content = body[..open].trim_end();
    if content.trim_start().is_empty() {
        return None;
    }
    Some((content, condition))
}

/// Filter manifest text through its line selectors.
///
/// Lines with a true selector keep their content without the suffix, lines with a
/// false selector are dropped, other lines pass through right-trimmed. The result
/// always ends with a single newline.
pub fn select_lines(text: &str, ns: &Namespace) -> Result<String, SelectorError> {
    let mut out = String::with_capacity(text.len() + 1);
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        let kept = match split_selector(line) {
            Some((content, condition)) => {
                let locate = |source| SelectorError {
                    line: idx + 1,
                    condition: condition.to_owned(),
                    source,
                };
                let expr = parse_condition(condition).map_err(locate)?;
                let selected = evaluate(&expr, ns).map_err(locate)?.is_truthy();
                selected.then_some(content)
            }
            None => Some(line),
        };
        if let Some(kept) = kept {
            out.push_str(kept);
            out.push('\n');
        }
    }
    if out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}
