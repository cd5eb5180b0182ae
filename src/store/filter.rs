//! # Filter Evaluation
//!
//! Evaluates the store's filter dialect against in-memory documents.
//!
//! Supported:
//! - field equality (`{"field": value}`), including dotted paths
//! - comparison operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`
//! - membership: `$in`, `$nin`
//! - `$exists`
//! - logical: `$and`, `$or`
//! - `$text` with `$search`

use std::cmp::Ordering;

use serde_json::{json, Value};

use super::document::Document;
use super::errors::{StoreError, StoreResult};

/// Field-level filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
}

impl FilterOperator {
    /// Parse an operator key such as `$gte`
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(FilterOperator::Eq),
            "$ne" => Some(FilterOperator::Ne),
            "$gt" => Some(FilterOperator::Gt),
            "$gte" => Some(FilterOperator::Gte),
            "$lt" => Some(FilterOperator::Lt),
            "$lte" => Some(FilterOperator::Lte),
            "$in" => Some(FilterOperator::In),
            "$nin" => Some(FilterOperator::Nin),
            "$exists" => Some(FilterOperator::Exists),
            _ => None,
        }
    }

    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::In => "$in",
            FilterOperator::Nin => "$nin",
            FilterOperator::Exists => "$exists",
        }
    }
}

/// Build the filter used for a full-text search
pub fn text_filter(text: &str) -> Document {
    match json!({"$text": {"$search": text}}) {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Resolve a dotted path inside a document
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Check if a document matches every clause of a filter
pub fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(condition, "$and")? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(condition, "$or")? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$text" => text_matches(doc, condition)?,
            op if op.starts_with('$') => {
                return Err(StoreError::Rejected(format!(
                    "unknown top level operator: {}",
                    op
                )))
            }
            path => field_matches(lookup(doc, path), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(condition: &'a Value, op: &str) -> StoreResult<Vec<&'a Document>> {
    let items = condition
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| StoreError::Rejected(format!("{} must be a nonempty array", op)))?;

    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| StoreError::Rejected(format!("{} entries must be objects", op)))
        })
        .collect()
}

/// Evaluate one field condition: either a literal (equality) or an operator object
fn field_matches(value: Option<&Value>, condition: &Value) -> StoreResult<bool> {
    let ops = match condition {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
        _ => return Ok(eq_matches(value, condition)),
    };

    for (key, operand) in ops {
        let op = FilterOperator::parse(key)
            .ok_or_else(|| StoreError::Rejected(format!("unknown operator: {}", key)))?;
        if !operator_matches(op, value, operand)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn operator_matches(op: FilterOperator, value: Option<&Value>, operand: &Value) -> StoreResult<bool> {
    Ok(match op {
        FilterOperator::Eq => eq_matches(value, operand),
        FilterOperator::Ne => !eq_matches(value, operand),
        FilterOperator::Gt => ordered(value, operand, |o| o == Ordering::Greater),
        FilterOperator::Gte => ordered(value, operand, |o| o != Ordering::Less),
        FilterOperator::Lt => ordered(value, operand, |o| o == Ordering::Less),
        FilterOperator::Lte => ordered(value, operand, |o| o != Ordering::Greater),
        FilterOperator::In => membership(op, operand)?
            .iter()
            .any(|candidate| eq_matches(value, candidate)),
        FilterOperator::Nin => !membership(op, operand)?
            .iter()
            .any(|candidate| eq_matches(value, candidate)),
        FilterOperator::Exists => value.is_some() == is_truthy(operand),
    })
}

fn membership(op: FilterOperator, operand: &Value) -> StoreResult<&Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| StoreError::Rejected(format!("{} needs an array", op.as_str())))
}

/// Equality with array fan-out: an array field matches if any element does
fn eq_matches(value: Option<&Value>, target: &Value) -> bool {
    match value {
        None => target.is_null(),
        Some(Value::Array(items)) if !target.is_array() => {
            items.iter().any(|item| values_equal(item, target))
        }
        Some(v) => values_equal(v, target),
    }
}

/// Comparison operators only match values of the same type class
fn ordered(value: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(Value::Array(items)) if !operand.is_array() => items
            .iter()
            .any(|item| compare_values(item, operand).map(&accept).unwrap_or(false)),
        Some(v) => compare_values(v, operand).map(accept).unwrap_or(false),
        None => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Compare two values of the same type class
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total order across types, used for sorting
pub fn total_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) if rank(a) == rank(b) => {
            compare_values(x, y).unwrap_or(Ordering::Equal)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => true,
    }
}

/// Any search term appears, case-insensitively, in any string field
fn text_matches(doc: &Document, condition: &Value) -> StoreResult<bool> {
    let search = condition
        .get("$search")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Rejected("$text needs a $search string".to_string()))?;

    let terms: Vec<String> = search.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return Ok(false);
    }

    Ok(doc
        .iter()
        .filter(|(field, _)| field.as_str() != "_id")
        .any(|(_, v)| contains_term(v, &terms)))
}

fn contains_term(value: &Value, terms: &[String]) -> bool {
    match value {
        Value::String(s) => {
            let s = s.to_lowercase();
            terms.iter().any(|t| s.contains(t.as_str()))
        }
        Value::Array(items) => items.iter().any(|v| contains_term(v, terms)),
        Value::Object(map) => map.values().any(|v| contains_term(v, terms)),
        _ => false,
    }
}
