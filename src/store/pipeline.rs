//! # Aggregation Pipeline Evaluation
//!
//! Runs aggregation pipelines against in-memory documents. Stages run in
//! order, each consuming the previous stage's output.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::document::Document;
use super::errors::{StoreError, StoreResult};
use super::filter::{self, compare_values, is_truthy, lookup, total_order};

/// A parsed pipeline stage
#[derive(Debug, Clone)]
enum Stage<'a> {
    Match(&'a Document),
    Project(&'a Document),
    Sort(Vec<(&'a str, bool)>),
    Skip(usize),
    Limit(usize),
    Count(&'a str),
    Group(&'a Document),
}

/// Run `pipeline` over `docs`
pub fn run_pipeline(docs: Vec<Document>, pipeline: &[Document]) -> StoreResult<Vec<Document>> {
    let stages = pipeline
        .iter()
        .map(parse_stage)
        .collect::<StoreResult<Vec<_>>>()?;

    stages.iter().try_fold(docs, |docs, stage| apply_stage(docs, stage))
}

fn parse_stage(spec: &Document) -> StoreResult<Stage<'_>> {
    let mut entries = spec.iter();
    let (name, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(StoreError::rejected(
                "each pipeline stage must have exactly one field",
            ))
        }
    };

    let object = |what: &str| {
        body.as_object()
            .ok_or_else(|| StoreError::rejected(format!("{} needs an object", what)))
    };

    match name.as_str() {
        "$match" => Ok(Stage::Match(object("$match")?)),
        "$project" => Ok(Stage::Project(object("$project")?)),
        "$group" => {
            let group = object("$group")?;
            if !group.contains_key("_id") {
                return Err(StoreError::rejected("$group needs an _id"));
            }
            Ok(Stage::Group(group))
        }
        "$sort" => {
            let keys = object("$sort")?;
            if keys.is_empty() {
                return Err(StoreError::rejected("$sort needs at least one key"));
            }
            keys.iter()
                .map(|(field, dir)| match dir.as_i64() {
                    Some(1) => Ok((field.as_str(), true)),
                    Some(-1) => Ok((field.as_str(), false)),
                    _ => Err(StoreError::rejected("$sort direction must be 1 or -1")),
                })
                .collect::<StoreResult<Vec<_>>>()
                .map(Stage::Sort)
        }
        "$skip" => count_arg(body, "$skip").map(Stage::Skip),
        "$limit" => match count_arg(body, "$limit")? {
            0 => Err(StoreError::rejected("$limit must be positive")),
            n => Ok(Stage::Limit(n)),
        },
        "$count" => match body.as_str() {
            Some(field) if !field.is_empty() && !field.starts_with('$') => Ok(Stage::Count(field)),
            _ => Err(StoreError::rejected("$count needs a field name")),
        },
        other => Err(StoreError::rejected(format!(
            "unsupported pipeline stage: {}",
            other
        ))),
    }
}

fn count_arg(body: &Value, stage: &str) -> StoreResult<usize> {
    body.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::rejected(format!("{} needs a non-negative integer", stage)))
}

fn apply_stage(docs: Vec<Document>, stage: &Stage<'_>) -> StoreResult<Vec<Document>> {
    match stage {
        Stage::Match(condition) => {
            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs {
                if filter::matches(&doc, condition)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        Stage::Project(spec) => docs.into_iter().map(|doc| project(doc, spec)).collect(),
        Stage::Sort(keys) => {
            let mut docs = docs;
            docs.sort_by(|a, b| {
                keys.iter()
                    .map(|(field, ascending)| {
                        let ord = total_order(lookup(a, field), lookup(b, field));
                        if *ascending {
                            ord
                        } else {
                            ord.reverse()
                        }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Ok(docs)
        }
        Stage::Skip(n) => Ok(docs.into_iter().skip(*n).collect()),
        Stage::Limit(n) => Ok(docs.into_iter().take(*n).collect()),
        Stage::Count(field) => {
            if docs.is_empty() {
                return Ok(Vec::new());
            }
            let mut out = Document::new();
            out.insert(field.to_string(), Value::from(docs.len() as u64));
            Ok(vec![out])
        }
        Stage::Group(spec) => group(docs, spec),
    }
}

/// `$project`: inclusion or exclusion of top-level fields, `_id` kept unless excluded
fn project(doc: Document, spec: &Document) -> StoreResult<Document> {
    let inclusive = spec
        .iter()
        .any(|(k, v)| k != "_id" && (is_truthy(v) || v.is_string()));
    let exclusive = spec
        .iter()
        .any(|(k, v)| k != "_id" && !is_truthy(v) && !v.is_string());
    if inclusive && exclusive {
        return Err(StoreError::rejected(
            "$project cannot mix inclusion and exclusion",
        ));
    }

    let keep_id = spec.get("_id").map(is_truthy).unwrap_or(true);

    if !inclusive {
        let mut out = doc;
        for (field, _) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
            out.remove(field);
        }
        if !keep_id {
            out.remove("_id");
        }
        return Ok(out);
    }

    let mut out = Document::new();
    if keep_id {
        if let Some(id) = doc.get("_id") {
            out.insert("_id".to_string(), id.clone());
        }
    }
    for (field, rule) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
        let value = match rule {
            Value::String(_) => Some(eval_expr(&doc, rule)),
            _ => lookup(&doc, field).cloned(),
        };
        if let Some(value) = value {
            out.insert(field.clone(), value);
        }
    }
    Ok(out)
}

/// Evaluate a field reference (`"$field"`), a literal, or an object of either
fn eval_expr(doc: &Document, expr: &Value) -> Value {
    match expr {
        Value::String(s) if s.starts_with('$') => lookup(doc, &s[1..]).cloned().unwrap_or(Value::Null),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), eval_expr(doc, v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Field reference target, or `None` when the referenced field is missing
fn eval_operand(doc: &Document, expr: &Value) -> Option<Value> {
    match expr {
        Value::String(s) if s.starts_with('$') => lookup(doc, &s[1..]).cloned(),
        other => Some(eval_expr(doc, other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accumulator {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
}

impl Accumulator {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "$sum" => Some(Accumulator::Sum),
            "$avg" => Some(Accumulator::Avg),
            "$min" => Some(Accumulator::Min),
            "$max" => Some(Accumulator::Max),
            "$first" => Some(Accumulator::First),
            "$last" => Some(Accumulator::Last),
            "$push" => Some(Accumulator::Push),
            _ => None,
        }
    }
}

fn group(docs: Vec<Document>, spec: &Document) -> StoreResult<Vec<Document>> {
    let id_expr = spec.get("_id").cloned().unwrap_or(Value::Null);

    let mut fields = Vec::new();
    for (name, body) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
        let acc = body.as_object().and_then(|m| {
            let mut entries = m.iter();
            match (entries.next(), entries.next()) {
                (Some((op, expr)), None) => Accumulator::parse(op).map(|a| (a, expr)),
                _ => None,
            }
        });
        match acc {
            Some((acc, expr)) => fields.push((name.as_str(), acc, expr)),
            None => {
                return Err(StoreError::rejected(format!(
                    "$group field '{}' needs one accumulator",
                    name
                )))
            }
        }
    }

    // groups in first-seen order
    let mut order: Vec<(Value, Vec<Document>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        let key = eval_expr(&doc, &id_expr);
        let slot = *index.entry(key.to_string()).or_insert_with(|| {
            order.push((key.clone(), Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(doc);
    }

    Ok(order
        .into_iter()
        .map(|(key, members)| {
            let mut out = Document::new();
            out.insert("_id".to_string(), key);
            for (name, acc, expr) in &fields {
                out.insert(name.to_string(), accumulate(*acc, expr, &members));
            }
            out
        })
        .collect())
}

fn accumulate(acc: Accumulator, expr: &Value, members: &[Document]) -> Value {
    let values = || members.iter().filter_map(|d| eval_operand(d, expr));

    match acc {
        Accumulator::Sum => {
            let numbers: Vec<serde_json::Number> = values()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(n),
                    _ => None,
                })
                .collect();
            let ints: Option<i64> = numbers
                .iter()
                .try_fold(0i64, |acc, n| n.as_i64().and_then(|i| acc.checked_add(i)));
            match ints {
                Some(total) => Value::from(total),
                None => Value::from(numbers.iter().filter_map(|n| n.as_f64()).sum::<f64>()),
            }
        }
        Accumulator::Avg => {
            let numbers: Vec<f64> = values().filter_map(|v| v.as_f64()).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::from(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        Accumulator::Min | Accumulator::Max => values()
            .filter(|v| !v.is_null())
            .reduce(|best, v| {
                let ord = compare_values(&v, &best)
                    .unwrap_or_else(|| total_order(Some(&v), Some(&best)));
                let replace = match acc {
                    Accumulator::Min => ord.is_lt(),
                    _ => ord.is_gt(),
                };
                if replace {
                    v
                } else {
                    best
                }
            })
            .unwrap_or(Value::Null),
        Accumulator::First => members
            .first()
            .map(|d| eval_expr(d, expr))
            .unwrap_or(Value::Null),
        Accumulator::Last => members
            .last()
            .map(|d| eval_expr(d, expr))
            .unwrap_or(Value::Null),
        Accumulator::Push => Value::Array(values().collect()),
    }
}
