//! # Update Evaluation
//!
//! Applies update operator documents (`$set`, `$unset`, `$inc`,
//! `$setOnInsert`) to in-memory documents, and seeds upserted documents
//! from a filter's equality clauses.

use serde_json::{Map, Number, Value};

use super::document::Document;
use super::errors::{StoreError, StoreResult};

/// Apply `update` to `doc`. Returns whether the document changed.
///
/// `inserting` enables `$setOnInsert`.
pub fn apply_update(doc: &mut Document, update: &Document, inserting: bool) -> StoreResult<bool> {
    let before = doc.clone();

    for (op, fields) in update {
        let fields = fields
            .as_object()
            .ok_or_else(|| StoreError::Rejected(format!("{} needs an object", op)))?;

        match op.as_str() {
            "$set" => {
                for (path, value) in fields {
                    set_path(doc, path, value.clone())?;
                }
            }
            "$setOnInsert" => {
                if inserting {
                    for (path, value) in fields {
                        set_path(doc, path, value.clone())?;
                    }
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    unset_path(doc, path);
                }
            }
            "$inc" => {
                for (path, delta) in fields {
                    increment(doc, path, delta)?;
                }
            }
            other => {
                return Err(StoreError::Rejected(format!(
                    "unsupported update operator: {}",
                    other
                )))
            }
        }
    }

    if before.contains_key("_id") && before.get("_id") != doc.get("_id") {
        return Err(StoreError::Rejected("_id is immutable".to_string()));
    }

    Ok(*doc != before)
}

/// Document an upsert starts from: the filter's plain equality fields
pub fn seed_from_filter(filter: &Document) -> StoreResult<Document> {
    let mut seed = Document::new();
    for (key, condition) in filter {
        if key.starts_with('$') {
            continue;
        }
        let value = match condition {
            Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => match map.get("$eq") {
                Some(v) => v.clone(),
                None => continue,
            },
            other => other.clone(),
        };
        set_path(&mut seed, key, value)?;
    }
    Ok(seed)
}

fn set_path(doc: &mut Document, path: &str, value: Value) -> StoreResult<()> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let target = match parents {
        Some(parents) => parents.split('.').try_fold(doc, |current, part| {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            entry.as_object_mut().ok_or_else(|| {
                StoreError::Rejected(format!("cannot create field '{}' in '{}'", path, part))
            })
        })?,
        None => doc,
    };

    target.insert(leaf.to_string(), value);
    Ok(())
}

fn unset_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(child)) = doc.get_mut(head) {
                unset_path(child, rest);
            }
        }
    }
}

fn increment(doc: &mut Document, path: &str, delta: &Value) -> StoreResult<()> {
    let delta_num = match delta {
        Value::Number(n) => n,
        _ => return Err(StoreError::Rejected(format!("$inc on '{}' needs a number", path))),
    };

    let current = super::filter::lookup(doc, path).cloned();
    let next = match current {
        None | Some(Value::Null) => Value::Number(delta_num.clone()),
        Some(Value::Number(n)) => add_numbers(&n, delta_num)?,
        Some(_) => {
            return Err(StoreError::Rejected(format!(
                "cannot apply $inc to non-numeric field '{}'",
                path
            )))
        }
    };
    set_path(doc, path, next)
}

fn add_numbers(a: &Number, b: &Number) -> StoreResult<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Value::from(sum));
        }
    }
    let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
    Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| StoreError::Rejected("$inc produced a non-finite number".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_set_and_unset() {
        let mut d = doc(json!({"a": 1, "b": 2}));
        let changed = apply_update(&mut d, &doc(json!({"$set": {"a": 5}, "$unset": {"b": ""}})), false).unwrap();
        assert!(changed);
        assert_eq!(Value::Object(d), json!({"a": 5}));
    }

    #[test]
    fn test_set_same_value_is_not_a_change() {
        let mut d = doc(json!({"a": 1}));
        assert!(!apply_update(&mut d, &doc(json!({"$set": {"a": 1}})), false).unwrap());
    }

    #[test]
    fn test_set_nested_path() {
        let mut d = doc(json!({}));
        apply_update(&mut d, &doc(json!({"$set": {"meta.source": "ebest"}})), false).unwrap();
        assert_eq!(Value::Object(d), json!({"meta": {"source": "ebest"}}));
    }

    #[test]
    fn test_inc() {
        let mut d = doc(json!({"n": 1}));
        apply_update(&mut d, &doc(json!({"$inc": {"n": 2, "m": 1.5}})), false).unwrap();
        assert_eq!(d["n"], json!(3));
        assert_eq!(d["m"], json!(1.5));
    }

    #[test]
    fn test_inc_rejects_strings() {
        let mut d = doc(json!({"n": "one"}));
        assert!(apply_update(&mut d, &doc(json!({"$inc": {"n": 1}})), false).is_err());
    }

    #[test]
    fn test_set_on_insert_only_when_inserting() {
        let update = doc(json!({"$setOnInsert": {"created": true}}));

        let mut existing = doc(json!({}));
        apply_update(&mut existing, &update, false).unwrap();
        assert!(existing.get("created").is_none());

        let mut fresh = doc(json!({}));
        apply_update(&mut fresh, &update, true).unwrap();
        assert_eq!(fresh["created"], json!(true));
    }

    #[test]
    fn test_unknown_operator() {
        let mut d = doc(json!({}));
        assert!(apply_update(&mut d, &doc(json!({"$push": {"a": 1}})), false).is_err());
    }

    #[test]
    fn test_id_is_immutable() {
        let mut d = doc(json!({"_id": "x"}));
        assert!(apply_update(&mut d, &doc(json!({"$set": {"_id": "y"}})), false).is_err());
    }

    #[test]
    fn test_seed_from_filter() {
        let filter = doc(json!({
            "code": "005930",
            "market": {"$eq": "1"},
            "memedan": {"$gt": 0},
            "$or": [{"a": 1}]
        }));
        let seed = seed_from_filter(&filter).unwrap();
        assert_eq!(Value::Object(seed), json!({"code": "005930", "market": "1"}));
    }
}
