//! # Field Translation
//!
//! Stored security code records use localized field names. The API exposes a
//! fixed public schema. [`project`] maps one onto the other: fields in the
//! table are renamed, every other field is dropped, so new stored fields never
//! reach the API until the table learns about them.

use crate::store::Document;

/// Stored field name to public field name
pub const CODE_FIELD_TABLE: [(&str, &str); 7] = [
    ("단축코드", "code"),
    ("확장코드", "extend_code"),
    ("종목명", "name"),
    ("시장구분", "market"),
    ("ETF구분", "is_etf"),
    ("주문수량단위", "memedan"),
    ("기업인수목적회사여부", "is_spac"),
];

/// Stored field holding the short code
pub const CODE_FIELD: &str = "단축코드";

/// Stored field holding the market classification
pub const MARKET_FIELD: &str = "시장구분";

/// Public name for a stored field, if the table knows it
pub fn public_name(stored: &str) -> Option<&'static str> {
    CODE_FIELD_TABLE
        .iter()
        .find(|(from, _)| *from == stored)
        .map(|(_, to)| *to)
}

/// Keep only the fields in the table, renamed to their public names
pub fn project(raw: &Document) -> Document {
    raw.iter()
        .filter_map(|(field, value)| {
            public_name(field).map(|name| (name.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> Document {
        json!({
            "_id": {"$oid": "5f1d7a5b9c1e4b2a3c4d5e6f"},
            "단축코드": "005930",
            "확장코드": "KR7005930003",
            "종목명": "삼성전자",
            "시장구분": "1",
            "ETF구분": "0",
            "주문수량단위": 1,
            "기업인수목적회사여부": "N",
            "상한가": 70000,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_project_renames_known_fields() {
        let out = project(&raw());
        assert_eq!(out["code"], json!("005930"));
        assert_eq!(out["extend_code"], json!("KR7005930003"));
        assert_eq!(out["name"], json!("삼성전자"));
        assert_eq!(out["market"], json!("1"));
        assert_eq!(out["is_etf"], json!("0"));
        assert_eq!(out["memedan"], json!(1));
        assert_eq!(out["is_spac"], json!("N"));
    }

    #[test]
    fn test_project_drops_unknown_fields() {
        let out = project(&raw());
        assert_eq!(out.len(), CODE_FIELD_TABLE.len());
        assert!(out.get("_id").is_none());
        assert!(out.get("상한가").is_none());
    }

    #[test]
    fn test_project_partial_document() {
        let doc = json!({"종목명": "카카오", "extra": true})
            .as_object()
            .cloned()
            .unwrap();
        let out = project(&doc);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("name"), Some(&json!("카카오")));
    }

    #[test]
    fn test_project_never_exceeds_table() {
        let mut doc = raw();
        for i in 0..50 {
            doc.insert(format!("extra_{}", i), json!(i));
        }
        assert!(project(&doc).len() <= CODE_FIELD_TABLE.len());
    }

    #[test]
    fn test_projected_output_does_not_reproject() {
        // public names are not stored names, so a second pass keeps nothing
        assert!(project(&project(&raw())).is_empty());
    }

    #[test]
    fn test_name_lookups() {
        assert_eq!(public_name(CODE_FIELD), Some("code"));
        assert_eq!(public_name(MARKET_FIELD), Some("market"));
        assert_eq!(public_name("code"), None);
    }
}
