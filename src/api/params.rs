use std::collections::HashMap;

use crate::validator::Validator;

/// Return the raw value for a query key, or the default when the key is
/// missing or empty.
pub fn read_string(qs: &HashMap<String, String>, key: &str, default: &str) -> String {
    match qs.get(key) {
        Some(s) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

/// Split a query value on commas. No trimming and no empty-segment
/// filtering: two adjacent commas yield an empty segment.
pub fn read_csv(qs: &HashMap<String, String>, key: &str, default: Vec<String>) -> Vec<String> {
    match qs.get(key) {
        Some(s) if !s.is_empty() => s.split(',').map(String::from).collect(),
        _ => default,
    }
}

/// Parse an integer query value. A value that is not an integer records a
/// validation error on the key and falls back to the default; parse
/// failures are always recoverable at this layer.
pub fn read_int(qs: &HashMap<String, String>, key: &str, default: i64, v: &mut Validator) -> i64 {
    let s = match qs.get(key) {
        Some(s) if !s.is_empty() => s,
        _ => return default,
    };

    match s.parse::<i64>() {
        Ok(i) => i,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn read_string_defaults() {
        let qs = query(&[("title", "dune"), ("empty", "")]);
        assert_eq!(read_string(&qs, "title", ""), "dune");
        assert_eq!(read_string(&qs, "empty", "fallback"), "fallback");
        assert_eq!(read_string(&qs, "missing", "fallback"), "fallback");
    }

    #[test]
    fn read_csv_splits_without_trimming() {
        let qs = query(&[("genres", "drama,,sci fi")]);
        assert_eq!(
            read_csv(&qs, "genres", vec![]),
            vec!["drama".to_string(), "".to_string(), "sci fi".to_string()]
        );
        assert_eq!(
            read_csv(&qs, "missing", vec!["all".to_string()]),
            vec!["all".to_string()]
        );
    }

    #[test]
    fn read_int_records_error_and_falls_back() {
        let qs = query(&[("page_size", "abc")]);
        let mut v = Validator::new();
        assert_eq!(read_int(&qs, "page_size", 20, &mut v), 20);
        assert_eq!(v.errors.len(), 1);
        assert_eq!(v.errors["page_size"], "must be an integer value");
    }

    #[test]
    fn read_int_parses_and_defaults() {
        let qs = query(&[("page", "3")]);
        let mut v = Validator::new();
        assert_eq!(read_int(&qs, "page", 1, &mut v), 3);
        assert_eq!(read_int(&qs, "missing", 1, &mut v), 1);
        assert!(v.valid());
    }
}
