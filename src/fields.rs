use serde_json::Value;

/// Key of the single diagnostic field that replaces a malformed field list.
pub const FIELDS_ERROR_KEY: &str = "fields_error";

/// Why a caller-supplied key/value list was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldsError {
    #[error("uneven number of key-value pairs")]
    Uneven,

    #[error("key-value pairs must be strings")]
    NotString,
}

/// Turn an alternating `key, value, key, value, ...` list into typed pairs.
///
/// Every key and value must be a JSON string. Order is preserved.
pub fn pair_fields(raw: &[Value]) -> Result<Vec<(String, Value)>, FieldsError> {
    if raw.len() % 2 != 0 {
        return Err(FieldsError::Uneven);
    }

    raw.chunks_exact(2)
        .map(|pair| match (&pair[0], &pair[1]) {
            (Value::String(key), Value::String(value)) => {
                Ok((key.clone(), Value::String(value.clone())))
            }
            _ => Err(FieldsError::NotString),
        })
        .collect()
}

/// Like [`pair_fields`], but a malformed list degrades to a single
/// `fields_error` entry instead of failing.
pub fn attach_fields(raw: &[Value]) -> Vec<(String, Value)> {
    match pair_fields(raw) {
        Ok(fields) => fields,
        Err(e) => vec![(FIELDS_ERROR_KEY.to_string(), Value::String(e.to_string()))],
    }
}

/// Build an untyped key/value list for the logging calls.
///
/// ```
/// use svc_logger::fields;
///
/// let kv = fields!["user_id", "42", "route", "/login"];
/// assert_eq!(kv.len(), 4);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::__private::Value>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::__private::Value::from($item)),+]
    };
}
