//! Conversion from tagged [`Object`]s into typed records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::object::{DataType, Object, Value};

/// A typed view of one API resource kind.
pub trait Record: Sized {
    /// The tag whose derivations the record's fields rely on.
    const TAG: DataType;

    /// Consumes the known fields; whatever is left ends up in `extra`.
    fn from_fields(fields: Fields) -> Self;

    /// Tags `object` (a no-op if it already carries [`Self::TAG`]) and
    /// converts it.
    fn from_object(object: Object) -> Self {
        Self::from_fields(Fields::new(object.with_tag(Self::TAG)))
    }
}

/// Field bag that typed records take their members out of.
///
/// Every `take_*` removes the key only when the value has the expected
/// shape; otherwise the value stays behind and lands in the record's extras.
pub struct Fields {
    map: BTreeMap<String, Value>,
    predicates: BTreeMap<String, bool>,
}

impl Fields {
    pub fn new(object: Object) -> Self {
        let (map, predicates) = object.into_parts();
        Self { map, predicates }
    }

    /// Takes a string field. Numeric ids are accepted and stringified.
    pub fn take_string(&mut self, key: &str) -> Option<String> {
        match self.map.remove(key)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Null => None,
            other => self.put_back(key, other),
        }
    }

    pub fn take_strings(&mut self, key: &str) -> Vec<String> {
        match self.map.remove(key) {
            Some(Value::Array(elements)) => elements
                .into_iter()
                .filter_map(|element| match element {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                self.map.insert(key.to_string(), other);
                Vec::new()
            }
        }
    }

    pub fn take_i64(&mut self, key: &str) -> Option<i64> {
        match self.map.remove(key)? {
            Value::Number(n) if n.is_i64() => n.as_i64(),
            Value::Null => None,
            other => self.put_back(key, other),
        }
    }

    pub fn take_time(&mut self, key: &str) -> Option<DateTime<Utc>> {
        match self.map.remove(key)? {
            Value::Time(t) => Some(t),
            Value::Null => None,
            other => self.put_back(key, other),
        }
    }

    pub fn take_uri(&mut self, key: &str) -> Option<Url> {
        match self.map.remove(key)? {
            Value::Uri(u) => Some(u),
            Value::Null => None,
            other => self.put_back(key, other),
        }
    }

    /// Takes a field's derived predicate, falling back to its truthiness.
    pub fn take_flag(&mut self, key: &str) -> bool {
        let value = self.map.remove(key);
        match self.predicates.get(key) {
            Some(flag) => *flag,
            None => value.is_some_and(|v| v.is_truthy()),
        }
    }

    pub fn take_value(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    pub fn take_record<T: Record>(&mut self, key: &str) -> Option<T> {
        match self.map.remove(key)? {
            Value::Object(object) => Some(T::from_object(object)),
            Value::Null => None,
            other => self.put_back(key, other),
        }
    }

    pub fn take_records<T: Record>(&mut self, key: &str) -> Vec<T> {
        match self.map.remove(key) {
            Some(Value::Array(elements)) => elements
                .into_iter()
                .filter_map(|element| match element {
                    Value::Object(object) => Some(T::from_object(object)),
                    _ => None,
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                self.map.insert(key.to_string(), other);
                Vec::new()
            }
        }
    }

    /// Everything nobody took.
    pub fn into_extra(self) -> BTreeMap<String, Value> {
        self.map
    }

    fn put_back<T>(&mut self, key: &str, value: Value) -> Option<T> {
        self.map.insert(key.to_string(), value);
        None
    }
}
