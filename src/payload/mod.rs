//! Lazy views over raw event payloads.
//!
//! A [`Payload`] is a cheap, cloneable handle onto a node of an immutable JSON
//! document. Every entity in [`crate::models`] is built on one. Direct field
//! projections go through the typed accessors here and are never cached;
//! derived values are memoized in a [`Cached`] cell owned by the entity.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::{KickError, Result};

mod cached;

pub use cached::Cached;

static NULL: Value = Value::Null;

#[derive(Clone)]
pub struct Payload {
    root: Arc<Value>,
    /// Object keys from the document root down to this node.
    segments: Arc<[String]>,
    node: Arc<OnceCell<String>>,
}

impl Payload {
    pub fn new(value: Value) -> Self {
        Self::from_shared(Arc::new(value))
    }

    pub fn from_shared(root: Arc<Value>) -> Self {
        Self {
            root,
            segments: Arc::from(Vec::new()),
            node: Arc::new(OnceCell::new()),
        }
    }

    /// The whole event document, shared by every view into it.
    pub fn root(&self) -> &Arc<Value> {
        &self.root
    }

    /// The JSON node this payload points at.
    pub fn value(&self) -> &Value {
        let mut current = self.root.as_ref();
        for segment in self.segments.iter() {
            match current.get(segment) {
                Some(next) => current = next,
                None => return &NULL,
            }
        }
        current
    }

    /// Dotted location of this node inside the event payload, empty for the root.
    pub fn location(&self) -> &str {
        self.node.get_or_init(|| self.segments.join("."))
    }

    pub(crate) fn path_of(&self, key: &str) -> String {
        let location = self.location();
        if location.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", location, key)
        }
    }

    /// Raw projection; `None` when the key is absent. A JSON `null` is returned as-is.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value().get(key)
    }

    pub fn require(&self, key: &str) -> Result<&Value> {
        self.get(key).ok_or_else(|| KickError::missing(self.path_of(key)))
    }

    pub fn str(&self, key: &str) -> Result<&str> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| KickError::invalid(self.path_of(key), "string"))
    }

    pub fn i64(&self, key: &str) -> Result<i64> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| KickError::invalid(self.path_of(key), "integer"))
    }

    /// Integer projection that also accepts a numeric string, as the upstream
    /// payloads are inconsistent about id and duration encodings.
    pub fn coerce_i64(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| KickError::invalid(self.path_of(key), "integer")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| KickError::invalid(self.path_of(key), "integer")),
            _ => Err(KickError::invalid(self.path_of(key), "integer")),
        }
    }

    /// String projection that also accepts a number, rendered in decimal.
    pub fn coerce_string(&self, key: &str) -> Result<String> {
        match self.require(key)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(KickError::invalid(self.path_of(key), "string")),
        }
    }

    pub fn bool(&self, key: &str) -> Result<bool> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| KickError::invalid(self.path_of(key), "boolean"))
    }

    /// Loose truth test: absent, null, false, zero and empty containers are false.
    pub fn truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    pub fn datetime(&self, key: &str) -> Result<DateTime<Utc>> {
        let raw = self.str(key)?;
        parse_timestamp(raw)
            .ok_or_else(|| KickError::invalid(self.path_of(key), "ISO-8601 timestamp"))
    }

    /// View onto a nested object. The child shares the underlying document.
    pub fn child(&self, key: &str) -> Result<Payload> {
        match self.require(key)? {
            Value::Object(_) => {
                let mut segments: Vec<String> = self.segments.to_vec();
                segments.push(key.to_string());
                Ok(Self {
                    root: Arc::clone(&self.root),
                    segments: Arc::from(segments),
                    node: Arc::new(OnceCell::new()),
                })
            }
            _ => Err(KickError::invalid(self.path_of(key), "object")),
        }
    }

    /// Like [`Payload::child`], but `None` unless the key holds a non-empty object.
    pub fn non_empty_child(&self, key: &str) -> Option<Payload> {
        match self.get(key) {
            Some(Value::Object(map)) if !map.is_empty() => self.child(key).ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("location", &self.location())
            .field("value", self.value())
            .finish()
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Parses RFC 3339 timestamps, and naive ones which are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
