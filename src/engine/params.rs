//! Typed access to a request's params map.

use crate::core::protocol::Request;
use crate::engine::error::{EngineError, EngineResult};
use serde_json::{Map, Value};

pub(crate) struct Params<'a> {
    method: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self {
            method: &request.method,
            map: &request.params,
        }
    }

    fn get(&self, key: &str) -> EngineResult<&'a Value> {
        self.map.get(key).ok_or_else(|| {
            EngineError::bad_params(format!("{}: parameter '{key}' missing", self.method))
        })
    }

    fn mistyped(&self, key: &str, expected: &str) -> EngineError {
        EngineError::bad_params(format!(
            "{}: parameter '{key}' must be {expected}",
            self.method
        ))
    }

    pub fn str(&self, key: &str) -> EngineResult<&'a str> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| self.mistyped(key, "a string"))
    }

    pub fn opt_str(&self, key: &str) -> EngineResult<Option<&'a str>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.str(key).map(Some),
        }
    }

    pub fn u64(&self, key: &str) -> EngineResult<u64> {
        self.get(key)?
            .as_u64()
            .ok_or_else(|| self.mistyped(key, "an unsigned integer"))
    }

    pub fn u64_or(&self, key: &str, default: u64) -> EngineResult<u64> {
        match self.map.get(key) {
            None => Ok(default),
            Some(_) => self.u64(key),
        }
    }

    pub fn i64(&self, key: &str) -> EngineResult<i64> {
        self.get(key)?
            .as_i64()
            .ok_or_else(|| self.mistyped(key, "an integer"))
    }

    pub fn f64(&self, key: &str) -> EngineResult<f64> {
        self.get(key)?
            .as_f64()
            .ok_or_else(|| self.mistyped(key, "a number"))
    }

    pub fn opt_f64(&self, key: &str) -> EngineResult<Option<f64>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.f64(key).map(Some),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> EngineResult<bool> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.mistyped(key, "true or false")),
        }
    }

    pub fn str_list(&self, key: &str) -> EngineResult<Vec<&'a str>> {
        let items = self
            .get(key)?
            .as_array()
            .ok_or_else(|| self.mistyped(key, "a list of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| self.mistyped(key, "a list of strings"))
            })
            .collect()
    }

    /// Missing means empty
    pub fn opt_str_list(&self, key: &str) -> EngineResult<Vec<&'a str>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(_) => self.str_list(key),
        }
    }

    pub fn u64_list(&self, key: &str) -> EngineResult<Vec<u64>> {
        let items = self
            .get(key)?
            .as_array()
            .ok_or_else(|| self.mistyped(key, "a list of unsigned integers"))?;
        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .ok_or_else(|| self.mistyped(key, "a list of unsigned integers"))
            })
            .collect()
    }

    /// Exactly one string, sent as a one-element list
    pub fn single_str(&self, key: &str) -> EngineResult<&'a str> {
        match self.str_list(key)?.as_slice() {
            [only] => Ok(*only),
            other => Err(EngineError::bad_params(format!(
                "{}: parameter '{key}' must hold exactly one entry, got {}",
                self.method,
                other.len()
            ))),
        }
    }
}
