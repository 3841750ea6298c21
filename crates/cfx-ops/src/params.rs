//! Lenient typed reads over a descriptor's free-form parameters.
//!
//! Filter parameters are user-authored JSON. A missing key yields the
//! documented default silently; a present but unusable value yields the
//! default with a `warn` log, so one bad parameter never aborts a chain.

use cfx_core::Fraction;
use serde_json::{Map, Value};
use tracing::warn;

/// Read-only view of one descriptor's parameters.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    method: &'a str,
    map: &'a Map<String, Value>,
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl<'a> Params<'a> {
    /// Wraps `map`; `method` is only used in log messages.
    pub fn new(method: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { method, map }
    }

    /// The method these parameters belong to.
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// True if `key` is present and not `null`.
    pub fn has(&self, key: &str) -> bool {
        self.map.get(key).is_some_and(|v| !v.is_null())
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn reject<T: std::fmt::Debug>(&self, key: &str, value: &Value, default: T) -> T {
        warn!(method = self.method, key, %value, ?default, "unusable filter parameter, using default");
        default
    }

    /// A finite number (numeric strings accepted).
    pub fn number(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            None => default,
            Some(v) => match as_number(v) {
                Some(n) if n.is_finite() => n,
                _ => self.reject(key, v, default),
            },
        }
    }

    /// A number or `"NN%"` string.
    pub fn fraction(&self, key: &str, default: f64) -> Fraction {
        match self.get(key) {
            None => Fraction(default),
            Some(Value::String(s)) => match s.parse::<Fraction>() {
                Ok(f) if f.get().is_finite() => f,
                _ => Fraction(self.reject(key, &Value::String(s.clone()), default)),
            },
            Some(_) => Fraction(self.number(key, default)),
        }
    }

    /// A value on the 0..255 channel scale; `"NN%"` strings scale 0..255.
    pub fn channel_level(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(Value::String(s)) if s.trim_end().ends_with('%') => match s.parse::<Fraction>() {
                Ok(f) if f.get().is_finite() => f.get() * 255.0,
                _ => self.reject(key, &Value::String(s.clone()), default),
            },
            _ => self.number(key, default),
        }
    }

    /// A non-negative integer, floored.
    pub fn count(&self, key: &str, default: u32) -> u32 {
        let n = self.number(key, default as f64);
        if n < 0.0 {
            return self.reject(key, &Value::from(n), default);
        }
        n.floor().min(u32::MAX as f64) as u32
    }

    /// A signed integer, floored.
    pub fn integer(&self, key: &str, default: i64) -> i64 {
        self.number(key, default as f64).floor() as i64
    }

    /// A boolean; `0`/`1` and `"true"`/`"false"` are accepted.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) if s == "true" => true,
            Some(Value::String(s)) if s == "false" => false,
            Some(v) => self.reject(key, v, default),
        }
    }

    /// A list of numbers: an array, a comma-separated string, or a single
    /// number. Missing gives an empty list.
    pub fn numbers(&self, key: &str) -> Vec<f64> {
        let Some(v) = self.get(key) else {
            return Vec::new();
        };
        let parsed: Option<Vec<f64>> = match v {
            Value::Array(items) => items.iter().map(as_number).collect(),
            Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
            Value::String(s) => s.split(',').map(|p| p.trim().parse::<f64>().ok()).collect(),
            Value::Number(_) => as_number(v).map(|n| vec![n]),
            _ => None,
        };
        match parsed {
            Some(list) if list.iter().all(|n| n.is_finite()) => list,
            _ => self.reject(key, v, Vec::new()),
        }
    }

    /// An RGB triple from `key` as `[r, g, b]`, or from `{prefix}Red`,
    /// `{prefix}Green`, `{prefix}Blue`.
    pub fn rgb(&self, key: &str, prefix: &str, default: [u8; 3]) -> [u8; 3] {
        if let Some(v) = self.get(key) {
            let list = self.numbers(key);
            if list.len() >= 3 {
                return [0, 1, 2].map(|i| cfx_core::clamp_channel(list[i]));
            }
            return self.reject(key, v, default);
        }
        [("Red", 0), ("Green", 1), ("Blue", 2)].map(|(suffix, i)| {
            cfx_core::clamp_channel(self.number(&format!("{prefix}{suffix}"), default[i] as f64))
        })
    }

    /// Chroma ranges: an array of six-number arrays.
    pub fn ranges(&self, key: &str) -> Vec<[f64; 6]> {
        let Some(v) = self.get(key) else {
            return Vec::new();
        };
        let Value::Array(items) = v else {
            return self.reject(key, v, Vec::new());
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let nums: Option<Vec<f64>> = match item {
                Value::Array(xs) => xs.iter().map(as_number).collect(),
                _ => None,
            };
            match nums {
                Some(n) if n.len() == 6 => out.push([n[0], n[1], n[2], n[3], n[4], n[5]]),
                _ => {
                    warn!(method = self.method, key, %item, "skipping malformed range");
                }
            }
        }
        out
    }
}
