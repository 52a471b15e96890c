use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value as reported by its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Integer if it parses as one, then float, otherwise text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            Self::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One measurement of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamRecord {
    pub value: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ParamValue>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ParamRecord {
    pub fn new(value: impl Into<ParamValue>) -> Self {
        Self {
            value: value.into(),
            error: None,
            reference: None,
            units: None,
            notes: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<ParamValue>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Lowercases a parameter name, mapping the few names with a fixed
/// spelling (`teff` → `Teff`).
pub fn format_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "teff" => "Teff".to_string(),
        _ => lower,
    }
}

/// Parameter name → every distinct measurement of it.
///
/// Insertion only ever adds: conflicting measurements from different sources
/// sit side by side and identical ones collapse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamSet {
    params: BTreeMap<String, Vec<ParamRecord>>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an identical record was already present.
    pub fn insert(&mut self, name: &str, record: ParamRecord) -> bool {
        let records = self.params.entry(format_key(name)).or_default();
        if records.contains(&record) {
            false
        } else {
            records.push(record);
            true
        }
    }

    pub fn union(&mut self, other: &ParamSet) {
        for (name, records) in &other.params {
            for record in records {
                self.insert(name, record.clone());
            }
        }
    }

    pub fn get(&self, name: &str) -> &[ParamRecord] {
        self.params
            .get(&format_key(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParamRecord])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct parameter names.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
