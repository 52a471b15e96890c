use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// One raw provider measurement: field name → value.
///
/// A value and its `<field>_error` always come from the same measurement.
/// Several measurements of one source are kept as separate rows and never
/// folded into one.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParamRow {
    fields: BTreeMap<String, String>,
}

impl ParamRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field`. Returns `false`, keeping the old value, if it was
    /// already set.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> bool {
        match self.fields.entry(field.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for ParamRow {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (field, value) in iter {
            row.insert(field, value);
        }
        row
    }
}
