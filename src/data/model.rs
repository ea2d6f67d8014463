use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of the table
// ---------------------------------------------------------------------------

/// A scalar cell after type coercion by the loader.
/// Ordered so values can be kept in `BTreeSet`s: nulls, then numbers, then text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

static NULL: Value = Value::Null;

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(v) => v.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "NA"),
        }
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One row: column name → value. Absent columns read as [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&NULL)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed numeric bounds.
///
/// Immutable once built; the app shares it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records, in file order.
    pub records: Vec<Record>,
    /// Column names in file order.
    pub column_names: Vec<String>,
    /// Observed (min, max) for every column holding at least one number.
    pub numeric_bounds: BTreeMap<String, (f64, f64)>,
}

impl Dataset {
    /// Build the bounds index from already-coerced records.
    pub fn from_records(column_names: Vec<String>, records: Vec<Record>) -> Self {
        let mut numeric_bounds: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for rec in &records {
            for (col, val) in &rec.fields {
                let Some(v) = val.as_f64() else { continue };
                if !v.is_finite() {
                    continue;
                }
                numeric_bounds
                    .entry(col.clone())
                    .and_modify(|(lo, hi)| {
                        *lo = lo.min(v);
                        *hi = hi.max(v);
                    })
                    .or_insert((v, v));
            }
        }

        Dataset {
            records,
            column_names,
            numeric_bounds,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Columns with at least one numeric cell, in file order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.column_names
            .iter()
            .filter(|c| self.numeric_bounds.contains_key(c.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// A column is categorical when any of its cells holds text.
    pub fn is_categorical(&self, column: &str) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.get(column), Value::Text(_)))
    }

    /// Distinct non-null labels of a column, in order of first appearance.
    pub fn levels(&self, column: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.get(column))
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .filter(|label| seen.insert(label.clone()))
            .collect()
    }
}
