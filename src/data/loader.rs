use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Record, Value};

/// Cell contents treated as missing, as pandas' `read_csv` does by default.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "-NaN", "nan", "-nan", "null", "NULL", "None", "#N/A",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one record per line (primary format)
/// * `.json`    – `[{ "species": "Adelie", "bill_length_mm": 39.1, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// The file handle lives only for the duration of this call.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV file {}", path.display()))?;
            load_csv(file)?
        }
        "json" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening JSON file {}", path.display()))?;
            load_json(file)?
        }
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if dataset.column_names.is_empty() {
        bail!("{} has no columns", path.display());
    }
    if dataset.is_empty() {
        bail!("{} has no rows", path.display());
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV with a header row. A column is numeric when every non-missing
/// cell parses as a float; otherwise every non-missing cell is kept as text.
pub fn load_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let headers = dedupe_columns(headers);

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), parse_cell(cell)))
            .collect();
        records.push(Record { fields });
    }

    unify_column_types(&headers, &mut records);
    Ok(Dataset::from_records(headers, records))
}

fn parse_cell(s: &str) -> Value {
    if MISSING_MARKERS.contains(&s) {
        return Value::Null;
    }
    match s.parse::<f64>() {
        Ok(v) => number(v),
        Err(_) => Value::Text(s.to_string()),
    }
}

/// Non-finite floats (`NaN`, `inf`) are stored as missing.
fn number(v: f64) -> Value {
    if v.is_finite() {
        Value::Number(v)
    } else {
        Value::Null
    }
}

/// Rename repeated column names the way pandas does: `a`, `a.1`, `a.2`, ...
fn dedupe_columns(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let renamed = (1..)
                .map(|n| format!("{name}.{n}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}

/// A column holding any text becomes a text column: its numbers are
/// re-rendered as labels.
fn unify_column_types(columns: &[String], records: &mut [Record]) {
    for col in columns {
        let has_text = records
            .iter()
            .any(|r| matches!(r.fields.get(col), Some(Value::Text(_))));
        if !has_text {
            continue;
        }
        for rec in records.iter_mut() {
            if let Some(val) = rec.fields.get_mut(col) {
                if let Value::Number(_) = val {
                    *val = Value::Text(val.to_string());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "species": "Adelie", "bill_length_mm": 39.1, "sex": "male" },
///   ...
/// ]
/// ```
pub fn load_json<R: Read>(reader: R) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_reader(reader).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut rec = Record::default();
        for (key, val) in obj {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
            rec.fields.insert(key.clone(), json_to_value(val));
        }
        records.push(rec);
    }

    unify_column_types(&columns, &mut records);
    Ok(Dataset::from_records(columns, records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::Number(n) => n.as_f64().map(number).unwrap_or(Value::Null),
        JsonValue::String(s) if MISSING_MARKERS.contains(&s.as_str()) => Value::Null,
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let columns = dedupe_columns(columns);
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let mut rec = Record::default();
            for (col_idx, col_name) in columns.iter().enumerate() {
                let value = extract_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{col_name}'"))?;
                rec.fields.insert(col_name.clone(), value);
            }
            records.push(rec);
        }
    }

    unify_column_types(&columns, &mut records);
    Ok(Dataset::from_records(columns, records))
}

/// Extract a single value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Value::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => number(col.as_primitive::<Float64Type>().value(row)),
        _ => Value::Text(array_value_to_string(&**col, row)?),
    };
    Ok(value)
}
