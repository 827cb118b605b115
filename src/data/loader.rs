use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{DuplicateDate, DuplicatePolicy, Observation, Series};

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

/// Which columns hold the date and the value, and how duplicates are handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderOptions {
    pub date_column: String,
    pub value_column: String,
    pub duplicates: DuplicatePolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            date_column: "date".to_string(),
            value_column: "value".to_string(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("expected a top-level JSON array of records")]
    NotRecords,
    #[error("missing '{0}' column")]
    MissingColumn(String),
    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },
    #[error("row {row}: cannot parse date '{text}'")]
    BadDate { row: usize, text: String },
    #[error("row {row}: '{text}' is not a finite non-negative number")]
    BadValue { row: usize, text: String },
    #[error(transparent)]
    Duplicate(#[from] DuplicateDate),
    #[error("input has no rows")]
    Empty,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a page view series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one row per date
/// * `.json`    – `[{ "date": "2016-05-09", "value": 1201 }, ...]`
/// * `.parquet` – date column as Utf8/Date32/Date64, numeric value column
pub fn load_file(path: &Path, options: &LoaderOptions) -> Result<Series, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let open = || {
        File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })
    };

    let series = match ext.as_str() {
        "csv" => read_csv(open()?, options),
        "json" => read_json(open()?, options),
        "parquet" | "pq" => read_parquet(open()?, options),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }?;

    if let Some((first, last)) = series.date_range() {
        log::info!(
            "Loaded {} rows from {} ({first} .. {last})",
            series.len(),
            path.display()
        );
    }
    Ok(series)
}

fn finish(rows: Vec<Observation>, options: &LoaderOptions) -> Result<Series, LoadError> {
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(Series::from_observations(rows, options.duplicates)?)
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Parse an ISO date, or the date part of an ISO date-time.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn check_value(value: f64, row: usize, text: impl FnOnce() -> String) -> Result<f64, LoadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(LoadError::BadValue { row, text: text() })
    }
}

fn parse_value(text: &str, row: usize) -> Result<f64, LoadError> {
    let bad = || LoadError::BadValue {
        row,
        text: text.to_string(),
    };
    let value = text.trim().parse::<f64>().map_err(|_| bad())?;
    check_value(value, row, || text.to_string())
}

fn date_cell(text: &str, row: usize) -> Result<NaiveDate, LoadError> {
    parse_date(text).ok_or_else(|| LoadError::BadDate {
        row,
        text: text.to_string(),
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming the date and value columns; other columns
/// are ignored. Rows are numbered from 1 (first row after the header).
pub fn read_csv<R: Read>(input: R, options: &LoaderOptions) -> Result<Series, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };
    let date_idx = column(&options.date_column)?;
    let value_idx = column(&options.value_column)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let date = date_cell(record.get(date_idx).unwrap_or(""), row)?;
        let value = parse_value(record.get(value_idx).unwrap_or(""), row)?;
        rows.push(Observation::new(date, value));
    }

    finish(rows, options)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
/// Values may be numbers or numeric strings.
pub fn read_json<R: Read>(input: R, options: &LoaderOptions) -> Result<Series, LoadError> {
    let root: JsonValue = serde_json::from_reader(input)?;
    let records = root.as_array().ok_or(LoadError::NotRecords)?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let row = i + 1;
        let obj = rec.as_object().ok_or(LoadError::NotRecords)?;

        let date = match obj.get(&options.date_column) {
            Some(JsonValue::String(s)) => date_cell(s, row)?,
            Some(other) => date_cell(&other.to_string(), row)?,
            None => return Err(LoadError::MissingColumn(options.date_column.clone())),
        };
        let value = match obj.get(&options.value_column) {
            Some(JsonValue::Number(n)) => {
                let v = n.as_f64().unwrap_or(f64::NAN);
                check_value(v, row, || n.to_string())?
            }
            Some(JsonValue::String(s)) => parse_value(s, row)?,
            Some(other) => {
                return Err(LoadError::BadValue {
                    row,
                    text: other.to_string(),
                })
            }
            None => return Err(LoadError::MissingColumn(options.value_column.clone())),
        };
        rows.push(Observation::new(date, value));
    }

    finish(rows, options)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), as long as the date column is text or
/// an Arrow date and the value column is an integer or float.
pub fn read_parquet(file: File, options: &LoaderOptions) -> Result<Series, LoadError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let schema = batch.schema();
        let index = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| LoadError::MissingColumn(name.to_string()))
        };
        let dates = batch.column(index(&options.date_column)?);
        let values = batch.column(index(&options.value_column)?);

        let offset = rows.len();
        for i in 0..batch.num_rows() {
            let row = offset + i + 1;
            let date = date_at(dates, i, row, &options.date_column)?;
            let value = value_at(values, i, row, &options.value_column)?;
            rows.push(Observation::new(date, value));
        }
    }

    finish(rows, options)
}

fn unsupported(col: &ArrayRef, column: &str) -> LoadError {
    LoadError::UnsupportedType {
        column: column.to_string(),
        data_type: format!("{:?}", col.data_type()),
    }
}

fn date_at(col: &ArrayRef, i: usize, row: usize, column: &str) -> Result<NaiveDate, LoadError> {
    let null = || LoadError::BadDate {
        row,
        text: "<null>".to_string(),
    };
    if col.is_null(i) {
        return Err(null());
    }
    match col.data_type() {
        DataType::Utf8 => date_cell(col.as_string::<i32>().value(i), row),
        DataType::LargeUtf8 => date_cell(col.as_string::<i64>().value(i), row),
        DataType::Date32 => col.as_primitive::<Date32Type>().value_as_date(i).ok_or_else(null),
        DataType::Date64 => col.as_primitive::<Date64Type>().value_as_date(i).ok_or_else(null),
        _ => Err(unsupported(col, column)),
    }
}

fn value_at(col: &ArrayRef, i: usize, row: usize, column: &str) -> Result<f64, LoadError> {
    if col.is_null(i) {
        return Err(LoadError::BadValue {
            row,
            text: "<null>".to_string(),
        });
    }
    let value = match col.data_type() {
        DataType::Int32 => col.as_primitive::<Int32Type>().value(i) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(i) as f64,
        DataType::Float32 => col.as_primitive::<Float32Type>().value(i) as f64,
        DataType::Float64 => col.as_primitive::<Float64Type>().value(i),
        _ => return Err(unsupported(col, column)),
    };
    check_value(value, row, || value.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use pretty_assertions::assert_eq;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn csv(text: &str) -> Result<Series, LoadError> {
        read_csv(text.as_bytes(), &LoaderOptions::default())
    }

    fn pairs(series: &Series) -> Vec<(NaiveDate, f64)> {
        series.observations().iter().map(|o| (o.date, o.value)).collect()
    }

    #[test]
    fn csv_rows_are_sorted_by_date() {
        let series = csv("date,value\n2016-05-11,1716\n2016-05-09,1201\n2016-05-10,2329\n").unwrap();
        assert_eq!(
            pairs(&series),
            vec![
                (d(2016, 5, 9), 1201.0),
                (d(2016, 5, 10), 2329.0),
                (d(2016, 5, 11), 1716.0),
            ]
        );
    }

    #[test]
    fn csv_columns_may_be_reordered_and_extra() {
        let series = csv("value,note,date\n10,a,2019-01-02\n20, b ,2019-01-01T00:00:00\n").unwrap();
        assert_eq!(pairs(&series), vec![(d(2019, 1, 1), 20.0), (d(2019, 1, 2), 10.0)]);
    }

    #[test]
    fn csv_custom_column_names() {
        let options = LoaderOptions {
            date_column: "day".into(),
            value_column: "views".into(),
            ..LoaderOptions::default()
        };
        let series = read_csv("day,views\n2018-03-04,5\n".as_bytes(), &options).unwrap();
        assert_eq!(pairs(&series), vec![(d(2018, 3, 4), 5.0)]);
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let err = csv("date,views\n2016-05-09,1\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "value"));
    }

    #[test]
    fn csv_unparsable_date_reports_row() {
        let err = csv("date,value\n2016-05-09,1\n09/05/2016,2\n").unwrap_err();
        assert!(matches!(err, LoadError::BadDate { row: 2, ref text } if text == "09/05/2016"));
    }

    #[test]
    fn csv_negative_or_non_numeric_value_is_an_error() {
        assert!(matches!(
            csv("date,value\n2016-05-09,-3\n").unwrap_err(),
            LoadError::BadValue { row: 1, .. }
        ));
        assert!(matches!(
            csv("date,value\n2016-05-09,lots\n").unwrap_err(),
            LoadError::BadValue { row: 1, .. }
        ));
    }

    #[test]
    fn csv_duplicate_dates_follow_policy() {
        let text = "date,value\n2016-05-09,1\n2016-05-10,2\n2016-05-09,3\n";
        assert!(matches!(
            csv(text).unwrap_err(),
            LoadError::Duplicate(DuplicateDate(date)) if date == d(2016, 5, 9)
        ));

        let options = LoaderOptions {
            duplicates: DuplicatePolicy::KeepLast,
            ..LoaderOptions::default()
        };
        let series = read_csv(text.as_bytes(), &options).unwrap();
        assert_eq!(pairs(&series), vec![(d(2016, 5, 9), 3.0), (d(2016, 5, 10), 2.0)]);
    }

    #[test]
    fn header_only_input_is_empty() {
        assert!(matches!(csv("date,value\n").unwrap_err(), LoadError::Empty));
    }

    #[test]
    fn json_records_with_numbers_and_strings() {
        let text = r#"[
            {"date": "2016-05-10", "value": 2329},
            {"date": "2016-05-09", "value": "1201"}
        ]"#;
        let series = read_json(text.as_bytes(), &LoaderOptions::default()).unwrap();
        assert_eq!(pairs(&series), vec![(d(2016, 5, 9), 1201.0), (d(2016, 5, 10), 2329.0)]);
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let err = read_json(r#"{"date": "2016-05-09"}"#.as_bytes(), &LoaderOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::NotRecords));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.CSV");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "date,value\n2016-05-09,1201").unwrap();
        drop(file);

        let series = load_file(&path, &LoaderOptions::default()).unwrap();
        assert_eq!(series.len(), 1);

        let err = load_file(&dir.path().join("views.xlsx"), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ref e) if e == "xlsx"));

        let err = load_file(&dir.path().join("absent.csv"), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    fn write_parquet(path: &Path, schema: Schema, columns: Vec<ArrayRef>) {
        let schema = Arc::new(schema);
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_with_text_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.parquet");
        write_parquet(
            &path,
            Schema::new(vec![
                Field::new("date", DataType::Utf8, false),
                Field::new("value", DataType::Int64, false),
            ]),
            vec![
                Arc::new(StringArray::from(vec!["2016-05-10", "2016-05-09"])),
                Arc::new(Int64Array::from(vec![2329, 1201])),
            ],
        );

        let series = load_file(&path, &LoaderOptions::default()).unwrap();
        assert_eq!(pairs(&series), vec![(d(2016, 5, 9), 1201.0), (d(2016, 5, 10), 2329.0)]);
    }

    #[test]
    fn parquet_with_date32_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.pq");
        // days since 1970-01-01
        let may_9 = (d(2016, 5, 9) - d(1970, 1, 1)).num_days() as i32;
        write_parquet(
            &path,
            Schema::new(vec![
                Field::new("date", DataType::Date32, false),
                Field::new("value", DataType::Int64, false),
            ]),
            vec![
                Arc::new(Date32Array::from(vec![may_9, may_9 + 1])),
                Arc::new(Int64Array::from(vec![1201, 2329])),
            ],
        );

        let series = load_file(&path, &LoaderOptions::default()).unwrap();
        assert_eq!(pairs(&series), vec![(d(2016, 5, 9), 1201.0), (d(2016, 5, 10), 2329.0)]);
    }

    #[test]
    fn parquet_missing_value_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("views.parquet");
        write_parquet(
            &path,
            Schema::new(vec![Field::new("date", DataType::Utf8, false)]),
            vec![Arc::new(StringArray::from(vec!["2016-05-09"]))],
        );

        let err = load_file(&path, &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "value"));
    }
}
