use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, Weekday};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Write a synthetic daily page view series shaped like the freeCodeCamp forum data.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output CSV path
    #[arg(short, long, default_value = "fcc-forum-pageviews.csv")]
    out: PathBuf,

    /// Also write a Parquet copy next to the CSV
    #[arg(long)]
    parquet: bool,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Serialize)]
struct Row {
    date: String,
    value: i64,
}

/// Relative traffic per calendar month, January first.
const SEASONALITY: [f64; 12] = [
    1.05, 1.00, 1.08, 0.96, 0.90, 0.86, 0.94, 1.00, 1.02, 1.15, 1.06, 0.95,
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Expected views for `date`: saturating growth, seasonality, weekend dip.
fn baseline(date: NaiveDate, start: NaiveDate) -> f64 {
    let years = (date - start).num_days() as f64 / 365.25;
    let growth = 9_000.0 + 140_000.0 * (1.0 - (-years / 1.8).exp());
    let weekend = match date.weekday() {
        Weekday::Sat | Weekday::Sun => 0.78,
        _ => 1.0,
    };
    growth * SEASONALITY[date.month0() as usize] * weekend
}

fn generate(rng: &mut SimpleRng, start: NaiveDate, end: NaiveDate) -> Vec<Row> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let mut value = baseline(date, start) * rng.gauss(0.0, 0.18).exp();
            // occasional traffic spikes and outages, trimmed later as outliers
            let roll = rng.next_f64();
            if roll < 0.012 {
                value *= 3.0 + 5.0 * rng.next_f64();
            } else if roll < 0.024 {
                value *= 0.05 + 0.2 * rng.next_f64();
            }
            Row {
                date: date.format("%Y-%m-%d").to_string(),
                value: value.round().max(0.0) as i64,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("value", DataType::Int64, false),
    ]));
    let dates = StringArray::from(rows.iter().map(|r| r.date.as_str()).collect::<Vec<_>>());
    let values = Int64Array::from(rows.iter().map(|r| r.value).collect::<Vec<_>>());
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(dates), Arc::new(values)])?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let start = NaiveDate::from_ymd_opt(2016, 5, 9).context("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2019, 12, 3).context("invalid end date")?;

    let mut rng = SimpleRng::new(args.seed);
    let rows = generate(&mut rng, start, end);

    write_csv(&args.out, &rows)?;
    println!("Wrote {} days ({start} .. {end}) to {}", rows.len(), args.out.display());

    if args.parquet {
        let path = args.out.with_extension("parquet");
        write_parquet(&path, &rows)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
