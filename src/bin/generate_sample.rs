use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Per-species population: (mean, std-dev) of each measurement.
struct Species {
    name: &'static str,
    count: usize,
    islands: &'static [&'static str],
    bill_length: (f64, f64),
    bill_depth: (f64, f64),
    flipper_length: (f64, f64),
    body_mass: (f64, f64),
}

const SPECIES: [Species; 3] = [
    Species {
        name: "Adelie",
        count: 152,
        islands: &["Torgersen", "Biscoe", "Dream"],
        bill_length: (38.8, 2.7),
        bill_depth: (18.3, 1.2),
        flipper_length: (190.0, 6.5),
        body_mass: (3700.0, 460.0),
    },
    Species {
        name: "Chinstrap",
        count: 68,
        islands: &["Dream"],
        bill_length: (48.8, 3.3),
        bill_depth: (18.4, 1.1),
        flipper_length: (196.0, 7.1),
        body_mass: (3733.0, 384.0),
    },
    Species {
        name: "Gentoo",
        count: 124,
        islands: &["Biscoe"],
        bill_length: (47.5, 3.1),
        bill_depth: (15.0, 1.0),
        flipper_length: (217.0, 6.5),
        body_mass: (5076.0, 504.0),
    },
];

/// One generated row; `None` marks a missing measurement.
struct Row {
    species: &'static str,
    island: &'static str,
    bill_length_mm: Option<f64>,
    bill_depth_mm: Option<f64>,
    flipper_length_mm: Option<f64>,
    body_mass_g: Option<f64>,
    sex: Option<&'static str>,
    year: i64,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for sp in &SPECIES {
        for i in 0..sp.count {
            // Roughly one bird in forty was not measured.
            let measured = rng.next_f64() > 0.025;
            let round1 = |v: f64| (v * 10.0).round() / 10.0;
            let mut sample = |(mean, sd): (f64, f64), round: fn(f64) -> f64| {
                measured.then(|| round(rng.gauss(mean, sd)))
            };

            let bill_length_mm = sample(sp.bill_length, round1);
            let bill_depth_mm = sample(sp.bill_depth, round1);
            let flipper_length_mm = sample(sp.flipper_length, f64::round);
            let body_mass_g = sample(sp.body_mass, |v: f64| (v / 25.0).round() * 25.0);

            rows.push(Row {
                species: sp.name,
                island: rng.pick(sp.islands),
                bill_length_mm,
                bill_depth_mm,
                flipper_length_mm,
                body_mass_g,
                sex: measured.then(|| ["male", "female"][i % 2]),
                year: 2007 + (i % 3) as i64,
            });
        }
    }
    rows
}

const HEADERS: [&str; 8] = [
    "species",
    "island",
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
    "sex",
    "year",
];

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let fmt = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| v.to_string());

    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record([
            row.species.to_string(),
            row.island.to_string(),
            fmt(row.bill_length_mm),
            fmt(row.bill_depth_mm),
            fmt(row.flipper_length_mm),
            fmt(row.body_mass_g),
            row.sex.unwrap_or("NA").to_string(),
            row.year.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> Option<&str>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<StringArray>())
    };
    let number = |f: fn(&Row) -> Option<f64>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<Float64Array>())
    };

    let columns: Vec<ArrayRef> = vec![
        text(|r| Some(r.species)),
        text(|r| Some(r.island)),
        number(|r| r.bill_length_mm),
        number(|r| r.bill_depth_mm),
        number(|r| r.flipper_length_mm),
        number(|r| r.body_mass_g),
        text(|r| r.sex),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
    ];

    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Utf8, false),
        Field::new(HEADERS[2], DataType::Float64, true),
        Field::new(HEADERS[3], DataType::Float64, true),
        Field::new(HEADERS[4], DataType::Float64, true),
        Field::new(HEADERS[5], DataType::Float64, true),
        Field::new(HEADERS[6], DataType::Utf8, true),
        Field::new(HEADERS[7], DataType::Int64, false),
    ]));

    let batch =
        RecordBatch::try_new(schema.clone(), columns).context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    write_csv("penguins.csv", &rows)?;
    write_parquet("penguins.parquet", &rows)?;

    println!(
        "Wrote {} penguins to penguins.csv and penguins.parquet",
        rows.len()
    );
    Ok(())
}
