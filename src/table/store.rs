// src/table/store.rs

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::str::FromStr;
use std::sync::Arc;
use std::{fs, fs::File, path::Path};

use crate::table::{BirthTotal, Gender, NationalRow, StateRow};

/// The year column persists as Arrow `Date32` (January 1 of the year),
/// matching the year-granularity date contract of the in-memory tables.
fn year_to_days(year: i32) -> Result<i32> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| anyhow!("year {} is out of range for Date32", year))?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
    Ok((date - epoch).num_days() as i32)
}

fn days_to_year(days: i32) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
    (epoch + chrono::Duration::days(days as i64)).year()
}

/// Write one batch to `path` atomically: to a `.tmp` sibling first, then
/// rename over the final name.
fn write_batch(path: &Path, schema: Arc<Schema>, batch: RecordBatch) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .with_context(|| format!("opening Parquet writer for {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("writing batch to {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing Parquet writer for {}", path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
    Ok(())
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading Parquet metadata from {}", path.display()))?
        .build()
        .with_context(|| format!("building Parquet reader for {}", path.display()))?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.with_context(|| format!("decoding batch from {}", path.display()))?);
    }
    Ok(batches)
}

fn column<'a, T: std::any::Any>(batch: &'a RecordBatch, idx: usize, name: &str) -> Result<&'a T> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column {} has an unexpected Arrow type", name))
}

pub fn write_totals(path: &Path, rows: &[BirthTotal]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Date32, false),
        Field::new("male", DataType::UInt64, false),
        Field::new("female", DataType::UInt64, false),
        Field::new("total", DataType::UInt64, false),
    ]));
    let years = rows
        .iter()
        .map(|r| year_to_days(r.year))
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(years)),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.male).collect::<Vec<_>>())),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.female).collect::<Vec<_>>())),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.total).collect::<Vec<_>>())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building totals batch")?;
    write_batch(path, schema, batch)
}

pub fn read_totals(path: &Path) -> Result<Vec<BirthTotal>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let year = column::<Date32Array>(&batch, 0, "year")?;
        let male = column::<UInt64Array>(&batch, 1, "male")?;
        let female = column::<UInt64Array>(&batch, 2, "female")?;
        let total = column::<UInt64Array>(&batch, 3, "total")?;
        for i in 0..batch.num_rows() {
            rows.push(BirthTotal {
                year: days_to_year(year.value(i)),
                male: male.value(i),
                female: female.value(i),
                total: total.value(i),
            });
        }
    }
    Ok(rows)
}

pub fn write_national(path: &Path, rows: &[NationalRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("n", DataType::UInt64, false),
        Field::new("year", DataType::Date32, false),
        Field::new("f", DataType::Float64, false),
        Field::new("rank", DataType::UInt32, false),
    ]));
    let years = rows
        .iter()
        .map(|r| year_to_days(r.year))
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.gender.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.n).collect::<Vec<_>>())),
        Arc::new(Date32Array::from(years)),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.f).collect::<Vec<_>>())),
        Arc::new(UInt32Array::from(rows.iter().map(|r| r.rank).collect::<Vec<_>>())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building national batch")?;
    write_batch(path, schema, batch)
}

pub fn read_national(path: &Path) -> Result<Vec<NationalRow>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let name = column::<StringArray>(&batch, 0, "name")?;
        let gender = column::<StringArray>(&batch, 1, "gender")?;
        let n = column::<UInt64Array>(&batch, 2, "n")?;
        let year = column::<Date32Array>(&batch, 3, "year")?;
        let f = column::<Float64Array>(&batch, 4, "f")?;
        let rank = column::<UInt32Array>(&batch, 5, "rank")?;
        for i in 0..batch.num_rows() {
            rows.push(NationalRow {
                name: name.value(i).to_string(),
                gender: Gender::from_str(gender.value(i))?,
                n: n.value(i),
                year: days_to_year(year.value(i)),
                f: f.value(i),
                rank: rank.value(i),
            });
        }
    }
    Ok(rows)
}

pub fn write_state(path: &Path, rows: &[StateRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("state", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("year", DataType::Date32, false),
        Field::new("n", DataType::UInt64, false),
        Field::new("f", DataType::Float64, false),
        Field::new("rank", DataType::UInt32, false),
    ]));
    let years = rows
        .iter()
        .map(|r| year_to_days(r.year))
        .collect::<Result<Vec<_>>>()?;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.state.clone()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.gender.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Date32Array::from(years)),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.n).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.f).collect::<Vec<_>>())),
        Arc::new(UInt32Array::from(rows.iter().map(|r| r.rank).collect::<Vec<_>>())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building state batch")?;
    write_batch(path, schema, batch)
}

pub fn read_state(path: &Path) -> Result<Vec<StateRow>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let state = column::<StringArray>(&batch, 0, "state")?;
        let name = column::<StringArray>(&batch, 1, "name")?;
        let gender = column::<StringArray>(&batch, 2, "gender")?;
        let year = column::<Date32Array>(&batch, 3, "year")?;
        let n = column::<UInt64Array>(&batch, 4, "n")?;
        let f = column::<Float64Array>(&batch, 5, "f")?;
        let rank = column::<UInt32Array>(&batch, 6, "rank")?;
        for i in 0..batch.num_rows() {
            rows.push(StateRow {
                state: state.value(i).to_string(),
                name: name.value(i).to_string(),
                gender: Gender::from_str(gender.value(i))?,
                year: days_to_year(year.value(i)),
                n: n.value(i),
                f: f.value(i),
                rank: rank.value(i),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn totals_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("totals.parquet");
        let rows = vec![
            BirthTotal {
                year: 1880,
                male: 118_399,
                female: 97_606,
                total: 216_005,
            },
            BirthTotal {
                year: 1990,
                male: 2_052_391,
                female: 1_951_936,
                total: 4_004_327,
            },
        ];
        write_totals(&path, &rows)?;
        assert_eq!(read_totals(&path)?, rows);
        Ok(())
    }

    #[test]
    fn national_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("national.parquet");
        let rows = vec![
            NationalRow {
                name: "Alex".into(),
                gender: Gender::M,
                n: 60,
                year: 1990,
                f: 0.6,
                rank: 1,
            },
            NationalRow {
                name: "Sam".into(),
                gender: Gender::M,
                n: 40,
                year: 1990,
                f: 0.4,
                rank: 2,
            },
        ];
        write_national(&path, &rows)?;
        assert_eq!(read_national(&path)?, rows);
        Ok(())
    }

    #[test]
    fn state_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.parquet");
        let rows = vec![StateRow {
            state: "AK".into(),
            name: "Mary".into(),
            gender: Gender::F,
            year: 1950,
            n: 14,
            f: 0.5,
            rank: 1,
        }];
        write_state(&path, &rows)?;
        assert_eq!(read_state(&path)?, rows);
        Ok(())
    }

    #[test]
    fn pre_epoch_years_survive() -> Result<()> {
        // SSA data starts in 1880, well before the Date32 epoch.
        let dir = tempdir()?;
        let path = dir.path().join("totals.parquet");
        let rows = vec![BirthTotal {
            year: 1880,
            male: 1,
            female: 1,
            total: 2,
        }];
        write_totals(&path, &rows)?;
        assert_eq!(read_totals(&path)?[0].year, 1880);
        Ok(())
    }

    #[test]
    fn no_tmp_file_left_behind() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("totals.parquet");
        write_totals(
            &path,
            &[BirthTotal {
                year: 2000,
                male: 1,
                female: 1,
                total: 2,
            }],
        )?;
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }
}
