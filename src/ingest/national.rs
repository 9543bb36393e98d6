// src/ingest/national.rs

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use std::io::{Cursor, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use zip::ZipArchive;

use crate::error::Error;
use crate::fetch;
use crate::ingest::{extract_raw_entry, national_url};
use crate::table::{rank, store, BirthTotal, Gender, NationalRow};

/// Data entries in the national archive are named `yob<YYYY>.txt`.
static YOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^yob(\d{4})\.txt$").expect("yob pattern should parse"));

/// Download and normalize the national name archive, caching the result
/// as Parquet at `cache_path`. The totals table must already be loaded;
/// each row's `f` divides its count by that year's total births for the
/// gender. Non-data archive entries are extracted to `raw_dir`.
pub fn ensure_national(
    client: &Client,
    cache_path: &Path,
    totals: &[BirthTotal],
    raw_dir: &Path,
    force: bool,
) -> Result<()> {
    if cache_path.exists() && !force {
        return Ok(());
    }
    info!("fetching national level data of US baby names");
    let bytes = fetch::get_bytes(client, national_url()?.as_str())?;
    let rows = parse_national_archive(&bytes, totals, raw_dir)?;
    store::write_national(cache_path, &rows)
}

/// Parse the `names.zip` payload into enriched national rows.
pub fn parse_national_archive(
    bytes: &[u8],
    totals: &[BirthTotal],
    raw_dir: &Path,
) -> Result<Vec<NationalRow>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("reading national names archive")?;
    let mut rows = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("reading archive entry #{}", i))?;
        let entry_name = entry.name().to_string();

        let year = match YOB_RE.captures(&entry_name) {
            Some(caps) => caps[1]
                .parse::<i32>()
                .with_context(|| format!("year in entry name {:?}", entry_name))?,
            None => {
                extract_raw_entry(&entry_name, &mut entry, raw_dir)?;
                continue;
            }
        };

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("reading {} into memory", entry_name))?;
        rows.extend(
            parse_year_file(&buf, year, totals)
                .with_context(|| format!("parsing {}", entry_name))?,
        );
    }
    if rows.is_empty() {
        return Err(Error::EmptyArchive.into());
    }
    Ok(rows)
}

/// One `yob<YYYY>.txt` file: headerless CSV of (name, gender, n). Rows
/// are grouped by gender, then enriched with the gender-fraction `f` and
/// the minimum-rank popularity rank.
fn parse_year_file(data: &[u8], year: i32, totals: &[BirthTotal]) -> Result<Vec<NationalRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(data));

    let mut raw: Vec<(String, Gender, u64)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("CSV parse error at record {}", idx))?;
        let name = record
            .get(0)
            .ok_or_else(|| anyhow!("record {} has no name field", idx))?;
        let gender = Gender::from_str(
            record
                .get(1)
                .ok_or_else(|| anyhow!("record {} has no gender field", idx))?
                .trim(),
        )?;
        let n = record
            .get(2)
            .ok_or_else(|| anyhow!("record {} has no count field", idx))?
            .trim()
            .parse::<u64>()
            .with_context(|| format!("count field at record {}", idx))?;
        raw.push((name.trim().to_string(), gender, n));
    }

    let mut rows = Vec::new();
    for gender in Gender::BOTH {
        let group: Vec<&(String, Gender, u64)> =
            raw.iter().filter(|r| r.1 == gender).collect();
        if group.is_empty() {
            continue;
        }
        let yearly_total = totals
            .iter()
            .find(|t| t.year == year)
            .map(|t| t.count_for(gender))
            .ok_or(Error::MissingYearlyTotal { year, gender })?;
        let counts: Vec<u64> = group.iter().map(|r| r.2).collect();
        let ranks = rank::min_rank_desc(&counts);
        for ((name, _, n), rank) in group.into_iter().zip(ranks) {
            rows.push(NationalRow {
                name: name.clone(),
                gender,
                n: *n,
                year,
                f: *n as f64 / yearly_total as f64,
                rank,
            });
        }
    }
    Ok(rows)
}
