// src/ingest/state.rs

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use reqwest::blocking::Client;
use std::io::{Cursor, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use zip::ZipArchive;

use crate::error::Error;
use crate::fetch;
use crate::ingest::{extract_raw_entry, state_url};
use crate::table::{rank, store, Gender, StateRow};

/// State data entries are named `<XX>.TXT`, two-letter state code plus
/// the fixed extension, six characters total.
fn is_state_entry(name: &str) -> bool {
    name.len() == 6 && name.ends_with(".TXT")
}

/// Download and normalize the per-state name archive, caching the result
/// as Parquet at `cache_path`. Unlike the national table there is no
/// totals dependency: `f` divides by the summed occurrences within each
/// (state, gender, year) group, an approximation that undercounts true
/// births since the SSA omits names with fewer than five occurrences.
pub fn ensure_state(client: &Client, cache_path: &Path, raw_dir: &Path, force: bool) -> Result<()> {
    if cache_path.exists() && !force {
        return Ok(());
    }
    info!("fetching state level data of US baby names");
    let bytes = fetch::get_bytes(client, state_url()?.as_str())?;
    let rows = parse_state_archive(&bytes, raw_dir)?;
    store::write_state(cache_path, &rows)
}

/// Parse the `namesbystate.zip` payload into enriched state rows.
pub fn parse_state_archive(bytes: &[u8], raw_dir: &Path) -> Result<Vec<StateRow>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("reading state names archive")?;
    let mut rows = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("reading archive entry #{}", i))?;
        let entry_name = entry.name().to_string();

        if !is_state_entry(&entry_name) {
            extract_raw_entry(&entry_name, &mut entry, raw_dir)?;
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("reading {} into memory", entry_name))?;
        rows.extend(
            parse_state_file(&buf).with_context(|| format!("parsing {}", entry_name))?,
        );
    }
    if rows.is_empty() {
        return Err(Error::EmptyArchive.into());
    }
    Ok(rows)
}

/// One `<XX>.TXT` file: headerless CSV of (state, gender, year, name, n),
/// grouped by (gender, year) for the fraction and rank computation.
fn parse_state_file(data: &[u8]) -> Result<Vec<StateRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(data));

    let mut raw: Vec<(String, Gender, i32, String, u64)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("CSV parse error at record {}", idx))?;
        let field = |col: usize, what: &str| {
            record
                .get(col)
                .map(str::trim)
                .ok_or_else(|| anyhow!("record {} has no {} field", idx, what))
        };
        let state = field(0, "state")?.to_string();
        let gender = Gender::from_str(field(1, "gender")?)?;
        let year = field(2, "year")?
            .parse::<i32>()
            .with_context(|| format!("year field at record {}", idx))?;
        let name = field(3, "name")?.to_string();
        let n = field(4, "count")?
            .parse::<u64>()
            .with_context(|| format!("count field at record {}", idx))?;
        raw.push((state, gender, year, name, n));
    }

    // years in order of first appearance, as grouping keys
    let mut years: Vec<i32> = Vec::new();
    for r in &raw {
        if !years.contains(&r.2) {
            years.push(r.2);
        }
    }

    let mut rows = Vec::new();
    for gender in Gender::BOTH {
        for &year in &years {
            let group: Vec<&(String, Gender, i32, String, u64)> = raw
                .iter()
                .filter(|r| r.1 == gender && r.2 == year)
                .collect();
            if group.is_empty() {
                continue;
            }
            // close-enough denominator; true per-state totals are not published
            let group_total: u64 = group.iter().map(|r| r.4).sum();
            let counts: Vec<u64> = group.iter().map(|r| r.4).collect();
            let ranks = rank::min_rank_desc(&counts);
            for ((state, _, _, name, n), rank) in group.into_iter().zip(ranks) {
                rows.push(StateRow {
                    state: state.clone(),
                    name: name.clone(),
                    gender,
                    year,
                    n: *n,
                    f: *n as f64 / group_total as f64,
                    rank,
                });
            }
        }
    }
    Ok(rows)
}
