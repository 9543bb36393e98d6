// src/ingest/totals.rs

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::fetch;
use crate::ingest::totals_url;
use crate::table::{store, BirthTotal};

static TH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("th selector should parse"));
static TR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("tr selector should parse"));
static TD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("td selector should parse"));

/// Renames from the SSA table headers to our column names.
pub fn default_header_renames() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("Year of birth", "year"),
        ("Male", "male"),
        ("Female", "female"),
        ("Total", "total"),
    ])
}

/// Scrape the SSA table of total US births per year and cache it as
/// Parquet at `cache_path`. No-op when the cache already exists, unless
/// `force` is set.
pub fn ensure_totals(
    client: &Client,
    cache_path: &Path,
    header_renames: &HashMap<&str, &str>,
    force: bool,
) -> Result<()> {
    if cache_path.exists() && !force {
        return Ok(());
    }
    info!("fetching totals by year of US baby names");
    let body = fetch::get_bytes(client, totals_url()?.as_str())?;
    let html = String::from_utf8_lossy(&body);
    let rows = parse_totals_html(&html, header_renames)?;
    store::write_totals(cache_path, &rows)
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Count cells carry thousands separators ("2,052,391").
fn parse_count(s: &str) -> Result<u64> {
    s.trim()
        .replace(',', "")
        .parse::<u64>()
        .with_context(|| format!("numeric cell {:?}", s))
}

/// Parse the totals page: a single table with a `th` header row followed
/// by data rows. Missing headers or non-numeric cells are fatal.
pub fn parse_totals_html(
    html: &str,
    header_renames: &HashMap<&str, &str>,
) -> Result<Vec<BirthTotal>> {
    let doc = Html::parse_document(html);

    let headers: Vec<String> = doc
        .select(&TH_SELECTOR)
        .map(|th| {
            let raw = cell_text(th);
            header_renames
                .get(raw.as_str())
                .map(|renamed| renamed.to_string())
                .unwrap_or(raw)
        })
        .collect();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("totals table has no {:?} column (headers: {:?})", name, headers))
    };
    let year_idx = position("year")?;
    let male_idx = position("male")?;
    let female_idx = position("female")?;
    let total_idx = position("total")?;

    let mut rows = Vec::new();
    for (i, tr) in doc.select(&TR_SELECTOR).enumerate() {
        if i == 0 {
            // header row
            continue;
        }
        let cells: Vec<String> = tr.select(&TD_SELECTOR).map(cell_text).collect();
        if cells.len() != headers.len() {
            return Err(anyhow!(
                "totals row {} has {} cells, expected {}",
                i,
                cells.len(),
                headers.len()
            ));
        }
        rows.push(BirthTotal {
            year: cells[year_idx]
                .parse::<i32>()
                .with_context(|| format!("year cell {:?}", cells[year_idx]))?,
            male: parse_count(&cells[male_idx])?,
            female: parse_count(&cells[female_idx])?,
            total: parse_count(&cells[total_idx])?,
        });
    }
    if rows.is_empty() {
        return Err(anyhow!("totals page had no data rows"));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body><table>
        <tr><th>Year of birth</th><th>Male</th><th>Female</th><th>Total</th></tr>
        <tr><td>1990</td><td>2,052,391</td><td>1,951,936</td><td>4,004,327</td></tr>
        <tr><td>1991</td><td>2,018,236</td><td>1,923,947</td><td>3,942,183</td></tr>
        </table></body></html>"#;

    #[test]
    fn parses_table_with_renamed_headers() -> Result<()> {
        let rows = parse_totals_html(PAGE, &default_header_renames())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            BirthTotal {
                year: 1990,
                male: 2_052_391,
                female: 1_951_936,
                total: 4_004_327,
            }
        );
        assert_eq!(rows[1].year, 1991);
        Ok(())
    }

    #[test]
    fn missing_header_is_fatal() {
        let page = PAGE.replace("Year of birth", "Some other label");
        let err = parse_totals_html(&page, &default_header_renames()).unwrap_err();
        assert!(err.to_string().contains("year"));
    }

    #[test]
    fn non_numeric_cell_is_fatal() {
        let page = PAGE.replace("2,052,391", "n/a");
        assert!(parse_totals_html(&page, &default_header_renames()).is_err());
    }

    #[test]
    fn page_without_rows_is_fatal() {
        let page = r#"<table><tr><th>Year of birth</th><th>Male</th>
            <th>Female</th><th>Total</th></tr></table>"#;
        assert!(parse_totals_html(page, &default_header_renames()).is_err());
    }
}
