// src/ingest/mod.rs

pub mod national;
pub mod state;
pub mod totals;

pub use national::ensure_national;
pub use state::ensure_state;
pub use totals::ensure_totals;

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::info;
use url::Url;

/// All three endpoints live under one SSA domain; no auth, no pagination.
pub const SSA_BASE_URL: &str = "https://www.ssa.gov/oact/babynames/";

pub fn totals_url() -> Result<Url> {
    Ok(Url::parse(SSA_BASE_URL)?.join("numberUSbirths.html")?)
}

pub fn national_url() -> Result<Url> {
    Ok(Url::parse(SSA_BASE_URL)?.join("names.zip")?)
}

pub fn state_url() -> Result<Url> {
    Ok(Url::parse(SSA_BASE_URL)?.join("state/namesbystate.zip")?)
}

/// Copy a zip entry that is not a data file (readme, pdfs) out to
/// `raw_dir`. The SSA archives ship flat, so the entry name is used as-is.
pub(crate) fn extract_raw_entry<R: Read>(name: &str, entry: &mut R, raw_dir: &Path) -> Result<()> {
    let dest = raw_dir.join(name);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut out =
        File::create(&dest).with_context(|| format!("creating {}", dest.display()))?;
    std::io::copy(entry, &mut out)
        .with_context(|| format!("extracting {} to {}", name, dest.display()))?;
    info!(entry = %name, dest = %dest.display(), "extracted non-data entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_cleanly() -> Result<()> {
        assert_eq!(
            totals_url()?.as_str(),
            "https://www.ssa.gov/oact/babynames/numberUSbirths.html"
        );
        assert_eq!(
            national_url()?.as_str(),
            "https://www.ssa.gov/oact/babynames/names.zip"
        );
        assert_eq!(
            state_url()?.as_str(),
            "https://www.ssa.gov/oact/babynames/state/namesbystate.zip"
        );
        Ok(())
    }
}
