// src/dataset.rs

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::ingest;
use crate::ingest::totals::default_header_renames;
use crate::table::{store, BirthTotal, NationalRow, StateRow};

/// Where the cache files live. Non-data zip entries are extracted into
/// `data_dir` alongside the caches.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub totals_file: String,
    pub national_file: String,
    pub state_file: String,
    /// Re-fetch everything even when the caches exist.
    pub refresh: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            totals_file: "birth_totals.parquet".to_string(),
            national_file: "birth_US_national.parquet".to_string(),
            state_file: "birth_US_state.parquet".to_string(),
            refresh: false,
        }
    }
}

impl DataConfig {
    pub fn totals_path(&self) -> PathBuf {
        self.data_dir.join(&self.totals_file)
    }

    pub fn national_path(&self) -> PathBuf {
        self.data_dir.join(&self.national_file)
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }
}

/// The three loaded SSA tables. Construction runs the whole ingestion
/// pipeline in order (totals, then national which depends on it, then
/// state) and fails outright if any step does; there is no partially
/// constructed dataset. With warm caches no network request is made.
pub struct SsaData {
    pub totals: Vec<BirthTotal>,
    pub national: Vec<NationalRow>,
    pub state: Vec<StateRow>,
}

impl SsaData {
    pub fn new(config: &DataConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {}", config.data_dir.display()))?;
        let client = Client::new();

        ingest::ensure_totals(
            &client,
            &config.totals_path(),
            &default_header_renames(),
            config.refresh,
        )?;
        let totals = store::read_totals(&config.totals_path())?;

        ingest::ensure_national(
            &client,
            &config.national_path(),
            &totals,
            &config.data_dir,
            config.refresh,
        )?;
        let national = store::read_national(&config.national_path())?;

        ingest::ensure_state(
            &client,
            &config.state_path(),
            &config.data_dir,
            config.refresh,
        )?;
        let state = store::read_state(&config.state_path())?;

        info!(
            totals = totals.len(),
            national = national.len(),
            state = state.len(),
            "dataset loaded"
        );
        Ok(Self {
            totals,
            national,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Gender;
    use tempfile::tempdir;

    fn seeded_config() -> Result<(tempfile::TempDir, DataConfig)> {
        let dir = tempdir()?;
        let config = DataConfig {
            data_dir: dir.path().to_path_buf(),
            ..DataConfig::default()
        };
        store::write_totals(
            &config.totals_path(),
            &[BirthTotal {
                year: 1990,
                male: 100,
                female: 90,
                total: 190,
            }],
        )?;
        store::write_national(
            &config.national_path(),
            &[NationalRow {
                name: "Alex".into(),
                gender: Gender::M,
                n: 60,
                year: 1990,
                f: 0.6,
                rank: 1,
            }],
        )?;
        store::write_state(
            &config.state_path(),
            &[StateRow {
                state: "AK".into(),
                name: "Mary".into(),
                gender: Gender::F,
                year: 1990,
                n: 14,
                f: 1.0,
                rank: 1,
            }],
        )?;
        Ok((dir, config))
    }

    #[test]
    fn warm_caches_load_without_fetching() -> Result<()> {
        let (_dir, config) = seeded_config()?;
        // all three caches exist, so construction must not hit the network
        let data = SsaData::new(&config)?;
        assert_eq!(data.totals.len(), 1);
        assert_eq!(data.national.len(), 1);
        assert_eq!(data.state.len(), 1);
        assert_eq!(data.national[0].name, "Alex");
        assert_eq!(data.state[0].state, "AK");
        Ok(())
    }

    #[test]
    fn loads_from_relocated_caches() -> Result<()> {
        let (_dir, mut config) = seeded_config()?;
        let nested = config.data_dir.join("nested");
        fs::create_dir_all(&nested)?;
        fs::rename(&config.totals_path(), nested.join(&config.totals_file))?;
        fs::rename(&config.national_path(), nested.join(&config.national_file))?;
        fs::rename(&config.state_path(), nested.join(&config.state_file))?;
        config.data_dir = nested;
        assert!(SsaData::new(&config).is_ok());
        Ok(())
    }
}
