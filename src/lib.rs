//! Scraper and query layer for the US Social Security Administration's
//! published baby-name statistics.
//!
//! The pipeline fetches three sources (an HTML page of annual birth totals,
//! a national name-count archive, and a per-state archive), normalizes them
//! into typed tables, and caches each as a Parquet file so later runs never
//! touch the network. On top of the loaded tables sit a slicing function,
//! a name generator, and history plotting.

pub mod dataset;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod ingest;
pub mod plot;
pub mod slice;
pub mod table;

pub use dataset::{DataConfig, SsaData};
pub use error::Error;
pub use generate::generate_names;
pub use plot::{history_plot, HistoryMetric, PlotOptions};
pub use slice::{slice_names, SliceOptions};
pub use table::{BirthTotal, Gender, NameRecord, NationalRow, StateRow};
