use crate::table::Gender;
use thiserror::Error;

/// Conditions the pipeline reports with a distinct shape rather than a
/// bare string. Everything else travels as `anyhow::Error` context.
#[derive(Debug, Error)]
pub enum Error {
    #[error("there are only two genders in this data: M and F (got {0:?})")]
    InvalidGender(String),

    /// An archive produced zero data rows. The SSA zips always carry at
    /// least one year file, so this means the download was not what we
    /// expected rather than a legitimately empty dataset.
    #[error("archive contained no parseable name records")]
    EmptyArchive,

    #[error("totals table has no {gender} count for {year}")]
    MissingYearlyTotal { year: i32, gender: Gender },

    #[error("requested {requested} names but only {available} distinct names matched")]
    NotEnoughNames { requested: usize, available: usize },
}
