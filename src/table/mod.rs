// src/table/mod.rs

pub mod rank;
pub mod store;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Gender as recorded by the SSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub const BOTH: [Gender; 2] = [Gender::M, Gender::F];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            other => Err(Error::InvalidGender(other.to_string())),
        }
    }
}

/// One row of the SSA annual birth totals table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthTotal {
    pub year: i32,
    pub male: u64,
    pub female: u64,
    pub total: u64,
}

impl BirthTotal {
    pub fn count_for(&self, gender: Gender) -> u64 {
        match gender {
            Gender::M => self.male,
            Gender::F => self.female,
        }
    }
}

/// National name statistics for one (name, gender, year).
///
/// `f` is the fraction of all recorded births of that gender in that year,
/// using the totals table as denominator. `rank` is the popularity rank
/// within (gender, year); rank 1 is the most popular, ties share the
/// minimum rank.
#[derive(Debug, Clone, PartialEq)]
pub struct NationalRow {
    pub name: String,
    pub gender: Gender,
    pub n: u64,
    pub year: i32,
    pub f: f64,
    pub rank: u32,
}

/// State-level name statistics for one (state, name, gender, year).
///
/// Unlike the national table, `f` divides by the sum of recorded
/// occurrences within the (state, gender, year) group. The SSA omits
/// names with fewer than five occurrences, so this denominator undercounts
/// true births by roughly 6-10% nationally, more for name-diverse
/// populations. No authoritative per-state total exists to correct it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRow {
    pub state: String,
    pub name: String,
    pub gender: Gender,
    pub year: i32,
    pub n: u64,
    pub f: f64,
    pub rank: u32,
}

/// Common view over the national and state tables, so slicing, name
/// generation, and plotting work on either.
pub trait NameRecord: Clone {
    fn name(&self) -> &str;
    fn gender(&self) -> Gender;
    fn year(&self) -> i32;
    fn n(&self) -> u64;
    fn f(&self) -> f64;
    fn rank(&self) -> u32;
}

impl NameRecord for NationalRow {
    fn name(&self) -> &str {
        &self.name
    }
    fn gender(&self) -> Gender {
        self.gender
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn n(&self) -> u64 {
        self.n
    }
    fn f(&self) -> f64 {
        self.f
    }
    fn rank(&self) -> u32 {
        self.rank
    }
}

impl NameRecord for StateRow {
    fn name(&self) -> &str {
        &self.name
    }
    fn gender(&self) -> Gender {
        self.gender
    }
    fn year(&self) -> i32 {
        self.year
    }
    fn n(&self) -> u64 {
        self.n
    }
    fn f(&self) -> f64 {
        self.f
    }
    fn rank(&self) -> u32 {
        self.rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_both_values() {
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::M);
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::F);
    }

    #[test]
    fn gender_rejects_anything_else() {
        let err = "X".parse::<Gender>().unwrap_err();
        assert!(matches!(err, Error::InvalidGender(ref s) if s == "X"));
    }

    #[test]
    fn totals_count_per_gender() {
        let t = BirthTotal {
            year: 1990,
            male: 100,
            female: 90,
            total: 190,
        };
        assert_eq!(t.count_for(Gender::M), 100);
        assert_eq!(t.count_for(Gender::F), 90);
    }
}
