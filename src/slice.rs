// src/slice.rs

use std::collections::HashSet;
use tracing::warn;

use crate::table::{Gender, NameRecord};

/// Criteria for [`slice_names`]. Rank ordering is inverted relative to
/// numeric ordering: rank 1 is the most popular, so `rank_lower` is the
/// better (smaller-number) limit and keeps rows with `rank <= bound`,
/// while `rank_upper` is the worse limit and keeps rows with
/// `rank >= bound`.
#[derive(Debug, Clone, Default)]
pub struct SliceOptions {
    pub gender: Option<Gender>,
    pub first_letters: Option<Vec<char>>,
    pub rank_lower: Option<u32>,
    pub rank_upper: Option<u32>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    /// Require the rank criterion to hold in every year under
    /// consideration, not just at least one.
    pub strict_rank: bool,
}

impl SliceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn first_letters<I: IntoIterator<Item = char>>(mut self, letters: I) -> Self {
        self.first_letters = Some(letters.into_iter().collect());
        self
    }

    pub fn rank_lower(mut self, bound: u32) -> Self {
        self.rank_lower = Some(bound);
        self
    }

    pub fn rank_upper(mut self, bound: u32) -> Self {
        self.rank_upper = Some(bound);
        self
    }

    pub fn years(mut self, start: i32, end: i32) -> Self {
        self.year_start = Some(start);
        self.year_end = Some(end);
        self
    }

    pub fn strict_rank(mut self, strict: bool) -> Self {
        self.strict_rank = strict;
        self
    }
}

/// Filter a name table by the given criteria, returning owned rows; the
/// input is never mutated.
///
/// Reversed year or rank bounds are corrected with a warning rather than
/// rejected. Filters apply in order: gender, year range (inclusive),
/// case-sensitive first letter, rank lower bound, rank upper bound. In
/// strict mode a name is dropped entirely if any of its rows remaining
/// after the earlier filters falls outside the rank bound.
pub fn slice_names<R: NameRecord>(rows: &[R], opts: &SliceOptions) -> Vec<R> {
    let (year_start, year_end) = match (opts.year_start, opts.year_end) {
        (Some(start), Some(end)) if start > end => {
            warn!(
                year_start = start,
                year_end = end,
                "starting year is after ending year, swapping values"
            );
            (Some(end), Some(start))
        }
        pair => pair,
    };
    let (rank_lower, rank_upper) = match (opts.rank_lower, opts.rank_upper) {
        (Some(lower), Some(upper)) if lower < upper => {
            warn!(
                rank_lower = lower,
                rank_upper = upper,
                "rank lower bound is higher than upper bound, swapping values"
            );
            (Some(upper), Some(lower))
        }
        pair => pair,
    };

    let mut kept: Vec<R> = rows
        .iter()
        .filter(|r| {
            opts.gender.map_or(true, |g| r.gender() == g)
                && year_start.map_or(true, |y| r.year() >= y)
                && year_end.map_or(true, |y| r.year() <= y)
                && opts.first_letters.as_ref().map_or(true, |letters| {
                    r.name()
                        .chars()
                        .next()
                        .map_or(false, |c| letters.contains(&c))
                })
        })
        .cloned()
        .collect();

    if let Some(bound) = rank_lower {
        if opts.strict_rank {
            let violators: HashSet<String> = kept
                .iter()
                .filter(|r| r.rank() > bound)
                .map(|r| r.name().to_string())
                .collect();
            kept.retain(|r| r.rank() <= bound && !violators.contains(r.name()));
        } else {
            kept.retain(|r| r.rank() <= bound);
        }
    }
    if let Some(bound) = rank_upper {
        if opts.strict_rank {
            let violators: HashSet<String> = kept
                .iter()
                .filter(|r| r.rank() < bound)
                .map(|r| r.name().to_string())
                .collect();
            kept.retain(|r| r.rank() >= bound && !violators.contains(r.name()));
        } else {
            kept.retain(|r| r.rank() >= bound);
        }
    }
    kept
}
