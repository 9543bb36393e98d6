// src/generate.rs

use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::error::Error;
use crate::slice::{slice_names, SliceOptions};
use crate::table::NameRecord;

/// Names matching the slice criteria, lexicographically sorted.
///
/// With `n` set, draws that many names uniformly without replacement.
/// Names are deduplicated before the draw so a name appearing in many
/// years is no more likely to be picked than one appearing once; asking
/// for more names than exist is an error. With `n` unset, all distinct
/// matches are returned.
///
/// `print_output` additionally writes the comma-joined list through the
/// wrapped console writer.
pub fn generate_names<R: NameRecord>(
    rows: &[R],
    opts: &SliceOptions,
    n: Option<usize>,
    print_output: bool,
) -> Result<Vec<String>, Error> {
    let sliced = slice_names(rows, opts);

    let mut seen = HashSet::new();
    let mut distinct: Vec<String> = Vec::new();
    for row in &sliced {
        if seen.insert(row.name().to_string()) {
            distinct.push(row.name().to_string());
        }
    }

    let mut names = match n {
        Some(requested) => {
            if requested > distinct.len() {
                return Err(Error::NotEnoughNames {
                    requested,
                    available: distinct.len(),
                });
            }
            let mut rng = rand::thread_rng();
            distinct
                .choose_multiple(&mut rng, requested)
                .cloned()
                .collect()
        }
        None => distinct,
    };
    names.sort();

    if print_output {
        wraprint(&names.join(", "));
    }
    Ok(names)
}

/// Print `text` wrapped to 72 columns with a two-space hanging indent.
pub fn wraprint(text: &str) {
    let options = textwrap::Options::new(72).subsequent_indent("  ");
    for line in textwrap::wrap(text, &options) {
        println!("{}", line);
    }
}
