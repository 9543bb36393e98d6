// src/table/rank.rs

/// Popularity ranks for a group of counts, descending, with minimum-rank
/// tie handling: counts [100, 100, 90] rank as [1, 1, 3]. Output is in
/// the same order as the input.
pub fn min_rank_desc(counts: &[u64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

    let mut ranks = vec![0u32; counts.len()];
    let mut prev_count: Option<u64> = None;
    let mut prev_rank = 1u32;
    for (pos, &idx) in order.iter().enumerate() {
        let rank = match prev_count {
            Some(c) if c == counts[idx] => prev_rank,
            _ => (pos + 1) as u32,
        };
        ranks[idx] = rank;
        prev_count = Some(counts[idx]);
        prev_rank = rank;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_minimum_rank_and_next_rank_skips() {
        assert_eq!(min_rank_desc(&[100, 100, 90]), vec![1, 1, 3]);
    }

    #[test]
    fn ranks_follow_input_order() {
        assert_eq!(min_rank_desc(&[40, 60, 50]), vec![3, 1, 2]);
    }

    #[test]
    fn all_tied() {
        assert_eq!(min_rank_desc(&[7, 7, 7]), vec![1, 1, 1]);
    }

    #[test]
    fn empty_is_fine() {
        assert!(min_rank_desc(&[]).is_empty());
    }
}
