// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::aggregation::AggregationMap;
use crate::types::FinalCounts;

/// Total occurrences of a word across all the counts gathered for it
pub fn reduce(_word: &str, counts: &[u64]) -> u64 {
    counts.iter().sum()
}

/// Applies [`reduce`] once per distinct word
pub fn reduce_all(aggregation: AggregationMap) -> FinalCounts {
    aggregation
        .into_iter()
        .map(|(word, counts)| {
            let total = reduce(&word, &counts);
            (word, total)
        })
        .collect()
}
