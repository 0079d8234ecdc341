// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::types::{GroupedCounts, WordCount};
use std::collections::HashMap;

/// Word -> every count reported for it, in arrival order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregationMap {
    groups: HashMap<String, Vec<u64>>,
}

impl AggregationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds raw tuples in, appending each count to its word's list
    pub fn fold_tuples<I>(&mut self, tuples: I)
    where
        I: IntoIterator<Item = WordCount>,
    {
        for (word, count) in tuples {
            self.groups.entry(word).or_default().push(count);
        }
    }

    /// Merges a group worker's partial result
    ///
    /// The same word may come back from several group workers, so count lists
    /// are concatenated, never replaced.
    pub fn merge_partial(&mut self, partial: GroupedCounts) {
        for (word, counts) in partial {
            self.groups.entry(word).or_default().extend(counts);
        }
    }

    pub fn get(&self, word: &str) -> Option<&[u64]> {
        self.groups.get(word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u64>)> {
        self.groups.iter()
    }

    /// Count lists sorted per word, for order-independent comparison
    pub fn normalized(&self) -> HashMap<String, Vec<u64>> {
        self.groups
            .iter()
            .map(|(word, counts)| {
                let mut counts = counts.clone();
                counts.sort_unstable();
                (word.clone(), counts)
            })
            .collect()
    }
}

impl IntoIterator for AggregationMap {
    type Item = (String, Vec<u64>);
    type IntoIter = std::collections::hash_map::IntoIter<String, Vec<u64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(word: &str, count: u64) -> WordCount {
        (word.to_string(), count)
    }

    #[test]
    fn test_fold_appends_counts_per_word() {
        let mut map = AggregationMap::new();
        map.fold_tuples(vec![tuple("a", 2), tuple("b", 1), tuple("a", 3)]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&[2, 3][..]));
        assert_eq!(map.get("b"), Some(&[1][..]));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn test_merge_concatenates_overlapping_words() {
        let mut map = AggregationMap::new();
        map.merge_partial(vec![("a".to_string(), vec![1, 4]), ("b".to_string(), vec![2])]);
        map.merge_partial(vec![("a".to_string(), vec![5])]);

        assert_eq!(map.get("a"), Some(&[1, 4, 5][..]));
        assert_eq!(map.get("b"), Some(&[2][..]));
    }

    #[test]
    fn test_normalized_ignores_merge_order() {
        let mut first = AggregationMap::new();
        first.merge_partial(vec![("a".to_string(), vec![3])]);
        first.merge_partial(vec![("a".to_string(), vec![1])]);

        let mut second = AggregationMap::new();
        second.fold_tuples(vec![tuple("a", 1), tuple("a", 3)]);

        assert_ne!(first, second);
        assert_eq!(first.normalized(), second.normalized());
    }
}
