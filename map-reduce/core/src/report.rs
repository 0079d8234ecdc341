// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::types::{FinalCounts, GroupingMode};
use std::time::{Duration, Instant};

/// Final counts of a run together with when it started and how long it took
#[derive(Debug, Clone)]
pub struct RunReport {
    pub counts: FinalCounts,
    pub started: Instant,
    pub elapsed: Duration,
    pub num_workers: usize,
    pub grouping: GroupingMode,
}

impl RunReport {
    pub fn new(
        counts: FinalCounts,
        started: Instant,
        num_workers: usize,
        grouping: GroupingMode,
    ) -> Self {
        Self {
            counts,
            started,
            elapsed: started.elapsed(),
            num_workers,
            grouping,
        }
    }

    /// Words sorted by descending count, ties broken alphabetically
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self
            .counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        sorted
    }

    pub fn total_occurrences(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Prints the `top` most frequent words, totals and timing to stdout
    pub fn print_summary(&self, top: usize) {
        println!("\n=== RESULTS ===");
        let sorted = self.sorted();
        for (word, count) in sorted.iter().take(top) {
            println!("{}: {}", word, count);
        }
        if sorted.len() > top {
            println!("... ({} more words)", sorted.len() - top);
        }

        println!("\nDistinct words: {}", sorted.len());
        println!("Total occurrences: {}", self.total_occurrences());
        println!(
            "Workers: {} ({} grouping)",
            self.num_workers, self.grouping
        );

        println!("\n=== PROGRAM COMPLETE ===");
        println!("Took: {:.2}s", self.elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_count_then_word() {
        let counts: FinalCounts = [("b", 2), ("a", 2), ("c", 5)]
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect();
        let report = RunReport::new(counts, Instant::now(), 1, GroupingMode::Inline);

        assert_eq!(report.sorted(), vec![("c", 5), ("a", 2), ("b", 2)]);
        assert_eq!(report.total_occurrences(), 9);
    }
}
