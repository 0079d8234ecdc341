// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{MapReduceError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the input files are sized across map workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// floor(N / K) files each, the first N mod K workers take one extra
    #[default]
    Even,
    /// Random sizes bounded around round(N / K), the last worker takes the rest
    Randomized,
}

/// Splits `items` into `num_workers` disjoint, non-empty, contiguous assignments
/// whose union is exactly `items`
pub fn partition<T>(
    items: Vec<T>,
    num_workers: usize,
    strategy: PartitionStrategy,
    rng: &mut impl Rng,
) -> Result<Vec<Vec<T>>> {
    let sizes = match strategy {
        PartitionStrategy::Even => even_sizes(items.len(), num_workers)?,
        PartitionStrategy::Randomized => randomized_sizes(items.len(), num_workers, rng)?,
    };
    Ok(split_by_sizes(items, &sizes))
}

/// Assignment sizes for the even strategy
pub fn even_sizes(total: usize, num_workers: usize) -> Result<Vec<usize>> {
    check_bounds(total, num_workers)?;

    let base = total / num_workers;
    let extra = total % num_workers;
    Ok((0..num_workers)
        .map(|worker| if worker < extra { base + 1 } else { base })
        .collect())
}

/// Assignment sizes for the randomized strategy
///
/// Every worker but the last draws a size between
/// `floor(remaining_files / remaining_workers)` and `round(total / num_workers)`,
/// capped so each later worker still gets at least one file. The last worker
/// takes exactly what is left.
pub fn randomized_sizes(
    total: usize,
    num_workers: usize,
    rng: &mut impl Rng,
) -> Result<Vec<usize>> {
    check_bounds(total, num_workers)?;

    let average = (total + num_workers / 2) / num_workers;
    let mut remaining_files = total;
    let mut sizes = Vec::with_capacity(num_workers);

    for remaining_workers in (2..=num_workers).rev() {
        let lower = remaining_files / remaining_workers;
        let upper = average
            .max(lower)
            .min(remaining_files - (remaining_workers - 1));
        let size = rng.random_range(lower..=upper);
        remaining_files -= size;
        sizes.push(size);
    }
    sizes.push(remaining_files);

    Ok(sizes)
}

/// Splits `items` into `num_slices` contiguous slices of `floor(total / num_slices)`
/// items, the final slice absorbing the remainder
///
/// Leading slices are empty when there are fewer items than slices.
pub fn contiguous_slices<T>(items: Vec<T>, num_slices: usize) -> Vec<Vec<T>> {
    if num_slices == 0 {
        return Vec::new();
    }

    let slice_size = items.len() / num_slices;
    let mut sizes = vec![slice_size; num_slices];
    sizes[num_slices - 1] = items.len() - slice_size * (num_slices - 1);
    split_by_sizes(items, &sizes)
}

fn check_bounds(total: usize, num_workers: usize) -> Result<()> {
    if num_workers == 0 || total < num_workers {
        return Err(MapReduceError::NotEnoughFiles {
            files: total,
            workers: num_workers,
        });
    }
    Ok(())
}

fn split_by_sizes<T>(items: Vec<T>, sizes: &[usize]) -> Vec<Vec<T>> {
    let mut items = items.into_iter();
    sizes
        .iter()
        .map(|&size| items.by_ref().take(size).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_complete(assignments: &[Vec<usize>], total: usize, num_workers: usize) {
        assert_eq!(assignments.len(), num_workers);
        assert!(assignments.iter().all(|a| !a.is_empty()));

        let flattened: Vec<usize> = assignments.iter().flatten().copied().collect();
        assert_eq!(flattened, (0..total).collect::<Vec<_>>());
    }

    #[test]
    fn test_even_partition_is_complete_for_all_small_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        for total in 1..=40 {
            for num_workers in 1..=total {
                let assignments = partition(
                    (0..total).collect(),
                    num_workers,
                    PartitionStrategy::Even,
                    &mut rng,
                )
                .unwrap();
                assert_complete(&assignments, total, num_workers);
            }
        }
    }

    #[test]
    fn test_randomized_partition_is_complete_for_all_small_inputs() {
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            for total in 1..=40 {
                for num_workers in 1..=total {
                    let assignments = partition(
                        (0..total).collect(),
                        num_workers,
                        PartitionStrategy::Randomized,
                        &mut rng,
                    )
                    .unwrap();
                    assert_complete(&assignments, total, num_workers);
                }
            }
        }
    }

    #[test]
    fn test_even_sizes_spread_remainder() {
        assert_eq!(even_sizes(7, 3).unwrap(), vec![3, 2, 2]);
        assert_eq!(even_sizes(6, 3).unwrap(), vec![2, 2, 2]);
        assert_eq!(even_sizes(1, 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_randomized_sizes_stay_near_average() {
        let mut rng = StdRng::seed_from_u64(42);
        let sizes = randomized_sizes(100, 4, &mut rng).unwrap();
        assert_eq!(sizes.iter().sum::<usize>(), 100);
        for size in &sizes[..3] {
            assert!(*size >= 25 && *size <= 25 + 1, "size {} out of bounds", size);
        }
    }

    #[test]
    fn test_rejects_more_workers_than_files() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = partition(vec!["a.txt"], 2, PartitionStrategy::Randomized, &mut rng);
        assert!(matches!(
            result,
            Err(MapReduceError::NotEnoughFiles {
                files: 1,
                workers: 2
            })
        ));
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(even_sizes(3, 0).is_err());
        assert!(even_sizes(0, 1).is_err());
    }

    #[test]
    fn test_contiguous_slices_last_absorbs_remainder() {
        let slices = contiguous_slices((0..10).collect::<Vec<_>>(), 3);
        assert_eq!(slices, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8, 9]]);
    }

    #[test]
    fn test_contiguous_slices_with_fewer_items_than_slices() {
        let slices = contiguous_slices(vec!['a', 'b'], 4);
        assert_eq!(slices, vec![vec![], vec![], vec![], vec!['a', 'b']]);
    }

    #[test]
    fn test_contiguous_slices_zero_slices() {
        assert!(contiguous_slices(vec![1, 2, 3], 0).is_empty());
    }
}
