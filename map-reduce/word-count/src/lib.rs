// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::types::{GroupedCounts, WordCount};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Splits text into words on runs of non-alphanumeric characters
///
/// Case is preserved, digits and non-ASCII letters are word characters,
/// `_` and punctuation are separators.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// Adds the words of `text` to `counts`
pub fn count_words(text: &str, counts: &mut BTreeMap<String, u64>) {
    for word in tokenize(text) {
        match counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                counts.insert(word.to_string(), 1);
            }
        }
    }
}

/// Resolves a file name against the base directory, absolute paths are kept
pub fn resolve(base_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base_dir.join(file)
    }
}

/// Map work: one tuple per distinct word across all of the assignment's files,
/// sorted by word
///
/// Fails on the first file that cannot be read as UTF-8 text, naming it.
pub async fn map_files(base_dir: &Path, files: &[PathBuf]) -> Result<Vec<WordCount>, String> {
    let mut counts = BTreeMap::new();
    for file in files {
        let path = resolve(base_dir, file);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        count_words(&text, &mut counts);
        debug!(file = %path.display(), words = counts.len(), "Counted file");
    }
    Ok(counts.into_iter().collect())
}

/// Group work: folds a slice of tuples into word -> counts, sorted by word,
/// keeping the slice order of each word's counts
pub fn group_tuples(slice: Vec<WordCount>) -> GroupedCounts {
    let mut groups: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for (word, count) in slice {
        groups.entry(word).or_default().push(count);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn counts_of(text: &str) -> Vec<(String, u64)> {
        let mut counts = BTreeMap::new();
        count_words(text, &mut counts);
        counts.into_iter().collect()
    }

    fn pairs(expected: &[(&str, u64)]) -> Vec<(String, u64)> {
        let mut pairs: Vec<_> = expected.iter().map(|(w, c)| (w.to_string(), *c)).collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_counts_simple_sentence() {
        assert_eq!(
            counts_of("the cat sat on the mat"),
            pairs(&[("the", 2), ("cat", 1), ("sat", 1), ("on", 1), ("mat", 1)])
        );
    }

    #[test]
    fn test_strips_punctuation_and_underscores() {
        assert_eq!(
            counts_of("  Hello, world!! hello_world\n--world--"),
            pairs(&[("Hello", 1), ("world", 3), ("hello", 1)])
        );
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(counts_of("The the THE"), pairs(&[("The", 1), ("the", 1), ("THE", 1)]));
    }

    #[test]
    fn test_digits_and_unicode_are_word_characters() {
        assert_eq!(
            counts_of("route66 café 42 café"),
            pairs(&[("route66", 1), ("café", 2), ("42", 1)])
        );
    }

    #[test]
    fn test_empty_text_has_no_words() {
        assert!(counts_of("").is_empty());
        assert!(counts_of(" ,.;\n").is_empty());
    }

    #[test]
    fn test_group_concatenates_counts_in_slice_order() {
        let slice = vec![
            ("b".to_string(), 2),
            ("a".to_string(), 1),
            ("b".to_string(), 5),
        ];
        assert_eq!(
            group_tuples(slice),
            vec![("a".to_string(), vec![1]), ("b".to_string(), vec![2, 5])]
        );
        assert!(group_tuples(Vec::new()).is_empty());
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let base = Path::new("/corpus");
        assert_eq!(resolve(base, Path::new("a.txt")), PathBuf::from("/corpus/a.txt"));
        assert_eq!(resolve(base, Path::new("/tmp/b.txt")), PathBuf::from("/tmp/b.txt"));
    }

    #[tokio::test]
    async fn test_map_combines_counts_across_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a b a").unwrap();
        fs::write(dir.path().join("b.txt"), "b c").unwrap();

        let tuples = map_files(dir.path(), &[PathBuf::from("a.txt"), PathBuf::from("b.txt")])
            .await
            .unwrap();

        assert_eq!(tuples, pairs(&[("a", 2), ("b", 2), ("c", 1)]));
    }

    #[tokio::test]
    async fn test_map_names_the_unreadable_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let error = map_files(dir.path(), &[PathBuf::from("a.txt"), PathBuf::from("gone.txt")])
            .await
            .unwrap_err();

        assert!(error.contains("gone.txt"), "unexpected error: {}", error);
    }
}
