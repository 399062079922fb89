//! Hashtag wordcloud sizing.

use super::AnalysisOptions;
use crate::Result;
use crate::corpus::Corpus;
use crate::model::{TagFrequency, WordcloudEntry};
use crate::storage::Storage;

pub const MIN_WORD_SIZE: u32 = 10;
pub const WORD_SIZE_SPAN: u32 = 30;

/// Wordcloud entries for the strict window, never widened.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn wordcloud(storage: &Storage, category: &str, days: u32) -> Result<Vec<WordcloudEntry>> {
    wordcloud_with(storage, category, days, &AnalysisOptions::default())
}

/// [`wordcloud`] with explicit options; `options.wordcloud_limit` caps the size.
///
/// # Errors
///
/// Returns an error if a storage query fails.
pub fn wordcloud_with(
    storage: &Storage,
    category: &str,
    days: u32,
    options: &AnalysisOptions,
) -> Result<Vec<WordcloudEntry>> {
    let Some(corpus) = Corpus::resolve(storage, category, days, options.now)? else {
        return Ok(vec![]);
    };
    let frequencies = corpus.strict_tag_frequencies(options.wordcloud_limit)?;
    Ok(size_entries(&frequencies))
}

/// Scale frequencies linearly into `[10, 40]` against the largest one.
#[must_use]
pub fn size_entries(frequencies: &[TagFrequency]) -> Vec<WordcloudEntry> {
    let max = frequencies.iter().map(|f| f.frequency).max().unwrap_or(0);
    if max <= 0 {
        return vec![];
    }

    frequencies
        .iter()
        .map(|f| {
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let extra = (f.frequency as f64 / max as f64 * f64::from(WORD_SIZE_SPAN)) as u32;
            WordcloudEntry {
                word: f.tag.clone(),
                size: MIN_WORD_SIZE + extra,
                frequency: f.frequency,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(tag: &str, frequency: i64) -> TagFrequency {
        TagFrequency {
            tag: tag.to_string(),
            frequency,
        }
    }

    #[test]
    fn sizes_scale_against_max() {
        let entries = size_entries(&[freq("a", 10), freq("b", 5), freq("c", 1)]);
        let sizes: Vec<u32> = entries.iter().map(|e| e.size).collect();
        assert_eq!(sizes, vec![40, 25, 13]);
        assert_eq!(entries[0].word, "a");
    }

    #[test]
    fn sizes_are_bounded_and_monotonic() {
        let input: Vec<TagFrequency> = (1..=20).rev().map(|n| freq(&format!("t{n}"), n)).collect();
        let entries = size_entries(&input);
        for pair in entries.windows(2) {
            assert!(pair[0].size >= pair[1].size);
        }
        assert!(entries.iter().all(|e| (10..=40).contains(&e.size)));
    }

    #[test]
    fn empty_frequencies_yield_nothing() {
        assert!(size_entries(&[]).is_empty());
    }
}
