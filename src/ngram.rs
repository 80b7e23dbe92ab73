//! Merging of adjacent segments into multi-span candidates.

use crate::config::NgramConfig;
use crate::counter::SubstringCounter;
use crate::selection::{select_non_overlapping, Span};

/// Proposes merges of `2..=max_n` adjacent spans and reselects among them and the originals.
///
/// `spans` must be sorted and contiguous. A merge is proposed only when its concatenated
/// text has a prefix count; its score is
/// `(count / min(left_count of parts)) ^ (1 / (n - 1)) - n * length_penalty`,
/// or `-n * length_penalty` when the weakest part was never seen as a prefix.
#[must_use]
pub fn merge_ngrams(spans: Vec<Span>, prefixes: &SubstringCounter, cfg: &NgramConfig) -> Vec<Span> {
    if spans.len() <= 1 {
        return spans;
    }

    let widest = cfg.max_n.min(spans.len());
    let mut candidates = Vec::with_capacity(spans.len().saturating_mul(widest));
    for begin in 0..spans.len() - 1 {
        for n in 2..=cfg.max_n {
            let end = begin + n;
            if end > spans.len() {
                break;
            }
            let parts = &spans[begin..end];
            let text: String = parts.iter().map(|span| span.text.as_str()).collect();
            let count = prefixes.get(&text);
            if count == 0 {
                continue;
            }
            let base = parts.iter().map(|span| span.left_count).min().unwrap_or(0);
            let mut score = if base > 0 {
                (count as f64 / base as f64).powf(1.0 / (n - 1) as f64)
            } else {
                0.0
            };
            score -= n as f64 * cfg.length_penalty;
            candidates.push(Span::new(
                text,
                parts[0].begin,
                parts[n - 1].end,
                score,
                count,
                0,
            ));
        }
    }

    let mut pool = spans;
    pool.extend(candidates);
    select_non_overlapping(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(entries: &[(&str, usize)]) -> SubstringCounter {
        let mut counter = SubstringCounter::new();
        for &(key, count) in entries {
            counter.add(key, count);
        }
        counter
    }

    #[test]
    fn frequent_concatenation_replaces_parts() {
        let spans = vec![
            Span::new("아이", 0, 2, 0.8, 10, 0),
            Span::new("스크림", 2, 5, 0.7, 10, 0),
        ];
        let prefixes = counter(&[("아이스크림", 9)]);
        let merged = merge_ngrams(spans, &prefixes, &NgramConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "아이스크림");
        assert_eq!((merged[0].begin, merged[0].end), (0, 5));
        assert!((merged[0].score - (0.9 + 0.1)).abs() < 1e-12);
        assert_eq!(merged[0].left_count, 9);
    }

    #[test]
    fn three_span_merge_uses_root_of_span_count() {
        let spans = vec![
            Span::new("a", 0, 1, 0.1, 8, 0),
            Span::new("b", 1, 2, 0.1, 4, 0),
            Span::new("c", 2, 3, 0.1, 6, 0),
        ];
        let prefixes = counter(&[("abc", 2)]);
        let merged = merge_ngrams(spans, &prefixes, &NgramConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "abc");
        // (2 / 4) ^ (1 / 2) plus 3 * 0.05
        let expected = 0.5f64.sqrt() + 0.15;
        assert!((merged[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn merges_longer_than_max_n_are_not_proposed() {
        let spans: Vec<Span> = ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(idx, text)| Span::new(*text, idx, idx + 1, 0.1, 1, 0))
            .collect();
        let prefixes = counter(&[("abcde", 100)]);
        let merged = merge_ngrams(spans.clone(), &prefixes, &NgramConfig::default());
        assert_eq!(merged, spans);

        let wider = NgramConfig::new(5, -0.05).unwrap();
        let merged = merge_ngrams(spans, &prefixes, &wider);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "abcde");
    }

    #[test]
    fn oversized_max_n_is_bounded_by_span_count() {
        let spans = vec![Span::new("ab", 0, 2, 0.1, 3, 0), Span::new("cd", 2, 4, 0.1, 3, 0)];
        let cfg = NgramConfig {
            max_n: usize::MAX,
            length_penalty: -0.05,
        };
        let prefixes = counter(&[("abcd", 3)]);
        let merged = merge_ngrams(spans, &prefixes, &cfg);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "abcd");
    }

    #[test]
    fn unseen_concatenation_is_never_proposed() {
        let spans = vec![Span::new("ab", 0, 2, 0.1, 3, 0), Span::new("cd", 2, 4, 0.1, 3, 0)];
        let merged = merge_ngrams(spans.clone(), &SubstringCounter::new(), &NgramConfig::default());
        assert_eq!(merged, spans);
    }

    #[test]
    fn weak_merge_loses_to_parts() {
        let spans = vec![Span::new("ab", 0, 2, 0.9, 100, 0), Span::new("cd", 2, 4, 0.9, 100, 0)];
        let prefixes = counter(&[("abcd", 1)]);
        let merged = merge_ngrams(spans.clone(), &prefixes, &NgramConfig::default());
        assert_eq!(merged, spans);
    }

    #[test]
    fn single_span_is_returned_unchanged() {
        let spans = vec![Span::new("ab", 0, 2, 0.5, 1, 1)];
        let merged = merge_ngrams(spans.clone(), &SubstringCounter::new(), &NgramConfig::default());
        assert_eq!(merged, spans);
    }
}
