//! Lexicon extraction from a trained cohesion model, and lexicon matching.

use std::collections::BTreeMap;

use crate::chars::{char_len, drop_last};
use crate::cohesion::{CohesionModel, CohesionScore};
use crate::config::ExtractConfig;

/// Extracted words with the scores that admitted them.
pub type Lexicon = BTreeMap<String, CohesionScore>;

impl CohesionModel {
    /// Extracts a lexicon of cohesive words.
    ///
    /// Candidates must pass the cohesion and count thresholds. They are then visited from
    /// shortest to longest, comparing each word's prefix count with that of its
    /// one-character-shorter parent (the droprate):
    /// - a droprate of exactly 1 evicts the parent, which never occurs without the word;
    /// - words longer than two characters below `min_droprate` are rejected;
    /// - otherwise the word is accepted and, with `remove_subword`, the parent is evicted.
    #[must_use]
    pub fn extract(&self, cfg: &ExtractConfig) -> Lexicon {
        let scores = self.all_scores();
        let (min_left, min_right) = cfg.min_cohesion;

        let mut by_length: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (word, score) in &scores {
            if score.left_cohesion < min_left || score.right_cohesion < min_right {
                continue;
            }
            if score.left_count < cfg.min_count {
                continue;
            }
            let len = char_len(word);
            if len > 1 {
                by_length.entry(len).or_default().push(word.as_str());
            }
        }

        let mut lexicon = Lexicon::new();
        for (len, mut words) in by_length {
            words.sort_unstable();
            for word in words {
                let score = scores[word];
                let parent = drop_last(word);
                let parent_count = self.left_count(parent);
                let droprate = if parent_count > 0 {
                    score.left_count as f64 / parent_count as f64
                } else {
                    1.0
                };

                if parent_count == 0 || score.left_count == parent_count {
                    lexicon.remove(parent);
                }
                if len > 2 && droprate < cfg.min_droprate {
                    continue;
                }
                lexicon.insert(word.to_owned(), score);
                if cfg.remove_subword && droprate >= cfg.min_droprate {
                    lexicon.remove(parent);
                }
            }
        }
        lexicon
    }
}

/// Replaces every whitespace-delimited token of each document by its longest prefix found in
/// `lexicon`, dropping tokens with no such prefix.
pub fn transform<I, S>(documents: I, lexicon: &Lexicon) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    documents
        .into_iter()
        .map(|doc| {
            doc.as_ref()
                .split_whitespace()
                .filter_map(|token| left_match(token, lexicon))
                .map(str::to_owned)
                .collect()
        })
        .collect()
}

fn left_match<'t>(token: &'t str, lexicon: &Lexicon) -> Option<&'t str> {
    let mut ends: Vec<usize> = token
        .char_indices()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .collect();
    ends.reverse();
    ends.into_iter()
        .map(|end| &token[..end])
        .find(|candidate| lexicon.contains_key(*candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;

    fn icecream_model() -> CohesionModel {
        let mut model = CohesionModel::default();
        model.train(
            ["아이스크림 는 맛있다", "아이스크림 은 차갑다"],
            &TrainingConfig::default(),
        );
        model
    }

    fn relaxed() -> ExtractConfig {
        ExtractConfig::builder().min_count(1).build().unwrap()
    }

    #[test]
    fn extracts_icecream_once_thresholds_admit_it() {
        let model = icecream_model();
        assert_eq!(model.left_count("아이스크림"), 2);
        let lexicon = model.extract(&relaxed());
        let score = lexicon.get("아이스크림").expect("아이스크림 extracted");
        assert_eq!(score.left_cohesion, 1.0);
        // every shorter prefix is explained by the full word
        assert!(!lexicon.contains_key("아이"));
        assert!(!lexicon.contains_key("아이스크"));
    }

    #[test]
    fn default_min_count_rejects_rare_words() {
        let model = icecream_model();
        assert!(model.extract(&ExtractConfig::default()).is_empty());
    }

    #[test]
    fn backward_threshold_rejects_words() {
        let mut model = CohesionModel::default();
        model.train(["ab ab ab xab xab"], &TrainingConfig::default());
        // ab: forward (3/3)^(1/2), backward (R[ab] / R[b])^(1/2) = (2/5)^(1/2)
        let backward = model.score("ab").right_cohesion;
        assert!((backward - 0.4f64.sqrt()).abs() < 1e-12);

        let open = model.extract(&relaxed());
        let words: Vec<&str> = open.keys().map(String::as_str).collect();
        assert_eq!(words, vec!["ab", "xab"]);

        let strict = ExtractConfig::builder()
            .min_count(1)
            .min_cohesion(0.3, 0.5)
            .build()
            .unwrap();
        let words: Vec<String> = model.extract(&strict).into_keys().collect();
        assert_eq!(words, vec!["ab".to_owned()]);

        let stricter = ExtractConfig::builder()
            .min_count(1)
            .min_cohesion(0.3, 0.7)
            .build()
            .unwrap();
        assert!(model.extract(&stricter).is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let model = icecream_model();
        assert_eq!(model.extract(&relaxed()), model.extract(&relaxed()));
    }

    #[test]
    fn low_droprate_rejects_longer_word() {
        let mut model = CohesionModel::default();
        let mut sentences = vec!["데이터를"; 1];
        sentences.extend(vec!["데이터가"; 4]);
        sentences.extend(vec!["데이터"; 5]);
        model.train(sentences, &TrainingConfig::default());
        let lexicon = model.extract(&relaxed());
        // L[데이터를] / L[데이터] = 0.1
        assert!(!lexicon.contains_key("데이터를"));
        // L[데이터가] / L[데이터] = 0.4 evicts the parent
        assert!(lexicon.contains_key("데이터가"));
        assert!(!lexicon.contains_key("데이터"));
    }

    #[test]
    fn keeping_subwords_retains_parents() {
        let mut model = CohesionModel::default();
        let mut sentences = vec!["데이터가"; 5];
        sentences.extend(vec!["데이터"; 5]);
        model.train(sentences, &TrainingConfig::default());
        let keep = ExtractConfig::builder()
            .min_count(1)
            .remove_subword(false)
            .build()
            .unwrap();
        let lexicon = model.extract(&keep);
        assert!(lexicon.contains_key("데이터"));
        assert!(lexicon.contains_key("데이터가"));
        assert!(!model.extract(&relaxed()).contains_key("데이터"));
    }

    #[test]
    fn transform_uses_longest_left_match() {
        let mut lexicon = Lexicon::new();
        lexicon.insert("아이".into(), CohesionScore::default());
        lexicon.insert("아이스크림".into(), CohesionScore::default());
        let docs = ["아이스크림을 먹는 아이가", "없음  아이"];
        let transformed = transform(docs, &lexicon);
        assert_eq!(
            transformed,
            vec![
                vec!["아이스크림".to_owned(), "아이".to_owned()],
                vec!["아이".to_owned()],
            ]
        );
    }
}
