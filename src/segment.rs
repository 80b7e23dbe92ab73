//! Cohesion-driven segmentation of whitespace-delimited tokens.

use crate::chars::char_bounds;
use crate::cohesion::CohesionModel;
use crate::config::NgramConfig;
use crate::ngram::merge_ngrams;
use crate::selection::{select_non_overlapping, Span};

/// Splits tokens into contiguous spans using a trained [`CohesionModel`].
///
/// Every substring of `2..=max_length` characters is scored by forward cohesion, the best
/// non-overlapping ones form a skeleton, uncovered characters become spans of their own,
/// and adjacent spans are then offered to [`merge_ngrams`].
///
/// Adjacent zero-score gap spans are kept separate rather than coalesced.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    model: &'a CohesionModel,
    ngram: NgramConfig,
    max_length: usize,
}

impl<'a> Segmenter<'a> {
    /// Creates a segmenter scoring candidates up to the model's `left_max_length`.
    #[must_use]
    pub fn new(model: &'a CohesionModel) -> Self {
        Self {
            model,
            ngram: NgramConfig::default(),
            max_length: model.config().left_max_length,
        }
    }

    /// Overrides the n-gram merge parameters.
    #[must_use]
    pub fn ngram(mut self, cfg: NgramConfig) -> Self {
        self.ngram = cfg;
        self
    }

    /// Overrides the longest candidate substring considered.
    #[must_use]
    pub fn max_length(mut self, value: usize) -> Self {
        self.max_length = value;
        self
    }

    /// Segments one token into spans sorted by `begin` that concatenate back to `token`.
    ///
    /// Tokens of at most two characters come back whole; the empty token yields no spans.
    #[must_use]
    pub fn segment(&self, token: &str) -> Vec<Span> {
        if token.is_empty() {
            return Vec::new();
        }
        let bounds = char_bounds(token);
        let len = bounds.len() - 1;
        if len <= 2 {
            return vec![self.span_at(token, &bounds, 0, len)];
        }

        let mut candidates = Vec::new();
        for begin in 0..len - 1 {
            for width in 2..=self.max_length {
                let end = begin + width;
                if end > len {
                    break;
                }
                candidates.push(self.span_at(token, &bounds, begin, end));
            }
        }

        let skeleton = self.fill_gaps(token, &bounds, select_non_overlapping(candidates));
        let merged = merge_ngrams(skeleton, self.model.left_counter(), &self.ngram);
        self.fill_gaps(token, &bounds, merged)
    }

    /// Segments every whitespace-delimited token of `sentence`.
    #[must_use]
    pub fn segment_sentence(&self, sentence: &str) -> Vec<Vec<Span>> {
        sentence
            .split_whitespace()
            .map(|token| self.segment(token))
            .collect()
    }

    /// Inserts a span for every stretch of `token` not covered by `spans`.
    fn fill_gaps(&self, token: &str, bounds: &[usize], spans: Vec<Span>) -> Vec<Span> {
        let len = bounds.len() - 1;
        let mut filled = Vec::with_capacity(spans.len() + 2);
        let mut cursor = 0;
        for span in spans {
            if span.begin > cursor {
                filled.push(self.span_at(token, bounds, cursor, span.begin));
            }
            cursor = span.end;
            filled.push(span);
        }
        if cursor < len {
            filled.push(self.span_at(token, bounds, cursor, len));
        }
        filled
    }

    fn span_at(&self, token: &str, bounds: &[usize], begin: usize, end: usize) -> Span {
        let text = &token[bounds[begin]..bounds[end]];
        let score = self.model.score(text);
        Span::new(
            text,
            begin,
            end,
            score.left_cohesion,
            score.left_count,
            score.right_count,
        )
    }
}

impl CohesionModel {
    /// Segments `token` with default n-gram settings; see [`Segmenter::segment`].
    #[must_use]
    pub fn segment(&self, token: &str) -> Vec<Span> {
        Segmenter::new(self).segment(token)
    }

    /// Segments every token of `sentence`; see [`Segmenter::segment_sentence`].
    #[must_use]
    pub fn segment_sentence(&self, sentence: &str) -> Vec<Vec<Span>> {
        Segmenter::new(self).segment_sentence(sentence)
    }

    /// Best forward-cohesion prefix of each whitespace-delimited token of `sentence`.
    #[must_use]
    pub fn tokenize<'s>(&self, sentence: &'s str) -> Vec<&'s str> {
        sentence
            .split_whitespace()
            .map(|token| self.left_prefix(token))
            .collect()
    }

    /// The prefix of `token` with the highest forward cohesion.
    ///
    /// The earliest prefix wins ties. Tokens of at most two characters, and tokens whose
    /// prefixes all score zero, are returned whole.
    #[must_use]
    pub fn left_prefix<'s>(&self, token: &'s str) -> &'s str {
        let bounds = char_bounds(token);
        let len = bounds.len() - 1;
        if len <= 2 {
            return token;
        }
        let mut best = (0.0, len);
        for n in 2..=len {
            let score = self.score(&token[..bounds[n]]).left_cohesion;
            if score > best.0 {
                best = (score, n);
            }
        }
        &token[..bounds[best.1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;

    fn trained() -> CohesionModel {
        let mut model = CohesionModel::default();
        let mut sentences = Vec::new();
        for _ in 0..3 {
            sentences.push("아이스크림을 먹었다");
            sentences.push("아이스크림이 맛있다");
            sentences.push("아이스크림 가게");
            sentences.push("커피를 마셨다");
            sentences.push("커피가 뜨겁다");
            sentences.push("아이가 웃었다");
            sentences.push("아빠가 왔다");
        }
        model.train(sentences, &TrainingConfig::default());
        model
    }

    fn assert_covers(token: &str, spans: &[Span]) {
        assert!(!spans.is_empty());
        assert_eq!(spans[0].begin, 0);
        assert_eq!(spans.last().map(|s| s.end), Some(token.chars().count()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].begin);
            assert!(pair[0].end > pair[0].begin);
        }
        let joined: String = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, token);
    }

    #[test]
    fn short_tokens_are_single_spans() {
        let model = trained();
        let spans = model.segment("커피");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "커피");
        assert!(model.segment("").is_empty());
    }

    #[test]
    fn segmentation_covers_token() {
        let model = trained();
        for token in ["아이스크림을", "커피를마셨다", "처음보는문자열입니다", "abc"] {
            assert_covers(token, &model.segment(token));
        }
    }

    #[test]
    fn segmentation_covers_with_untrained_model() {
        let model = CohesionModel::default();
        let token = "완전히새로운";
        let spans = model.segment(token);
        assert_covers(token, &spans);
    }

    #[test]
    fn long_tokens_stay_covered_past_selection_cap() {
        let model = CohesionModel::default();
        let token = "가".repeat(400);
        assert_covers(&token, &model.segment(&token));
    }

    #[test]
    fn known_word_is_kept_whole() {
        let model = trained();
        let spans = model.segment("아이스크림을");
        assert_eq!(spans[0].text, "아이스크림");
    }

    #[test]
    fn max_length_below_two_yields_whole_token() {
        let model = trained();
        let spans = Segmenter::new(&model).max_length(1).segment("아이스크림");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "아이스크림");
    }

    #[test]
    fn left_prefix_prefers_cohesive_prefix() {
        // 아이 scores (12/15)^(1/2), 아이스크림 scores (9/15)^(1/5), which is higher
        let model = trained();
        assert_eq!(model.tokenize("아이스크림을 커피가"), vec!["아이스크림", "커피"]);
    }

    #[test]
    fn left_prefix_defaults_to_whole_token() {
        let model = CohesionModel::default();
        assert_eq!(model.left_prefix("모르는말"), "모르는말");
        assert_eq!(model.left_prefix("ab"), "ab");
    }

    #[test]
    fn sentence_segmentation_is_per_token() {
        let model = trained();
        let segmented = model.segment_sentence("아이스크림을  커피");
        assert_eq!(segmented.len(), 2);
        assert_eq!(segmented[1].len(), 1);
    }
}
