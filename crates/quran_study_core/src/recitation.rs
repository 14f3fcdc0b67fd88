//! Scores a spoken transcript against the verse the user is memorizing.
//!
//! This is a best-effort heuristic: containment of one normalized string in the other
//! counts as a full match, otherwise the share of target words heard anywhere in the
//! transcript decides. Word order and repetition are not enforced.

use std::collections::HashSet;

use crate::normalize::normalize;

const CORRECT_RATIO: f64 = 0.6;
const PARTIAL_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVerdict {
    Correct,
    Partial,
    Incorrect,
}

impl MatchVerdict {
    /// Localized feedback shown after a recitation attempt.
    pub fn feedback(self) -> &'static str {
        match self {
            MatchVerdict::Correct => "أحسنت! تلاوة صحيحة",
            MatchVerdict::Partial => "قريب، حاول مرة أخرى",
            MatchVerdict::Incorrect => "لم تتطابق التلاوة، حاول مجدداً",
        }
    }
}

/// How many target words were heard, out of how many the target has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordOverlap {
    pub matched: usize,
    pub total: usize,
}

impl WordOverlap {
    /// Counts target words (with repetition) that occur anywhere in `spoken`.
    /// Both inputs are expected to be normalized already.
    pub fn between(target: &str, spoken: &str) -> Self {
        let heard: HashSet<&str> = spoken.split_whitespace().collect();
        let mut overlap = WordOverlap { matched: 0, total: 0 };
        for word in target.split_whitespace() {
            overlap.total += 1;
            if heard.contains(word) {
                overlap.matched += 1;
            }
        }
        overlap
    }

    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.matched as f64 / self.total as f64)
    }

    pub fn verdict(&self) -> MatchVerdict {
        match self.ratio() {
            Some(r) if r > CORRECT_RATIO => MatchVerdict::Correct,
            Some(r) if r > PARTIAL_RATIO => MatchVerdict::Partial,
            _ => MatchVerdict::Incorrect,
        }
    }
}

fn collapse(text: &str) -> String {
    normalize(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classifies `transcript` against `target_text`.
pub fn match_recitation(target_text: &str, transcript: &str) -> MatchVerdict {
    let target = collapse(target_text);
    let spoken = collapse(transcript);

    // An empty side would trivially be "contained" in the other one.
    if target.is_empty() || spoken.is_empty() {
        return MatchVerdict::Incorrect;
    }
    if target.contains(&spoken) || spoken.contains(&target) {
        return MatchVerdict::Correct;
    }
    WordOverlap::between(&target, &spoken).verdict()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FATIHA_2: &str = "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ";

    #[test]
    fn identical_text_is_correct() {
        assert_eq!(match_recitation(FATIHA_2, FATIHA_2), MatchVerdict::Correct);
    }

    #[test]
    fn empty_transcript_is_incorrect() {
        assert_eq!(match_recitation(FATIHA_2, ""), MatchVerdict::Incorrect);
        assert_eq!(match_recitation(FATIHA_2, " ؟ "), MatchVerdict::Incorrect);
    }

    #[test]
    fn empty_target_is_incorrect() {
        assert_eq!(match_recitation("", "الحمد لله"), MatchVerdict::Incorrect);
        assert_eq!(WordOverlap::between("", "الحمد").ratio(), None);
    }

    #[test]
    fn truncated_and_overcaptured_transcripts_are_correct() {
        assert_eq!(match_recitation(FATIHA_2, "لحمد لله"), MatchVerdict::Correct);
        assert_eq!(
            match_recitation(FATIHA_2, "بسم الله لحمد لله رب لعلمين الرحمن"),
            MatchVerdict::Correct
        );
    }

    #[test]
    fn containment_ignores_extra_whitespace() {
        assert_eq!(match_recitation(FATIHA_2, "  لحمد   لله  رب "), MatchVerdict::Correct);
    }

    #[test]
    fn half_the_words_is_partial() {
        let overlap = WordOverlap::between("الحمد لله رب العالمين", "الحمد لله");
        assert_eq!(overlap, WordOverlap { matched: 2, total: 4 });
        assert_eq!(overlap.ratio(), Some(0.5));
        assert_eq!(overlap.verdict(), MatchVerdict::Partial);
    }

    #[test]
    fn reordered_words_score_by_overlap() {
        // Not contained either way, so scoring falls through to word overlap.
        assert_eq!(
            match_recitation("الحمد لله رب العالمين", "العالمين رب لله الحمد"),
            MatchVerdict::Correct
        );
        assert_eq!(
            match_recitation("الحمد لله رب العالمين", "لله قال الحمد"),
            MatchVerdict::Partial
        );
    }

    #[test]
    fn shuffling_a_correct_transcript_keeps_at_least_partial() {
        let target = "قل هو الله احد الله الصمد";
        let spoken = "قل هو الله احد";
        assert_eq!(match_recitation(target, spoken), MatchVerdict::Correct);
        let shuffled = "احد الله قل هو";
        assert_ne!(match_recitation(target, shuffled), MatchVerdict::Incorrect);
    }

    #[test]
    fn unrelated_speech_is_incorrect() {
        assert_eq!(
            match_recitation("الحمد لله رب العالمين", "hello world"),
            MatchVerdict::Incorrect
        );
    }

    #[test]
    fn boundaries_are_exclusive() {
        let exactly_partial = WordOverlap { matched: 3, total: 10 };
        assert_eq!(exactly_partial.verdict(), MatchVerdict::Incorrect);
        let exactly_correct = WordOverlap { matched: 6, total: 10 };
        assert_eq!(exactly_correct.verdict(), MatchVerdict::Partial);
    }
}
