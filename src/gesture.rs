//! Gesture outcomes and the label → gesture decision table.
//!
//! The classifier reports ranked `(label, confidence)` pairs. Only the top
//! entry matters: if its confidence clears the threshold, the label is looked
//! up in a [`LabelTable`]; anything else is [`Gesture::Empty`].

use std::collections::HashMap;
use std::fmt;

/// Number of ranked classifications kept per frame.
pub const TOP_K: usize = 3;

/// Minimum confidence (exclusive) for the top label to count.
pub const DEFAULT_THRESHOLD: f32 = 0.01;

/// Model label for a closed right fist.
pub const LABEL_FIST: &str = "fist-UB-RHand";
/// Model label for an open right hand (five fingers).
pub const LABEL_OPEN_HAND: &str = "FIVE-UB-RHand";
/// Model label for a frame without a hand.
pub const LABEL_NO_HAND: &str = "no-hand";

/// The three possible outcomes of a recognition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    /// No hand, unknown label, or low confidence
    #[default]
    Empty,
    /// Open hand, five fingers spread
    OpenHand,
    /// Closed fist
    Fist,
}

impl Gesture {
    /// All outcomes, in display order.
    pub const ALL: [Gesture; 3] = [Gesture::Empty, Gesture::OpenHand, Gesture::Fist];

    /// Emoji rendered for this outcome.
    pub fn glyph(self) -> &'static str {
        match self {
            Gesture::Empty => "❎",
            Gesture::OpenHand => "🖐",
            Gesture::Fist => "👊",
        }
    }

    /// Parse a gesture name as used in config files.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "empty" | "none" => Some(Self::Empty),
            "open-hand" | "open_hand" | "hand" => Some(Self::OpenHand),
            "fist" => Some(Self::Fist),
            _ => None,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::Empty => write!(f, "empty"),
            Gesture::OpenHand => write!(f, "open-hand"),
            Gesture::Fist => write!(f, "fist"),
        }
    }
}

/// One ranked entry from the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Model label
    pub label: String,
    /// Score in 0.0..=1.0
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {:.2}", self.label, self.confidence)
    }
}

/// Sort classifications by confidence (descending) and keep the top `k`.
///
/// NaN scores sort last.
pub fn rank_top_k(mut results: Vec<Classification>, k: usize) -> Vec<Classification> {
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or_else(|| a.confidence.is_nan().cmp(&b.confidence.is_nan()))
    });
    results.truncate(k);
    results
}

/// Label → gesture lookup plus the confidence threshold.
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: HashMap<String, Gesture>,
    threshold: f32,
}

impl Default for LabelTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(LABEL_FIST.to_string(), Gesture::Fist);
        entries.insert(LABEL_OPEN_HAND.to_string(), Gesture::OpenHand);
        entries.insert(LABEL_NO_HAND.to_string(), Gesture::Empty);
        Self {
            entries,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl LabelTable {
    /// Default table with a custom threshold.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, label: impl Into<String>, gesture: Gesture) {
        self.entries.insert(label.into(), gesture);
    }

    /// Look up a label. `None` for labels the table doesn't know.
    pub fn lookup(&self, label: &str) -> Option<Gesture> {
        self.entries.get(label).copied()
    }

    /// Entries sorted by label, for listing.
    pub fn entries(&self) -> Vec<(&str, Gesture)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(label, gesture)| (label.as_str(), *gesture))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Map a ranked result list to an outcome.
    ///
    /// Returns `None` when there is nothing to decide on (empty list). Only the
    /// first entry is considered; the list is assumed to be ranked already.
    pub fn decide(&self, ranked: &[Classification]) -> Option<Gesture> {
        let top = ranked.first()?;
        if top.confidence.is_nan() || top.confidence <= self.threshold {
            return Some(Gesture::Empty);
        }
        match self.lookup(&top.label) {
            Some(gesture) => Some(gesture),
            None => {
                log::warn!("Unrecognized prediction: {}", top);
                Some(Gesture::Empty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(label: &str, confidence: f32) -> Classification {
        Classification::new(label, confidence)
    }

    #[test]
    fn test_default_gesture_is_empty() {
        assert_eq!(Gesture::default(), Gesture::Empty);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(Gesture::Empty.glyph(), "❎");
        assert_eq!(Gesture::OpenHand.glyph(), "🖐");
        assert_eq!(Gesture::Fist.glyph(), "👊");
    }

    #[test]
    fn test_gesture_from_str_round_trips_display() {
        for gesture in Gesture::ALL {
            assert_eq!(Gesture::from_str(&gesture.to_string()), Some(gesture));
        }
        assert_eq!(Gesture::from_str("HAND"), Some(Gesture::OpenHand));
        assert_eq!(Gesture::from_str("thumbs-up"), None);
    }

    #[test]
    fn test_decide_fist_above_threshold() {
        let table = LabelTable::default();
        let ranked = vec![
            c(LABEL_FIST, 0.92),
            c(LABEL_NO_HAND, 0.05),
            c(LABEL_OPEN_HAND, 0.03),
        ];
        assert_eq!(table.decide(&ranked), Some(Gesture::Fist));
    }

    #[test]
    fn test_decide_only_looks_at_top_entry() {
        let table = LabelTable::default();
        let ranked = vec![c(LABEL_NO_HAND, 0.40), c(LABEL_FIST, 0.30)];
        assert_eq!(table.decide(&ranked), Some(Gesture::Empty));
    }

    #[test]
    fn test_decide_below_threshold_is_empty() {
        let table = LabelTable::default();
        assert_eq!(
            table.decide(&[c(LABEL_OPEN_HAND, 0.009)]),
            Some(Gesture::Empty)
        );
        // Threshold itself is not enough
        assert_eq!(
            table.decide(&[c(LABEL_OPEN_HAND, DEFAULT_THRESHOLD)]),
            Some(Gesture::Empty)
        );
    }

    #[test]
    fn test_decide_open_hand() {
        let table = LabelTable::default();
        assert_eq!(
            table.decide(&[c(LABEL_OPEN_HAND, 0.5)]),
            Some(Gesture::OpenHand)
        );
    }

    #[test]
    fn test_decide_unknown_label_is_empty() {
        let table = LabelTable::default();
        assert_eq!(table.decide(&[c("peace-sign", 0.99)]), Some(Gesture::Empty));
    }

    #[test]
    fn test_decide_nan_is_empty() {
        let table = LabelTable::default();
        assert_eq!(table.decide(&[c(LABEL_FIST, f32::NAN)]), Some(Gesture::Empty));
    }

    #[test]
    fn test_decide_empty_list_has_no_outcome() {
        assert_eq!(LabelTable::default().decide(&[]), None);
    }

    #[test]
    fn test_custom_mapping_and_threshold() {
        let mut table = LabelTable::with_threshold(0.5);
        table.insert("fist-UB-LHand", Gesture::Fist);
        assert_eq!(table.decide(&[c("fist-UB-LHand", 0.6)]), Some(Gesture::Fist));
        assert_eq!(table.decide(&[c("fist-UB-LHand", 0.4)]), Some(Gesture::Empty));
    }

    #[test]
    fn test_rank_top_k_sorts_and_truncates() {
        let ranked = rank_top_k(
            vec![
                c("a", 0.1),
                c("b", 0.7),
                c("c", f32::NAN),
                c("d", 0.15),
                c("e", 0.05),
            ],
            TOP_K,
        );
        let labels: Vec<_> = ranked.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_entries_sorted() {
        let table = LabelTable::default();
        let labels: Vec<_> = table.entries().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec![LABEL_OPEN_HAND, LABEL_FIST, LABEL_NO_HAND]);
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(c(LABEL_FIST, 0.923).to_string(), "fist-UB-RHand : 0.92");
    }
}
