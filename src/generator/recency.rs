//! Recently used word tracking.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use super::GenerateError;

/// Number of accepted words remembered per category.
pub const RECENCY_WINDOW: usize = 5;

/// Word categories tracked by the recency filter.
///
/// A and B slots share a category, so `prefixA` and `prefixB` feed the
/// same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Prefix,
    Ingredient,
    Adjective,
    Place,
    Verb,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Prefix,
        Self::Ingredient,
        Self::Adjective,
        Self::Place,
        Self::Verb,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Prefix => 0,
            Self::Ingredient => 1,
            Self::Adjective => 2,
            Self::Place => 3,
            Self::Verb => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Ingredient => "ingredient",
            Self::Adjective => "adjective",
            Self::Place => "place",
            Self::Verb => "verb",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded history of accepted words, oldest first.
#[derive(Debug, Clone)]
pub struct RecencyWindow {
    words: VecDeque<String>,
    capacity: usize,
}

impl RecencyWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Records a word, evicting the oldest ones past capacity.
    pub fn push(&mut self, word: String) {
        self.words.push_back(word);
        while self.words.len() > self.capacity {
            self.words.pop_front();
        }
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.words.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(RECENCY_WINDOW)
    }
}

/// Word picker that avoids the last few accepted words of each category.
#[derive(Debug, Clone)]
pub struct RecencyFilter {
    enabled: bool,
    windows: [RecencyWindow; Category::ALL.len()],
}

impl RecencyFilter {
    /// Creates a filter with the default window size.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self::with_capacity(enabled, RECENCY_WINDOW)
    }

    fn with_capacity(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            windows: std::array::from_fn(|_| RecencyWindow::new(capacity)),
        }
    }

    #[must_use]
    pub fn window(&self, category: Category) -> &RecencyWindow {
        &self.windows[category.index()]
    }

    /// Picks a word uniformly among the eligible candidates.
    ///
    /// With filtering enabled a candidate is eligible when it is not in the
    /// category's window and differs from `exclude`. The accepted word is
    /// then recorded. Fails instead of looping when nothing is eligible.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        category: Category,
        candidates: &[String],
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Result<String, GenerateError> {
        let exhausted = || GenerateError::ExhaustedCandidates {
            category,
            pool: candidates.len(),
        };

        if !self.enabled {
            return candidates.choose(rng).cloned().ok_or_else(exhausted);
        }

        let window = &self.windows[category.index()];
        let eligible: Vec<&String> = candidates
            .iter()
            .filter(|word| !window.contains(word) && exclude != Some(word.as_str()))
            .collect();

        let word = eligible
            .choose(rng)
            .map(|word| (*word).clone())
            .ok_or_else(exhausted)?;

        self.windows[category.index()].push(word.clone());
        Ok(word)
    }
}

impl Default for RecencyFilter {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|&w| w.to_owned()).collect()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = RecencyWindow::new(3);
        for word in ["a", "b", "c", "d"] {
            window.push(word.to_owned());
        }
        assert_eq!(window.len(), 3);
        assert!(!window.contains("a"));
        assert_eq!(window.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_no_repeat_within_window() {
        let pool = words(&["a", "b", "c", "d", "e", "f"]);
        let mut filter = RecencyFilter::new(true);
        let mut rng = StdRng::seed_from_u64(1);
        let mut history: Vec<String> = Vec::new();

        for _ in 0..100 {
            let word = filter
                .pick(Category::Ingredient, &pool, None, &mut rng)
                .unwrap();
            let recent = history.iter().rev().take(RECENCY_WINDOW);
            for previous in recent {
                assert_ne!(previous, &word);
            }
            history.push(word);
        }
    }

    #[test]
    fn test_exclude_is_honored() {
        let pool = words(&["a", "b"]);
        let mut filter = RecencyFilter::new(true);
        let mut rng = StdRng::seed_from_u64(9);
        let word = filter
            .pick(Category::Prefix, &pool, Some("a"), &mut rng)
            .unwrap();
        assert_eq!(word, "b");
    }

    #[test]
    fn test_exhausted_pool_fails() {
        let pool = words(&["a", "b"]);
        let mut filter = RecencyFilter::new(true);
        let mut rng = StdRng::seed_from_u64(2);
        filter.pick(Category::Verb, &pool, None, &mut rng).unwrap();
        filter.pick(Category::Verb, &pool, None, &mut rng).unwrap();

        let err = filter.pick(Category::Verb, &pool, None, &mut rng);
        assert!(matches!(
            err,
            Err(GenerateError::ExhaustedCandidates {
                category: Category::Verb,
                pool: 2
            })
        ));
    }

    #[test]
    fn test_categories_are_independent() {
        let pool = words(&["a"]);
        let mut filter = RecencyFilter::new(true);
        let mut rng = StdRng::seed_from_u64(4);
        filter.pick(Category::Place, &pool, None, &mut rng).unwrap();
        assert!(filter.pick(Category::Verb, &pool, None, &mut rng).is_ok());
        assert!(filter.window(Category::Place).contains("a"));
    }

    #[test]
    fn test_disabled_filter_repeats_freely() {
        let pool = words(&["only"]);
        let mut filter = RecencyFilter::new(false);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..10 {
            let word = filter
                .pick(Category::Adjective, &pool, Some("only"), &mut rng)
                .unwrap();
            assert_eq!(word, "only");
        }
        assert!(filter.window(Category::Adjective).is_empty());
    }

    #[test]
    fn test_empty_pool_fails() {
        let mut filter = RecencyFilter::new(false);
        let mut rng = StdRng::seed_from_u64(4);
        assert!(filter.pick(Category::Prefix, &[], None, &mut rng).is_err());
    }
}
