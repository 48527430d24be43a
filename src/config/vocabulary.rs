//! Vocabulary loading and validation.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::{Form, Gender, Number};

/// Errors that can occur while loading a vocabulary file.
#[derive(Debug, Error)]
pub enum VocabLoadError {
    #[error("Failed to read vocabulary file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse vocabulary file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Vocabulary has no word bank for {number} {gender}")]
    MissingForm { number: Number, gender: Gender },

    #[error("Vocabulary list {kind} for {number} {gender} is empty")]
    EmptyCategory {
        number: Number,
        gender: Gender,
        kind: WordKind,
    },

    #[error("Vocabulary needs at least 2 places, found {found}")]
    NotEnoughPlaces { found: usize },

    #[error("Phrasing must list at least one preposition")]
    NoPrepositions,

    #[error(
        "Vocabulary list {pool} has {found} distinct words, the recency filter needs at least {required}"
    )]
    PoolTooSmall {
        pool: String,
        found: usize,
        required: usize,
    },
}

/// The word lists of a single word bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    PrefixA,
    IngredientA,
    PrefixB,
    IngredientB,
    Adjective,
    Verb,
}

impl WordKind {
    pub const ALL: [Self; 6] = [
        Self::PrefixA,
        Self::IngredientA,
        Self::PrefixB,
        Self::IngredientB,
        Self::Adjective,
        Self::Verb,
    ];

    /// Key used for this list in the vocabulary file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrefixA => "prefixA",
            Self::IngredientA => "ingredientA",
            Self::PrefixB => "prefixB",
            Self::IngredientB => "ingredientB",
            Self::Adjective => "adjective",
            Self::Verb => "verb",
        }
    }

    #[must_use]
    pub const fn is_ingredient(self) -> bool {
        matches!(self, Self::IngredientA | Self::IngredientB)
    }

    /// Whether the grammar can ever ask for this list in the given form.
    ///
    /// Plural ingredients are always male, so the plural female
    /// ingredient lists are never read.
    #[must_use]
    pub fn is_reachable(self, form: Form) -> bool {
        !(self.is_ingredient() && form == Form::new(Number::Plural, Gender::Female))
    }
}

impl fmt::Display for WordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Word lists for one (number, gender) combination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WordBank {
    #[serde(rename = "prefixA", alias = "previxA", default)]
    pub prefix_a: Vec<String>,

    #[serde(rename = "ingredientA", alias = "ingridientA", default)]
    pub ingredient_a: Vec<String>,

    #[serde(rename = "prefixB", default)]
    pub prefix_b: Vec<String>,

    #[serde(rename = "ingredientB", alias = "ingridientB", default)]
    pub ingredient_b: Vec<String>,

    #[serde(default)]
    pub adjective: Vec<String>,

    #[serde(default)]
    pub verb: Vec<String>,
}

impl WordBank {
    #[must_use]
    pub fn list(&self, kind: WordKind) -> &[String] {
        match kind {
            WordKind::PrefixA => &self.prefix_a,
            WordKind::IngredientA => &self.ingredient_a,
            WordKind::PrefixB => &self.prefix_b,
            WordKind::IngredientB => &self.ingredient_b,
            WordKind::Adjective => &self.adjective,
            WordKind::Verb => &self.verb,
        }
    }
}

/// Connecting words used when composing a dish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Phrasing {
    /// Text placed directly in front of a place name.
    pub place_prefix: String,

    /// Plain connector between the two halves.
    pub separator: String,

    /// Prepositions following the verb in the verb connector.
    pub prepositions: Vec<String>,
}

impl Default for Phrasing {
    fn default() -> Self {
        Self {
            place_prefix: "from ".to_owned(),
            separator: ",".to_owned(),
            prepositions: vec!["in".to_owned(), "on".to_owned()],
        }
    }
}

fn distinct(words: &[String]) -> usize {
    words.iter().collect::<HashSet<_>>().len()
}

/// Size of one candidate pool, as reported by [`VocabularySet::pool_sizes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSize {
    pub form: Form,
    pub kind: WordKind,
    pub size: usize,
}

/// The full vocabulary: gendered word banks plus shared places.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VocabularySet {
    /// Word banks keyed by number, then gender.
    pub names: BTreeMap<Number, BTreeMap<Gender, WordBank>>,

    /// Place names shared by every form.
    pub place: Vec<String>,

    #[serde(default)]
    pub phrasing: Phrasing,
}

#[derive(Deserialize)]
struct VocabDocument {
    vocab: VocabularySet,
}

#[derive(Serialize)]
struct VocabDocumentRef<'a> {
    vocab: &'a VocabularySet,
}

impl VocabularySet {
    /// Loads and validates a vocabulary from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, VocabLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates a vocabulary document.
    pub fn from_yaml_str(content: &str) -> Result<Self, VocabLoadError> {
        let document: VocabDocument = serde_yaml::from_str(content)?;
        document.vocab.validate()?;
        Ok(document.vocab)
    }

    /// Saves the vocabulary to a YAML file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), VocabLoadError> {
        let content = serde_yaml::to_string(&VocabDocumentRef { vocab: self })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Builds a vocabulary that uses the same bank for every form.
    #[must_use]
    pub fn uniform(bank: &WordBank, place: Vec<String>) -> Self {
        let mut names = BTreeMap::new();
        for form in Form::all() {
            names
                .entry(form.number)
                .or_insert_with(BTreeMap::new)
                .insert(form.gender, bank.clone());
        }

        Self {
            names,
            place,
            phrasing: Phrasing::default(),
        }
    }

    /// Checks that every list the grammar can reach is populated.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), VocabLoadError> {
        for form in Form::all() {
            let bank = self.bank(form).ok_or(VocabLoadError::MissingForm {
                number: form.number,
                gender: form.gender,
            })?;

            for kind in WordKind::ALL {
                if kind.is_reachable(form) && bank.list(kind).is_empty() {
                    return Err(VocabLoadError::EmptyCategory {
                        number: form.number,
                        gender: form.gender,
                        kind,
                    });
                }
            }
        }

        // The second place must differ from the first.
        if self.place.len() < 2 {
            return Err(VocabLoadError::NotEnoughPlaces {
                found: self.place.len(),
            });
        }

        if self.phrasing.prepositions.is_empty() {
            return Err(VocabLoadError::NoPrepositions);
        }

        Ok(())
    }

    /// Checks that every reachable list and the places outlast a recency
    /// window of `window` words.
    ///
    /// With `window + 1` distinct words a fresh one is always left, and the
    /// word excluded from a B slot is already inside the window.
    ///
    /// # Errors
    ///
    /// Returns the first list that is too small.
    pub fn validate_recency(&self, window: usize) -> Result<(), VocabLoadError> {
        let required = window + 1;
        let too_small = |pool: String, found: usize| VocabLoadError::PoolTooSmall {
            pool,
            found,
            required,
        };

        for pool in self.pool_sizes() {
            let found = distinct(self.words(pool.form, pool.kind));
            if found < required {
                return Err(too_small(format!("{} {}", pool.form, pool.kind), found));
            }
        }

        let found = distinct(&self.place);
        if found < required {
            return Err(too_small("place".to_owned(), found));
        }

        Ok(())
    }

    /// Returns the word bank for a form, if present.
    #[must_use]
    pub fn bank(&self, form: Form) -> Option<&WordBank> {
        self.names.get(&form.number)?.get(&form.gender)
    }

    /// Returns the candidates for a form and list; empty when missing.
    #[must_use]
    pub fn words(&self, form: Form, kind: WordKind) -> &[String] {
        self.bank(form)
            .map(|bank| bank.list(kind))
            .unwrap_or_default()
    }

    /// Sizes of every reachable candidate pool.
    #[must_use]
    pub fn pool_sizes(&self) -> Vec<PoolSize> {
        Form::all()
            .flat_map(|form| {
                WordKind::ALL
                    .into_iter()
                    .filter(move |kind| kind.is_reachable(form))
                    .map(move |kind| PoolSize {
                        form,
                        kind,
                        size: self.words(form, kind).len(),
                    })
            })
            .collect()
    }

    /// Total number of words across all banks and places.
    #[must_use]
    pub fn word_count(&self) -> usize {
        let bank_words: usize = self
            .names
            .values()
            .flat_map(BTreeMap::values)
            .map(|bank| WordKind::ALL.iter().map(|&kind| bank.list(kind).len()).sum::<usize>())
            .sum();
        bank_words + self.place.len()
    }

    /// Creates an example vocabulary for users to reference.
    #[must_use]
    pub fn example() -> Self {
        let mut names = BTreeMap::new();

        let singular = BTreeMap::from([
            (
                Gender::Male,
                word_bank(
                    "grilled roasted smoked braised poached crispy glazed stuffed",
                    "salmon tofu lamb duck cabbage risotto leek fennel",
                    "minced pickled seared charred whipped fried cured baked",
                    "beetroot halloumi barley chicken mackerel celeriac quince walnut",
                    "tender golden rustic zesty velvety smoky silky hearty",
                    "drizzled sprinkled folded layered tossed nestled served dusted",
                ),
            ),
            (
                Gender::Female,
                word_bank(
                    "steamed toasted candied marinated blanched caramelised sauteed flambeed",
                    "aubergine polenta squid pumpkin sardine brioche okra tahini",
                    "shredded infused spiced creamed frozen puffed rolled brined",
                    "courgette ricotta lentil trout parsnip plum hazelnut chard",
                    "fragrant bright delicate crumbly buttery tangy mellow fiery",
                    "piled spooned wrapped scattered glazed stacked poured laid",
                ),
            ),
        ]);

        let plural = BTreeMap::from([
            (
                Gender::Male,
                word_bank(
                    "twice-cooked slow-roasted hand-rolled chargrilled oven-dried sun-dried stone-baked wood-fired",
                    "mushrooms dumplings lentils clams noodles chickpeas shallots figs",
                    "tiny wild heirloom baby local seasonal foraged young",
                    "prawns peppers olives mussels radishes apricots cherries beans",
                    "plump juicy crunchy glossy sticky earthy nutty sweet",
                    "heaped arranged strewn lined crowned draped bathed rolled",
                ),
            ),
            (
                Gender::Female,
                word_bank(
                    "pan-fried deep-fried flash-fried ember-roasted clay-baked salt-baked smoke-kissed honey-cured",
                    "",
                    "fresh ripe tender young pickled roasted toasted smoked",
                    "",
                    "soft warm cool crisp rich light bold gentle",
                    "served topped paired finished filled dressed sprinkled dotted",
                ),
            ),
        ]);

        names.insert(Number::Singular, singular);
        names.insert(Number::Plural, plural);

        Self {
            names,
            place: split_words("Naples Lyon Oaxaca Osaka Tbilisi Marrakesh Lima Hanoi"),
            phrasing: Phrasing::default(),
        }
    }
}

fn word_bank(
    prefix_a: &str,
    ingredient_a: &str,
    prefix_b: &str,
    ingredient_b: &str,
    adjective: &str,
    verb: &str,
) -> WordBank {
    WordBank {
        prefix_a: split_words(prefix_a),
        ingredient_a: split_words(ingredient_a),
        prefix_b: split_words(prefix_b),
        ingredient_b: split_words(ingredient_b),
        adjective: split_words(adjective),
        verb: split_words(verb),
    }
}

fn split_words(words: &str) -> Vec<String> {
    words.split_whitespace().map(str::to_owned).collect()
}
