//! Grammatical agreement between word slots.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Grammatical number of a word form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    Singular,
    Plural,
}

impl Number {
    pub const ALL: [Self; 2] = [Self::Singular, Self::Plural];

    /// Picks a number uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Singular
        } else {
            Self::Plural
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Singular => "singular",
            Self::Plural => "plural",
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grammatical gender of a word form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Picks a gender uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Male
        } else {
            Self::Female
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (number, gender) pair selecting one word bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Form {
    pub number: Number,
    pub gender: Gender,
}

impl Form {
    #[must_use]
    pub const fn new(number: Number, gender: Gender) -> Self {
        Self { number, gender }
    }

    /// Picks number and gender independently.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let number = Number::random(rng);
        let gender = Gender::random(rng);
        Self { number, gender }
    }

    /// All four combinations, singular first.
    pub fn all() -> impl Iterator<Item = Self> {
        Number::ALL
            .into_iter()
            .flat_map(|number| Gender::ALL.into_iter().map(move |gender| Self::new(number, gender)))
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.gender)
    }
}

/// Forms for one noun phrase: prefix, ingredient and the adjective that
/// agrees with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseForms {
    pub prefix: Form,
    pub ingredient: Form,
    pub adjective: Form,
}

/// Forms for all seven slots of a dish.
///
/// The two halves are resolved independently; the verb follows the
/// first prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub a: PhraseForms,
    pub verb: Form,
    pub b: PhraseForms,
}

/// Resolves the forms for one generation.
pub fn resolve<R: Rng + ?Sized>(rng: &mut R) -> SlotSpec {
    let a = resolve_phrase(rng);
    let verb = a.prefix;
    let b = resolve_phrase(rng);
    SlotSpec { a, verb, b }
}

fn resolve_phrase<R: Rng + ?Sized>(rng: &mut R) -> PhraseForms {
    let mut ingredient = Form::random(rng);
    // Plural ingredients only exist in the male bank.
    if ingredient.number == Number::Plural {
        ingredient.gender = Gender::Male;
    }

    let prefix = Form::random(rng);

    let mut adjective = Form::random(rng);
    if ingredient.gender == prefix.gender {
        adjective.gender = ingredient.gender;
    }
    if ingredient.number == prefix.number {
        adjective.number = prefix.number;
    }
    if ingredient.gender != prefix.gender && ingredient.number != prefix.number {
        adjective = if rng.gen_bool(0.5) { ingredient } else { prefix };
    }

    PhraseForms {
        prefix,
        ingredient,
        adjective,
    }
}
