//! Dish name generator.
//!
//! Resolves grammatical agreement between word slots, picks words while
//! avoiding recent repeats, and composes the final dish text.

mod compose;
mod grammar;
mod recency;

use std::str::FromStr;

use thiserror::Error;

pub use compose::{DishGenerator, GeneratorOptions, MAX_COMPOSE_ATTEMPTS, compose};
pub use grammar::{Form, Gender, Number, PhraseForms, SlotSpec, resolve};
pub use recency::{Category, RECENCY_WINDOW, RecencyFilter, RecencyWindow};

/// Errors that can occur while generating a dish.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("No eligible {category} left to pick from a pool of {pool} words")]
    ExhaustedCandidates { category: Category, pool: usize },

    #[error("Could not compose a dish within {max_chars} characters after {attempts} attempts")]
    TooLong { max_chars: usize, attempts: usize },
}

/// Generation behavior presets.
///
/// `Fresh` filters recently used words and rarely mentions places.
/// `Plain` picks freely and mentions places half of the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorVariant {
    #[default]
    Fresh,
    Plain,
}

impl GeneratorVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Plain => "plain",
        }
    }
}

impl FromStr for GeneratorVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fresh" => Ok(Self::Fresh),
            "plain" => Ok(Self::Plain),
            other => Err(format!("unknown generator variant: {other}")),
        }
    }
}

impl std::fmt::Display for GeneratorVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
