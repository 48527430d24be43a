//! Dish composition.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::{Category, GenerateError, GeneratorVariant, RecencyFilter, SlotSpec, resolve};
use crate::config::{VocabularySet, WordKind};

/// How many dishes to try before giving up on the length limit.
pub const MAX_COMPOSE_ATTEMPTS: usize = 8;

/// Tuning knobs for dish composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorOptions {
    /// Whether recently used words are avoided.
    pub recency: bool,

    /// Probability of including each adjective clause.
    pub adjective_chance: f64,

    /// Probability of including each place clause.
    pub place_chance: f64,
}

impl GeneratorOptions {
    /// Default options for a variant.
    #[must_use]
    pub const fn for_variant(variant: GeneratorVariant) -> Self {
        match variant {
            GeneratorVariant::Fresh => Self {
                recency: true,
                adjective_chance: 0.5,
                place_chance: 1.0 / 7.0,
            },
            GeneratorVariant::Plain => Self {
                recency: false,
                adjective_chance: 0.5,
                place_chance: 0.5,
            },
        }
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::for_variant(GeneratorVariant::default())
    }
}

/// Assembles the dish text for a resolved slot specification.
///
/// Every word is picked (and recorded by the recency filter) before the
/// optional clauses are decided, so omitted adjectives and places still
/// count as recently used.
pub fn compose<R: Rng + ?Sized>(
    vocab: &VocabularySet,
    spec: &SlotSpec,
    recency: &mut RecencyFilter,
    options: &GeneratorOptions,
    rng: &mut R,
) -> Result<String, GenerateError> {
    let prefix_a = recency.pick(
        Category::Prefix,
        vocab.words(spec.a.prefix, WordKind::PrefixA),
        None,
        rng,
    )?;
    let ingredient_a = recency.pick(
        Category::Ingredient,
        vocab.words(spec.a.ingredient, WordKind::IngredientA),
        None,
        rng,
    )?;
    let adjective_a = recency.pick(
        Category::Adjective,
        vocab.words(spec.a.adjective, WordKind::Adjective),
        None,
        rng,
    )?;
    let place_a = recency.pick(Category::Place, &vocab.place, None, rng)?;
    let verb = recency.pick(
        Category::Verb,
        vocab.words(spec.verb, WordKind::Verb),
        None,
        rng,
    )?;

    let prefix_b = recency.pick(
        Category::Prefix,
        vocab.words(spec.b.prefix, WordKind::PrefixB),
        Some(&prefix_a),
        rng,
    )?;
    let ingredient_b = recency.pick(
        Category::Ingredient,
        vocab.words(spec.b.ingredient, WordKind::IngredientB),
        Some(&ingredient_a),
        rng,
    )?;
    let adjective_b = recency.pick(
        Category::Adjective,
        vocab.words(spec.b.adjective, WordKind::Adjective),
        Some(&adjective_a),
        rng,
    )?;
    let place_b = recency.pick(Category::Place, &vocab.place, Some(&place_a), rng)?;

    let phrasing = &vocab.phrasing;
    let place_clause = |place: &str| format!("{}{place}", phrasing.place_prefix);

    let adjective_a = optional(rng, options.adjective_chance, adjective_a);
    let place_a = optional(rng, options.place_chance, place_clause(&place_a));
    let connector = if rng.gen_bool(0.5) {
        phrasing.separator.clone()
    } else {
        let preposition = phrasing
            .prepositions
            .choose(rng)
            .map_or("", String::as_str);
        format!("{verb} {preposition}")
    };
    let adjective_b = optional(rng, options.adjective_chance, adjective_b);
    let place_b = optional(rng, options.place_chance, place_clause(&place_b));

    let parts = [
        prefix_a,
        ingredient_a,
        adjective_a,
        place_a,
        connector,
        prefix_b,
        ingredient_b,
        adjective_b,
        place_b,
    ];

    Ok(collapse_spaces(&parts.join(" ")))
}

/// Returns `text` with the given probability, otherwise an empty string.
fn optional<R: Rng + ?Sized>(rng: &mut R, chance: f64, text: String) -> String {
    if chance > 0.0 && (chance >= 1.0 || rng.r#gen::<f64>() < chance) {
        text
    } else {
        String::new()
    }
}

/// Collapses whitespace runs left by omitted clauses into single spaces.
fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stateful dish generator: vocabulary plus recency history.
#[derive(Debug, Clone)]
pub struct DishGenerator {
    vocab: VocabularySet,
    recency: RecencyFilter,
    options: GeneratorOptions,
}

impl DishGenerator {
    #[must_use]
    pub fn new(vocab: VocabularySet, options: GeneratorOptions) -> Self {
        Self {
            vocab,
            recency: RecencyFilter::new(options.recency),
            options,
        }
    }

    /// Resolves a fresh slot specification and composes one dish.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String, GenerateError> {
        let spec = resolve(rng);
        compose(&self.vocab, &spec, &mut self.recency, &self.options, rng)
    }

    /// Generates dishes until one fits in `max_chars` characters.
    ///
    /// Words of a rejected dish are not kept in the recency history.
    pub fn generate_within<R: Rng + ?Sized>(
        &mut self,
        max_chars: usize,
        rng: &mut R,
    ) -> Result<String, GenerateError> {
        for attempt in 1..=MAX_COMPOSE_ATTEMPTS {
            let snapshot = self.recency.clone();
            let dish = self.generate(rng)?;
            let length = dish.chars().count();
            if length <= max_chars {
                return Ok(dish);
            }
            self.recency = snapshot;
            debug!(
                "Dish attempt {} too long ({} > {} chars), regenerating",
                attempt, length, max_chars
            );
        }

        Err(GenerateError::TooLong {
            max_chars,
            attempts: MAX_COMPOSE_ATTEMPTS,
        })
    }
}
