//! End-to-end dish generation from a vocabulary file on disk.

use std::io::Write;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::NamedTempFile;

use dish_bot::config::{MAX_POST_LENGTH, VocabLoadError, VocabularySet};
use dish_bot::generator::{
    DishGenerator, GenerateError, GeneratorOptions, GeneratorVariant, RECENCY_WINDOW,
};
use dish_bot::scheduler::DishScheduler;
use dish_bot::twitter::DryRunPublisher;

const TINY_VOCAB: &str = r"
vocab:
  names:
    singular:
      male:
        prefixA: [spicy]
        ingredientA: [soup]
        prefixB: [sweet]
        ingredientB: [pie]
        adjective: [hot]
        verb: [served]
      female:
        prefixA: [spicy]
        ingredientA: [soup]
        prefixB: [sweet]
        ingredientB: [pie]
        adjective: [hot]
        verb: [served]
    plural:
      male:
        prefixA: [spicy]
        ingredientA: [soups]
        prefixB: [sweet]
        ingredientB: [pies]
        adjective: [hot]
        verb: [served]
      female:
        prefixA: [spicy]
        prefixB: [sweet]
        adjective: [hot]
        verb: [served]
  place: [Paris, Rome]
  phrasing:
    separator: ';'
";

fn example_vocab_file() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    VocabularySet::example().save_to_file(file.path()).unwrap();
    file
}

fn generate_many(vocab: VocabularySet, seed: u64, count: usize) -> Vec<String> {
    let mut generator = DishGenerator::new(vocab, GeneratorOptions::default());
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| generator.generate_within(MAX_POST_LENGTH, &mut rng).unwrap())
        .collect()
}

#[test]
fn test_generates_clean_dishes_from_file() {
    let file = example_vocab_file();
    let vocab = VocabularySet::load_from_file(file.path()).unwrap();

    for dish in generate_many(vocab, 7, 200) {
        assert!(!dish.is_empty());
        assert!(!dish.contains("  "), "double space in {dish:?}");
        assert_eq!(dish.trim(), dish);
        assert!(!dish.contains('\n'));
        assert!(dish.chars().count() <= MAX_POST_LENGTH);
    }
}

#[test]
fn test_same_seed_same_dishes() {
    let file = example_vocab_file();
    let first = generate_many(VocabularySet::load_from_file(file.path()).unwrap(), 42, 20);
    let second = generate_many(VocabularySet::load_from_file(file.path()).unwrap(), 42, 20);
    let other = generate_many(VocabularySet::load_from_file(file.path()).unwrap(), 43, 20);

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_tiny_vocab_plain_variant() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TINY_VOCAB.as_bytes()).unwrap();
    let vocab = VocabularySet::load_from_file(file.path()).unwrap();

    let options = GeneratorOptions {
        adjective_chance: 0.0,
        place_chance: 0.0,
        ..GeneratorOptions::for_variant(GeneratorVariant::Plain)
    };
    let mut generator = DishGenerator::new(vocab, options);
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..50 {
        let dish = generator.generate(&mut rng).unwrap();
        assert!(dish.starts_with("spicy soup"), "{dish}");
        assert!(
            dish.ends_with("sweet pie") || dish.ends_with("sweet pies"),
            "{dish}"
        );
        assert!(
            dish.contains(" ; ") || dish.contains(" served in ") || dish.contains(" served on "),
            "{dish}"
        );
    }
}

#[test]
fn test_tiny_vocab_fresh_variant_runs_dry() {
    let vocab = VocabularySet::from_yaml_str(TINY_VOCAB).unwrap();
    let mut generator = DishGenerator::new(vocab, GeneratorOptions::default());
    let mut rng = StdRng::seed_from_u64(3);

    let result = generator.generate(&mut rng);
    assert!(matches!(
        result,
        Err(GenerateError::ExhaustedCandidates { .. })
    ));
}

#[test]
fn test_recency_check_rejects_vocab_that_runs_dry() {
    let mut vocab = VocabularySet::example();
    vocab.place.truncate(2);
    assert!(vocab.validate().is_ok());
    assert!(matches!(
        vocab.validate_recency(RECENCY_WINDOW),
        Err(VocabLoadError::PoolTooSmall { found: 2, .. })
    ));

    let mut generator = DishGenerator::new(vocab, GeneratorOptions::default());
    let mut rng = StdRng::seed_from_u64(1);
    assert!(generator.generate(&mut rng).is_ok());
    assert!(matches!(
        generator.generate(&mut rng),
        Err(GenerateError::ExhaustedCandidates { pool: 2, .. })
    ));
}

#[tokio::test]
async fn test_dry_run_cycle() {
    let file = example_vocab_file();
    let vocab = VocabularySet::load_from_file(file.path()).unwrap();
    let generator = DishGenerator::new(vocab, GeneratorOptions::default());

    let mut scheduler =
        DishScheduler::new(DryRunPublisher::new(), generator, Duration::from_secs(3600))
            .with_seed(11);

    let receipt = scheduler.cycle().await.unwrap();
    assert_eq!(receipt.id, "dry-run-1");
    assert_eq!(scheduler.state().last_dish(), Some(receipt.text.as_str()));
}
