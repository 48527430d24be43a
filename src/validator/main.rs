//! Standalone validator for vocabulary files.
//!
//! This tool loads a vocabulary YAML file, checks every required word
//! list, checks the lists against the recency filter when it is on, and
//! prints sample dishes generated with the configured variant.

use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use dish_bot::config::{BotSettings, DEFAULT_VOCAB_FILE, VocabularySet};
use dish_bot::generator::{DishGenerator, RECENCY_WINDOW};

/// Vocabulary file validator.
#[derive(Parser, Debug)]
#[command(name = "validate_vocab")]
#[command(about = "Validates vocabulary files for the dish bot")]
#[command(version)]
struct Args {
    /// Path to the vocabulary YAML file to validate.
    #[arg(short, long, default_value = DEFAULT_VOCAB_FILE)]
    file: String,

    /// Number of sample dishes to generate.
    #[arg(short, long, default_value_t = 5)]
    samples: usize,

    /// Seed for the sample dishes.
    #[arg(long)]
    seed: Option<u64>,

    /// Generate an example vocabulary file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show the size of every word pool.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_vocab(&args)
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = VocabularySet::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example vocabulary written to: {output_path}");
            println!(
                "\nThe file contains {} words and {} places.",
                example.word_count(),
                example.place.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_vocab(args: &Args) -> ExitCode {
    println!("Validating: {}", args.file);

    // Generation knobs come from the same variables the bot reads.
    dotenvy::dotenv().ok();
    let settings = match BotSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Invalid settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    let options = settings.generator;
    println!(
        "Variant: {} (recency filter {})\n",
        settings.variant,
        if options.recency { "on" } else { "off" }
    );

    let vocab = match VocabularySet::load_from_file(&args.file) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("✗ Invalid vocabulary: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.verbose {
        for pool in vocab.pool_sizes() {
            println!("  {} {}: {} words", pool.form, pool.kind, pool.size);
        }
        println!("  place: {} entries\n", vocab.place.len());
    }

    let recency_check = if options.recency {
        vocab.validate_recency(RECENCY_WINDOW)
    } else {
        Ok(())
    };
    if let Err(e) = recency_check {
        eprintln!("✗ Invalid vocabulary: {e}");
        return ExitCode::FAILURE;
    }

    println!(
        "✓ Vocabulary is valid: {} words, {} places",
        vocab.word_count(),
        vocab.place.len()
    );

    if args.samples > 0 {
        print_samples(vocab, &settings, args);
    }

    ExitCode::SUCCESS
}

fn print_samples(vocab: VocabularySet, settings: &BotSettings, args: &Args) {
    let mut rng = args
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut generator = DishGenerator::new(vocab, settings.generator);

    println!("\nSample dishes:");
    for i in 1..=args.samples {
        match generator.generate_within(settings.max_post_length, &mut rng) {
            Ok(dish) => println!("  {i}. {dish}"),
            Err(e) => {
                println!("  ✗ {e}");
                break;
            }
        }
    }
}
