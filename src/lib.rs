//! Dish Bot Library
//!
//! A bot that posts grammatically agreeing, made-up dish names on a
//! schedule.
//!
//! This crate provides the core functionality for:
//! - Loading API credentials, settings and the vocabulary file
//! - Resolving grammatical forms and composing dish names
//! - Signing and publishing posts with retry on transient failures
//! - Running the fixed-period posting loop

pub mod config;
pub mod generator;
pub mod scheduler;
pub mod twitter;
