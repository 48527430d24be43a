//! Dish scheduler runner.
//!
//! Each cycle generates one dish that fits the post length limit and
//! publishes it through the retry policy. The first cycle runs at
//! startup, then one per period. A cycle that fails after retries ends
//! the run with an error.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::SchedulerState;
use crate::config::MAX_POST_LENGTH;
use crate::generator::{DishGenerator, GenerateError};
use crate::twitter::{PostReceipt, PublishError, Publisher, RetryPolicy, truncate};

/// Messages that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Post a dish immediately and restart the period.
    PostNow,
    /// Stop the scheduler.
    Shutdown,
}

/// Errors that end a scheduler run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to generate dish: {0}")]
    Generate(#[from] GenerateError),

    #[error("Failed to publish dish: {0}")]
    Publish(#[from] PublishError),
}

/// Fixed-interval dish poster.
pub struct DishScheduler<P> {
    /// Where dishes are posted.
    publisher: P,

    /// Dish generator with its recency history.
    generator: DishGenerator,

    /// Randomness for generation.
    rng: StdRng,

    /// Posting statistics.
    state: SchedulerState,

    /// Time between cycles.
    period: Duration,

    /// Post length limit in characters.
    max_post_length: usize,

    /// Retry policy for publishing.
    retry: RetryPolicy,
}

impl<P: Publisher> DishScheduler<P> {
    /// Creates a scheduler with an entropy-seeded generator.
    #[must_use]
    pub fn new(publisher: P, generator: DishGenerator, period: Duration) -> Self {
        Self {
            publisher,
            generator,
            rng: StdRng::from_entropy(),
            state: SchedulerState::new(),
            period,
            max_post_length: MAX_POST_LENGTH,
            retry: RetryPolicy::default(),
        }
    }

    /// Seeds the generator for reproducible dishes.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub const fn with_max_post_length(mut self, max_post_length: usize) -> Self {
        self.max_post_length = max_post_length;
        self
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs the scheduler loop until shutdown or a fatal cycle error.
    ///
    /// A shutdown message also interrupts a cycle in progress, including
    /// one waiting out a publish backoff.
    pub async fn run(
        &mut self,
        mut rx: mpsc::Receiver<SchedulerMessage>,
    ) -> Result<(), SchedulerError> {
        info!("Dish scheduler started, posting every {:?}", self.period);

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let completed = tokio::select! {
                biased;

                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::PostNow) => {
                            debug!("Received post now message");
                            let completed = self.cycle_until_shutdown(&mut rx).await?;
                            timer.reset();
                            completed
                        }
                        Some(SchedulerMessage::Shutdown) | None => false,
                    }
                }
                _ = timer.tick() => self.cycle_until_shutdown(&mut rx).await?,
            };

            if !completed {
                break;
            }
        }

        info!("Scheduler shutting down ({})", self.state.summary());
        Ok(())
    }

    /// Runs one cycle unless shutdown is requested first.
    ///
    /// Returns `false` when the cycle was abandoned for shutdown.
    async fn cycle_until_shutdown(
        &mut self,
        rx: &mut mpsc::Receiver<SchedulerMessage>,
    ) -> Result<bool, SchedulerError> {
        let cycle = self.cycle();
        tokio::pin!(cycle);

        loop {
            tokio::select! {
                biased;

                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::PostNow) => debug!("Post already in progress"),
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!("Shutdown requested, abandoning current cycle");
                            return Ok(false);
                        }
                    }
                }
                result = &mut cycle => {
                    result?;
                    return Ok(true);
                }
            }
        }
    }

    /// Generates and publishes one dish.
    pub async fn cycle(&mut self) -> Result<PostReceipt, SchedulerError> {
        let dish = self
            .generator
            .generate_within(self.max_post_length, &mut self.rng)?;
        debug!("Generated dish: \"{}\"", truncate(&dish, 60));

        let receipt = self.retry.publish(&self.publisher, &dish).await?;
        self.state.record_post(&receipt);

        info!(
            "Dish #{} posted (id: {}), next in {:?}",
            self.state.posts, receipt.id, self.period
        );
        Ok(receipt)
    }

    /// Gets a reference to the scheduler state.
    #[must_use]
    pub const fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Gets a reference to the publisher.
    #[must_use]
    pub const fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<P> std::fmt::Debug for DishScheduler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DishScheduler")
            .field("period", &self.period)
            .field("max_post_length", &self.max_post_length)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
