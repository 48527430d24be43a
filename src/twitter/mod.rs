//! Posting API module.
//!
//! Provides the OAuth 1.0a signed client for the posting API, a dry-run
//! publisher, and the retry policy applied around publishing.

mod backoff;
mod client;
mod oauth;

pub use backoff::{MAX_BACKOFF, RetryPolicy};
pub use client::{DryRunPublisher, PostReceipt, PublishError, Publisher, TwitterClient};
pub(crate) use client::truncate;
pub use oauth::{OAuthSigner, signature_base_string};
