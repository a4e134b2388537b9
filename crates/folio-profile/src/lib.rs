//! Profile data for the folio assistant.
//!
//! The profile lives behind a remote HTTP endpoint. Every fetch goes back to
//! the network; nothing is cached between turns.

pub mod error;
pub mod fetcher;
pub mod retry;
pub mod tool;
pub mod transport;
pub mod types;

pub use error::{AttemptError, FetchError};
pub use fetcher::{FetcherConfig, ProfileFetcher, ProfileSource};
pub use retry::{Exhausted, RetryPolicy};
pub use tool::{ProfileTool, FETCH_PROFILE_TOOL};
pub use transport::{HttpTransport, ProfileTransport};
pub use types::{Contact, Profile, Project, Section};
