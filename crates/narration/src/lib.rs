//! # Narration
//!
//! Sequential comment narration: live comments are appended to a FIFO
//! [`NarrationQueue`] and read aloud one at a time.
//!
//! Each job runs through three stages:
//!
//! 1. [`SpeechSynthesizer`] turns the comment text into an [`AudioArtifact`]
//!    (a transient audio file).
//! 2. [`AudioPlayer`] plays the artifact, trying a primary
//!    [`PlaybackBackend`] and falling back to a bounded secondary one.
//! 3. The artifact is released, which deletes the file according to its
//!    [`CleanupPolicy`].
//!
//! Progress is reported through a [`NarrationNotifier`] so that dashboards can
//! show which comment is currently on air.
//!
//! ```rust,ignore
//! let queue = NarrationQueue::new(synth, AudioPlayer::platform_default(), notifier, NarrationConfig::default());
//! queue.enqueue(job);
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod events;
pub mod job;
pub mod player;
pub mod queue;
pub mod synth;

pub use artifact::{ArtifactNamer, AudioArtifact};
pub use config::{CleanupPolicy, NarrationConfig};
pub use error::{PlaybackError, SynthesisError};
pub use events::{NarrationEvent, NarrationNotifier};
pub use job::{CommentJob, JobId, JobIdGenerator, ParseJobIdError};
pub use player::{AudioPlayer, CommandBackend, GenericCommandBackend, PlaybackBackend, PlaybackOutcome, PowerShellMediaPlayer};
pub use queue::NarrationQueue;
pub use synth::{GoogleTts, GoogleTtsConfig, SpeechSynthesizer};
