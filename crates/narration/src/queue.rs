use crate::{AudioPlayer, CommentJob, JobId, NarrationConfig, NarrationEvent, NarrationNotifier, SpeechSynthesizer};
use futures::FutureExt;
use std::{
	collections::VecDeque,
	panic::AssertUnwindSafe,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex, MutexGuard, PoisonError,
	},
};
use tracing::{error, info, instrument, warn};

/// FIFO of comments waiting to be read aloud, with at most one narration
/// on air at any time.
///
/// [`enqueue`](Self::enqueue) never waits for audio. The first job to arrive
/// while idle starts a background drain task; that task keeps taking the
/// head of the queue until it is empty, pausing `inter_comment_delay`
/// between two narrations.
#[derive(Clone)]
pub struct NarrationQueue {
	inner: Arc<Inner>,
}

struct Inner {
	jobs: Mutex<VecDeque<CommentJob>>,
	draining: AtomicBool,
	on_air: Mutex<Option<JobId>>,
	synthesizer: Arc<dyn SpeechSynthesizer>,
	player: AudioPlayer,
	notifier: Arc<dyn NarrationNotifier>,
	config: NarrationConfig,
}

impl NarrationQueue {
	pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: AudioPlayer, notifier: Arc<dyn NarrationNotifier>, config: NarrationConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				jobs: Mutex::new(VecDeque::new()),
				draining: AtomicBool::new(false),
				on_air: Mutex::new(None),
				synthesizer,
				player,
				notifier,
				config,
			}),
		}
	}

	/// Append a job and make sure a drain is running.
	///
	/// Must be called from within a tokio runtime. Returns the number of jobs
	/// waiting (not counting the one on air).
	pub fn enqueue(&self, job: CommentJob) -> usize {
		let waiting = {
			let mut jobs = self.inner.jobs();
			jobs.push_back(job);
			jobs.len()
		};

		self.inner.advance();
		waiting
	}

	/// Jobs waiting, excluding the one on air.
	pub fn len(&self) -> usize {
		self.inner.jobs().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.jobs().is_empty()
	}

	/// Whether a narration is on air right now.
	pub fn is_busy(&self) -> bool {
		self.inner.on_air().is_some()
	}

	/// Whether a drain task is alive, including the pause between narrations.
	pub fn is_draining(&self) -> bool {
		self.inner.draining.load(Ordering::SeqCst)
	}

	pub fn current(&self) -> Option<JobId> {
		*self.inner.on_air()
	}
}

impl std::fmt::Debug for NarrationQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NarrationQueue")
			.field("waiting", &self.len())
			.field("on_air", &self.current())
			.field("player", &self.inner.player)
			.field("config", &self.inner.config)
			.finish_non_exhaustive()
	}
}

impl Inner {
	fn jobs(&self) -> MutexGuard<'_, VecDeque<CommentJob>> {
		self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn on_air(&self) -> MutexGuard<'_, Option<JobId>> {
		self.on_air.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn try_begin_drain(&self) -> bool {
		self.draining.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
	}

	fn advance(self: &Arc<Self>) {
		if self.try_begin_drain() {
			tokio::spawn(Arc::clone(self).drain());
		}
	}

	async fn drain(self: Arc<Self>) {
		let _guard = DrainGuard(&self);

		loop {
			let next = self.jobs().pop_front();
			let Some(job) = next else {
				self.draining.store(false, Ordering::SeqCst);
				// A job pushed between the pop and the store saw the flag still set
				if !self.jobs().is_empty() && self.try_begin_drain() {
					continue;
				}
				return;
			};

			let id = job.id;
			if AssertUnwindSafe(self.narrate(job)).catch_unwind().await.is_err() {
				error!(comment_id = %id, "💥 Narration panicked, dropping comment");
				self.notifier.notify(NarrationEvent::ReadingFinished { id });
				*self.on_air() = None;
			}

			let waiting = self.jobs().len();
			self.notifier.notify(NarrationEvent::QueueDepth { count: waiting });

			if waiting > 0 {
				tokio::time::sleep(self.config.inter_comment_delay).await;
			}
		}
	}

	#[instrument(skip_all, fields(id = %job.id))]
	async fn narrate(&self, job: CommentJob) {
		*self.on_air() = Some(job.id);
		self.notifier.notify(NarrationEvent::ReadingStarted { id: job.id });
		info!("🔊 Reading comment ({} in queue): {}", self.jobs().len(), job.text);

		match self.synthesizer.synthesize(&job.text).await {
			Some(artifact) => {
				let artifact = artifact.with_cleanup(self.config.cleanup);
				self.player.play(&artifact).await;
			}
			None => warn!("⚠️ No audio for comment, skipping playback"),
		}

		self.notifier.notify(NarrationEvent::ReadingFinished { id: job.id });
		*self.on_air() = None;
	}
}

/// Releases the drain flag if the drain task itself unwinds (a panicking
/// notifier), so later jobs can still start a new drain.
struct DrainGuard<'a>(&'a Inner);

impl Drop for DrainGuard<'_> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			*self.0.on_air() = None;
			self.0.draining.store(false, Ordering::SeqCst);
		}
	}
}
