use async_trait::async_trait;
use narration::{
	AudioArtifact, AudioPlayer, CleanupPolicy, CommentJob, JobId, NarrationConfig, NarrationEvent, NarrationQueue, PlaybackBackend, PlaybackError, SpeechSynthesizer,
};
use std::{
	path::{Path, PathBuf},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};
use tempfile::TempDir;
use tokio::{
	sync::mpsc::{unbounded_channel, UnboundedReceiver},
	time::Instant,
};

/// Writes one small file per request into a temp dir.
struct FileSynth {
	dir: PathBuf,
	count: AtomicUsize,
}

impl FileSynth {
	fn new(dir: &Path) -> Arc<Self> {
		Arc::new(Self {
			dir: dir.to_path_buf(),
			count: AtomicUsize::new(0),
		})
	}
}

#[async_trait]
impl SpeechSynthesizer for FileSynth {
	async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
		let n = self.count.fetch_add(1, Ordering::SeqCst);
		let path = self.dir.join(format!("{n}.mp3"));
		std::fs::write(&path, text).ok()?;
		Some(AudioArtifact::new(path))
	}
}

struct FailingSynth;

fn file_synth(dir: &Path) -> Arc<dyn SpeechSynthesizer> {
	FileSynth::new(dir)
}

fn failing_synth(_dir: &Path) -> Arc<dyn SpeechSynthesizer> {
	Arc::new(FailingSynth)
}

#[async_trait]
impl SpeechSynthesizer for FailingSynth {
	async fn synthesize(&self, _text: &str) -> Option<AudioArtifact> {
		None
	}
}

/// Panics on the comment text `boom`, synthesizes every other one.
struct PanickingSynth {
	files: Arc<FileSynth>,
}

fn panicking_synth(dir: &Path) -> Arc<dyn SpeechSynthesizer> {
	Arc::new(PanickingSynth { files: FileSynth::new(dir) })
}

#[async_trait]
impl SpeechSynthesizer for PanickingSynth {
	async fn synthesize(&self, text: &str) -> Option<AudioArtifact> {
		assert_ne!(text, "boom", "synthesizer blew up");
		self.files.synthesize(text).await
	}
}

/// Records what it played, how many plays overlapped, and whether the file existed.
#[derive(Default)]
struct RecordingBackend {
	duration: Duration,
	active: AtomicUsize,
	max_active: AtomicUsize,
	played: Mutex<Vec<String>>,
	missing_files: AtomicUsize,
}

impl RecordingBackend {
	fn with_duration(duration: Duration) -> Arc<Self> {
		Arc::new(Self { duration, ..Self::default() })
	}

	fn played(&self) -> Vec<String> {
		self.played.lock().unwrap().clone()
	}
}

#[async_trait]
impl PlaybackBackend for RecordingBackend {
	fn name(&self) -> &str {
		"recording"
	}

	async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
		let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_active.fetch_max(now, Ordering::SeqCst);

		match std::fs::read_to_string(path) {
			Ok(text) => self.played.lock().unwrap().push(text),
			Err(_) => {
				self.missing_files.fetch_add(1, Ordering::SeqCst);
			}
		}

		tokio::time::sleep(self.duration).await;
		self.active.fetch_sub(1, Ordering::SeqCst);
		Ok(())
	}
}

struct BrokenBackend;

#[async_trait]
impl PlaybackBackend for BrokenBackend {
	fn name(&self) -> &str {
		"broken"
	}

	async fn play(&self, _path: &Path) -> Result<(), PlaybackError> {
		Err(PlaybackError::NoPlayerAvailable("broken".to_string()))
	}
}

struct HangingBackend;

#[async_trait]
impl PlaybackBackend for HangingBackend {
	fn name(&self) -> &str {
		"hanging"
	}

	async fn play(&self, _path: &Path) -> Result<(), PlaybackError> {
		std::future::pending().await
	}
}

struct Harness {
	queue: NarrationQueue,
	events: UnboundedReceiver<NarrationEvent>,
	_dir: TempDir,
}

fn harness(synth: impl FnOnce(&Path) -> Arc<dyn SpeechSynthesizer>, player: AudioPlayer) -> Harness {
	let dir = tempfile::tempdir().unwrap();
	let (tx, events) = unbounded_channel();
	let config = NarrationConfig {
		cleanup: CleanupPolicy::Immediate,
		..NarrationConfig::default()
	};
	let queue = NarrationQueue::new(synth(dir.path()), player, Arc::new(tx), config);

	Harness { queue, events, _dir: dir }
}

fn job(seq: u64, text: &str) -> CommentJob {
	CommentJob::new(JobId::new(1_700_000_000_000, seq), "viewer", "Viewer", text, "")
}

async fn next_events(events: &mut UnboundedReceiver<NarrationEvent>, n: usize) -> Vec<NarrationEvent> {
	let mut out = Vec::with_capacity(n);
	for _ in 0..n {
		out.push(events.recv().await.expect("event stream closed"));
	}
	out
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_three_jobs_produce_exact_notification_sequence() {
	let backend = RecordingBackend::with_duration(Duration::ZERO);
	let mut h = harness(file_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	let (a, b, c) = (job(1, "A"), job(2, "B"), job(3, "C"));
	h.queue.enqueue(a.clone());
	h.queue.enqueue(b.clone());
	h.queue.enqueue(c.clone());

	let events = next_events(&mut h.events, 9).await;
	assert_eq!(
		events,
		vec![
			NarrationEvent::ReadingStarted { id: a.id },
			NarrationEvent::ReadingFinished { id: a.id },
			NarrationEvent::QueueDepth { count: 2 },
			NarrationEvent::ReadingStarted { id: b.id },
			NarrationEvent::ReadingFinished { id: b.id },
			NarrationEvent::QueueDepth { count: 1 },
			NarrationEvent::ReadingStarted { id: c.id },
			NarrationEvent::ReadingFinished { id: c.id },
			NarrationEvent::QueueDepth { count: 0 },
		]
	);
	assert_eq!(backend.played(), vec!["A", "B", "C"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_burst_is_played_in_fifo_order_one_at_a_time() {
	let backend = RecordingBackend::with_duration(Duration::from_millis(300));
	let mut h = harness(file_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	let texts: Vec<String> = (0..12).map(|i| format!("comment {i}")).collect();
	for (i, text) in texts.iter().enumerate() {
		h.queue.enqueue(job(i as u64, text));
		tokio::task::yield_now().await;
	}

	let events = next_events(&mut h.events, texts.len() * 3).await;
	let started: Vec<u64> = events
		.iter()
		.filter_map(|e| match e {
			NarrationEvent::ReadingStarted { id } => Some(id.seq()),
			_ => None,
		})
		.collect();

	assert_eq!(started, (0..12).collect::<Vec<u64>>());
	assert_eq!(backend.played(), texts);
	assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
	assert_eq!(events.last(), Some(&NarrationEvent::QueueDepth { count: 0 }));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_busy_state_tracks_the_job_on_air() {
	let backend = RecordingBackend::with_duration(Duration::from_secs(1));
	let mut h = harness(file_synth, AudioPlayer::new(backend, Arc::new(BrokenBackend)));

	let first = job(1, "first");
	h.queue.enqueue(first.clone());
	h.queue.enqueue(job(2, "second"));

	assert_eq!(h.events.recv().await, Some(NarrationEvent::ReadingStarted { id: first.id }));
	assert!(h.queue.is_busy());
	assert_eq!(h.queue.current(), Some(first.id));
	assert_eq!(h.queue.len(), 1);

	next_events(&mut h.events, 5).await;
	assert!(!h.queue.is_busy());
	assert!(h.queue.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_synthesis_failure_still_finishes_and_continues() {
	let backend = RecordingBackend::with_duration(Duration::ZERO);
	let mut h = harness(failing_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	let (a, b) = (job(1, "a"), job(2, "b"));
	h.queue.enqueue(a.clone());
	h.queue.enqueue(b.clone());

	let events = next_events(&mut h.events, 6).await;
	assert_eq!(events[0], NarrationEvent::ReadingStarted { id: a.id });
	assert_eq!(events[1], NarrationEvent::ReadingFinished { id: a.id });
	assert_eq!(events[3], NarrationEvent::ReadingStarted { id: b.id });
	assert_eq!(events[4], NarrationEvent::ReadingFinished { id: b.id });
	assert!(backend.played().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_hanging_fallback_finishes_within_bound() {
	let player = AudioPlayer::new(Arc::new(BrokenBackend), Arc::new(HangingBackend)).with_timeouts(Duration::from_secs(120), Duration::from_secs(30));
	let mut h = harness(file_synth, player);

	let stuck = job(1, "stuck");
	let started = Instant::now();
	h.queue.enqueue(stuck.clone());

	let events = next_events(&mut h.events, 3).await;
	assert_eq!(events[1], NarrationEvent::ReadingFinished { id: stuck.id });
	assert!(started.elapsed() <= Duration::from_secs(31));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_artifact_exists_during_playback_and_is_removed_after() {
	let backend = RecordingBackend::with_duration(Duration::from_millis(50));
	let mut h = harness(file_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	h.queue.enqueue(job(1, "temp"));
	next_events(&mut h.events, 3).await;

	assert_eq!(backend.missing_files.load(Ordering::SeqCst), 0);
	assert_eq!(backend.played(), vec!["temp"]);
	assert_eq!(std::fs::read_dir(h._dir.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_drain_restarts_after_idle() {
	let backend = RecordingBackend::with_duration(Duration::from_millis(10));
	let mut h = harness(file_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	h.queue.enqueue(job(1, "early"));
	next_events(&mut h.events, 3).await;

	tokio::time::sleep(Duration::from_secs(5)).await;
	assert!(!h.queue.is_draining());

	let late = job(2, "late");
	h.queue.enqueue(late.clone());
	let events = next_events(&mut h.events, 3).await;

	assert_eq!(events[0], NarrationEvent::ReadingStarted { id: late.id });
	assert_eq!(backend.played(), vec!["early", "late"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_never_overlap_playback() {
	let backend = RecordingBackend::with_duration(Duration::from_millis(2));
	let mut h = harness(file_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));
	let producers: Vec<_> = (0..4_u64)
		.map(|p| {
			let queue = h.queue.clone();
			tokio::spawn(async move {
				for i in 0..5_u64 {
					queue.enqueue(job(p * 100 + i, &format!("{p}-{i}")));
					tokio::task::yield_now().await;
				}
			})
		})
		.collect();
	for producer in producers {
		producer.await.unwrap();
	}

	let mut finished = 0;
	while finished < 20 {
		if let Some(NarrationEvent::ReadingFinished { .. }) = tokio::time::timeout(Duration::from_secs(10), h.events.recv()).await.unwrap() {
			finished += 1;
		}
	}

	assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
	assert_eq!(backend.played().len(), 20);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_inter_comment_pause_only_between_jobs() {
	let backend = RecordingBackend::with_duration(Duration::ZERO);
	let mut h = harness(file_synth, AudioPlayer::new(backend, Arc::new(BrokenBackend)));
	let delay = NarrationConfig::default().inter_comment_delay;

	let (a, b) = (job(1, "A"), job(2, "B"));
	h.queue.enqueue(a.clone());
	h.queue.enqueue(b.clone());

	let mut stamps = Vec::new();
	for _ in 0..6 {
		let event = h.events.recv().await.expect("event stream closed");
		stamps.push((event, Instant::now()));
	}

	assert_eq!(stamps[1].0, NarrationEvent::ReadingFinished { id: a.id });
	assert_eq!(stamps[3].0, NarrationEvent::ReadingStarted { id: b.id });
	let gap = stamps[3].1 - stamps[1].1;
	assert!(gap >= delay, "gap {gap:?} shorter than {delay:?}");
	assert!(gap < delay + Duration::from_millis(50));

	assert_eq!(stamps[5].0, NarrationEvent::QueueDepth { count: 0 });
	let last = stamps[5].1;
	while h.queue.is_draining() {
		tokio::task::yield_now().await;
	}
	assert_eq!(Instant::now(), last);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_panicking_synthesizer_does_not_wedge_the_queue() {
	let backend = RecordingBackend::with_duration(Duration::ZERO);
	let mut h = harness(panicking_synth, AudioPlayer::new(backend.clone(), Arc::new(BrokenBackend)));

	let (bad, good) = (job(1, "boom"), job(2, "fine"));
	h.queue.enqueue(bad.clone());
	h.queue.enqueue(good.clone());

	let events = next_events(&mut h.events, 6).await;
	assert_eq!(
		events,
		vec![
			NarrationEvent::ReadingStarted { id: bad.id },
			NarrationEvent::ReadingFinished { id: bad.id },
			NarrationEvent::QueueDepth { count: 1 },
			NarrationEvent::ReadingStarted { id: good.id },
			NarrationEvent::ReadingFinished { id: good.id },
			NarrationEvent::QueueDepth { count: 0 },
		]
	);
	assert_eq!(backend.played(), vec!["fine"]);
	assert!(!h.queue.is_busy());
	assert_eq!(h.queue.current(), None);
}
