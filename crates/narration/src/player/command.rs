use super::PlaybackBackend;
use crate::PlaybackError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;
use std::{
	ffi::OsString,
	io::ErrorKind,
	path::{Path, PathBuf},
	process::Stdio,
};
use tokio::process::Command;
use tracing::debug;

/// Argument token replaced with the audio file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Command-line players tried in order by [`GenericCommandBackend`].
pub const GENERIC_PLAYERS: &[(&str, &[&str])] = &[
	("mpg123", &["-q", FILE_PLACEHOLDER]),
	("mpg321", &["-q", FILE_PLACEHOLDER]),
	("mplayer", &["-really-quiet", FILE_PLACEHOLDER]),
	("mpv", &["--no-video", "--really-quiet", FILE_PLACEHOLDER]),
	("cvlc", &["--play-and-exit", "--quiet", FILE_PLACEHOLDER]),
	("play", &["-q", FILE_PLACEHOLDER]),
];

/// Runs an external program and waits for it to exit.
#[derive(Debug, Clone)]
pub struct CommandBackend {
	name: String,
	program: PathBuf,
	args: Vec<String>,
}

impl CommandBackend {
	pub fn new<I, S>(name: impl Into<String>, program: impl Into<PathBuf>, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			name: name.into(),
			program: program.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	fn command_args(&self, path: &Path) -> Vec<OsString> {
		self.args
			.iter()
			.map(|arg| if arg == FILE_PLACEHOLDER { path.as_os_str().to_os_string() } else { OsString::from(arg) })
			.collect()
	}
}

#[async_trait]
impl PlaybackBackend for CommandBackend {
	fn name(&self) -> &str {
		&self.name
	}

	async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
		run_to_completion(&self.program, self.command_args(path)).await
	}
}

async fn run_to_completion(program: &Path, args: Vec<OsString>) -> Result<(), PlaybackError> {
	let program_name = program.display().to_string();
	debug!(program = %program_name, "Launching playback process");

	// kill_on_drop so a timed-out playback does not keep the device busy
	let output = Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.kill_on_drop(true)
		.output()
		.await
		.map_err(|source| PlaybackError::Spawn {
			program: program_name.clone(),
			source,
		})?;

	if output.status.success() {
		Ok(())
	} else {
		Err(PlaybackError::ExitStatus {
			program: program_name,
			status: output.status,
		})
	}
}

/// Tries each known command-line player until one is installed.
#[derive(Debug, Clone)]
pub struct GenericCommandBackend {
	candidates: Vec<CommandBackend>,
}

impl GenericCommandBackend {
	pub const fn new(candidates: Vec<CommandBackend>) -> Self {
		Self { candidates }
	}
}

impl Default for GenericCommandBackend {
	fn default() -> Self {
		Self::new(
			GENERIC_PLAYERS
				.iter()
				.map(|(program, args)| CommandBackend::new(*program, *program, args.iter().copied()))
				.collect(),
		)
	}
}

#[async_trait]
impl PlaybackBackend for GenericCommandBackend {
	fn name(&self) -> &str {
		"command-line player"
	}

	async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
		for candidate in &self.candidates {
			match candidate.play(path).await {
				Err(PlaybackError::Spawn { ref source, .. }) if source.kind() == ErrorKind::NotFound => {
					debug!(program = %candidate.name(), "Player not installed, trying next");
				}
				result => return result,
			}
		}

		let tried: Vec<&str> = self.candidates.iter().map(|c| c.name.as_str()).collect();
		Err(PlaybackError::NoPlayerAvailable(tried.join(", ")))
	}
}

/// Windows `System.Windows.Media.MediaPlayer` driven through PowerShell.
///
/// The script blocks until the media reports its natural end, so the process
/// exit marks the end of playback.
#[derive(Debug, Clone)]
pub struct PowerShellMediaPlayer {
	program: PathBuf,
}

impl PowerShellMediaPlayer {
	pub fn new() -> Self {
		Self {
			program: PathBuf::from("powershell"),
		}
	}

	/// Build the playback script for a `file://` URI.
	pub fn script(file_uri: &str) -> String {
		let uri = file_uri.replace('\'', "''");
		format!(
			r"
Add-Type -AssemblyName presentationcore
$player = New-Object System.Windows.Media.MediaPlayer
$sync = New-Object System.Threading.ManualResetEvent($false)
$player.add_MediaEnded({{ $sync.Set() | Out-Null }})
$player.add_MediaFailed({{ $sync.Set() | Out-Null }})
$player.Open([Uri]::new('{uri}'))
$player.Volume = 1
$player.Play()
while (-not $player.NaturalDuration.HasTimeSpan) {{ Start-Sleep -Milliseconds 100 }}
while ($player.Position -lt $player.NaturalDuration.TimeSpan) {{ Start-Sleep -Milliseconds 200 }}
$player.Stop()
$sync.Set() | Out-Null
$sync.WaitOne() | Out-Null
$player.Close()
"
		)
	}

	/// `-EncodedCommand` expects base64 over UTF-16LE.
	pub fn encode_script(script: &str) -> String {
		let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
		STANDARD.encode(bytes)
	}
}

impl Default for PowerShellMediaPlayer {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl PlaybackBackend for PowerShellMediaPlayer {
	fn name(&self) -> &str {
		"MediaPlayer"
	}

	async fn play(&self, path: &Path) -> Result<(), PlaybackError> {
		let absolute = tokio::fs::canonicalize(path).await.map_err(|source| PlaybackError::Spawn {
			program: self.program.display().to_string(),
			source,
		})?;
		let uri = Url::from_file_path(&absolute).map_err(|()| PlaybackError::InvalidPath(absolute.display().to_string()))?;

		let encoded = Self::encode_script(&Self::script(uri.as_str()));
		let args = ["-NoProfile", "-WindowStyle", "Hidden", "-STA", "-EncodedCommand", encoded.as_str()]
			.into_iter()
			.map(OsString::from)
			.collect();

		run_to_completion(&self.program, args).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_placeholder_is_substituted() {
		let backend = CommandBackend::new("ffplay", "ffplay", ["-nodisp", FILE_PLACEHOLDER]);
		let args = backend.command_args(Path::new("/tmp/a b.mp3"));

		assert_eq!(args, vec![OsString::from("-nodisp"), OsString::from("/tmp/a b.mp3")]);
	}

	#[test]
	fn test_script_escapes_single_quotes() {
		let script = PowerShellMediaPlayer::script("file:///C:/it's/a.mp3");
		assert!(script.contains("[Uri]::new('file:///C:/it''s/a.mp3')"));
		assert!(script.contains("$player.add_MediaEnded({ $sync.Set() | Out-Null })"));
	}

	#[test]
	fn test_script_is_utf16le_base64() {
		assert_eq!(PowerShellMediaPlayer::encode_script("ab"), "YQBiAA==");
	}

	#[tokio::test]
	async fn test_missing_program_is_spawn_error() {
		let backend = CommandBackend::new("ghost", "definitely-not-an-installed-player", [FILE_PLACEHOLDER]);

		let err = backend.play(Path::new("a.mp3")).await.unwrap_err();
		assert!(matches!(err, PlaybackError::Spawn { ref source, .. } if source.kind() == ErrorKind::NotFound));
	}

	#[tokio::test]
	async fn test_generic_backend_reports_no_player() {
		let backend = GenericCommandBackend::new(vec![
			CommandBackend::new("ghost-a", "ghost-player-a", [FILE_PLACEHOLDER]),
			CommandBackend::new("ghost-b", "ghost-player-b", [FILE_PLACEHOLDER]),
		]);

		match backend.play(Path::new("a.mp3")).await {
			Err(PlaybackError::NoPlayerAvailable(tried)) => assert_eq!(tried, "ghost-a, ghost-b"),
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_exit_status_is_reported() {
		assert!(CommandBackend::new("true", "true", Vec::<String>::new()).play(Path::new("a.mp3")).await.is_ok());

		let err = CommandBackend::new("false", "false", Vec::<String>::new()).play(Path::new("a.mp3")).await.unwrap_err();
		assert!(matches!(err, PlaybackError::ExitStatus { .. }));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_generic_backend_skips_missing_programs() {
		let backend = GenericCommandBackend::new(vec![
			CommandBackend::new("ghost", "ghost-player", [FILE_PLACEHOLDER]),
			CommandBackend::new("true", "true", [FILE_PLACEHOLDER]),
		]);

		assert!(backend.play(Path::new("a.mp3")).await.is_ok());
	}
}
