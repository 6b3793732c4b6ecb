use std::{path::PathBuf, process, sync::Arc, time::Duration};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use env_logger::Env;
use framepick::{
    DecodedFrame, DisplaySurface, ExtractOptions, ExtractionSession, FfmpegLogLevel, FfmpegOpener,
    FrameError, FrameGate, PlaybackStop, PreviewOptions, ProgressCallback, ProgressInfo,
    StopReason, SurfaceEvent, format_milliseconds, parse_time, probe_media,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framepick info input.mp4 --json\n  framepick extract input.mp4 --start 0:1:53 --end 0:2:23 --count 10 --out frames --progress\n  framepick preview input.mp4 --until 0:0:30\n  framepick completions zsh > _framepick";

const BAR_TEMPLATE: &str = "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}";

#[derive(Debug, Parser)]
#[command(
    name = "framepick",
    version,
    about = "Extract evenly-spaced still frames from a video time window",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the duration and stream details of a video.
    #[command(
        visible_alias = "probe",
        after_help = "Examples:\n  framepick info input.mp4\n  framepick info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract up to N evenly-spaced frames between two times.
    #[command(
        after_help = "Frames are written as frame_0.jpg, frame_1.jpg, ... At most one frame per\nwhole second of the window is extracted.\n\nExamples:\n  framepick extract input.mp4 --start 0:0:10 --end 0:0:40 --count 10 --out frames"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Start time (hh:mm:ss).
        #[arg(long, default_value = "0:1:53")]
        start: String,
        /// End time (hh:mm:ss).
        #[arg(long, default_value = "0:2:23")]
        end: String,
        /// Existing output folder.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Number of frames to extract.
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        /// Frame gate: next-due, or modulo for the exact-timestamp behaviour.
        #[arg(long, default_value = "next-due")]
        gate: FrameGate,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = framepick::DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },

    /// Play a video in the terminal as a position bar.
    #[command(after_help = "Press q or Esc to stop, Ctrl-C to close.\n\nExamples:\n  framepick preview input.mp4\n  framepick preview input.mp4 --until 0:0:30 --poll-ms 0")]
    Preview {
        /// Input video path.
        input: PathBuf,
        /// Quit once playback reaches this time (hh:mm:ss).
        #[arg(long)]
        until: Option<String>,
        /// Delay between frames in milliseconds.
        #[arg(long, default_value_t = 25)]
        poll_ms: u64,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn progress_bar(length: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let bar = ProgressBar::new(length);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)?;
    bar.set_style(style.progress_chars("##-"));
    Ok(bar)
}

/// Mirrors extraction progress onto an `indicatif` bar.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(position_ms) = info.position_ms {
            self.bar.set_message(format_milliseconds(position_ms));
        }
    }
}

/// Shows playback position on a bar. Quits on `q`/Esc or at an optional
/// time, and reports Ctrl-C as a closed surface.
struct TerminalSurface {
    bar: ProgressBar,
    until_ms: Option<u64>,
    raw_mode: bool,
}

impl TerminalSurface {
    fn new(bar: ProgressBar, until_ms: Option<u64>) -> Self {
        // Ctrl-C arrives as a key event only in raw mode.
        let raw_mode = match terminal::enable_raw_mode() {
            Ok(()) => true,
            Err(error) => {
                log::debug!("Keyboard controls unavailable: {error}");
                false
            }
        };
        Self {
            bar,
            until_ms,
            raw_mode,
        }
    }

    fn poll_keys(&self) -> Result<Option<SurfaceEvent>, FrameError> {
        if !self.raw_mode {
            return Ok(None);
        }
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(surface_event) = key_to_event(&key) {
                    return Ok(Some(surface_event));
                }
            }
        }
        Ok(None)
    }
}

fn key_to_event(key: &KeyEvent) -> Option<SurfaceEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(SurfaceEvent::Closed)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(SurfaceEvent::Quit),
        _ => None,
    }
}

impl DisplaySurface for TerminalSurface {
    fn present(&mut self, frame: &DecodedFrame) -> Result<SurfaceEvent, FrameError> {
        self.bar.set_position(frame.position_ms);
        self.bar.set_message(format!(
            "{} {}x{}  (q to quit)",
            format_milliseconds(frame.position_ms),
            frame.image.width(),
            frame.image.height(),
        ));

        if let Some(surface_event) = self.poll_keys()? {
            return Ok(surface_event);
        }

        match self.until_ms {
            Some(until_ms) if frame.position_ms >= until_ms => Ok(SurfaceEvent::Quit),
            _ => Ok(SurfaceEvent::Continue),
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
        if self.raw_mode {
            if let Err(error) = terminal::disable_raw_mode() {
                log::warn!("Failed to restore terminal mode: {error}");
            }
        }
    }
}

fn init_logging(global: &GlobalOptions) {
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Some(level) = global.log_level {
        framepick::set_ffmpeg_log_level(level);
    }
}

fn describe_stop(reason: &StopReason) -> Option<String> {
    match reason {
        StopReason::CountReached | StopReason::RangeEnd => None,
        StopReason::EndOfStream => Some("video ended before the window was covered".to_string()),
        StopReason::DecodeFailure(message) => Some(format!("decoding stopped early: {message}")),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Info { input, json } => {
            let summary = probe_media(&input)?;
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "duration": format_milliseconds(summary.duration_ms),
                    "duration_ms": summary.duration_ms,
                    "fps": summary.frames_per_second,
                    "frame_count": summary.frame_count,
                    "width": summary.width,
                    "height": summary.height,
                    "codec": summary.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Video Duration: {}", format_milliseconds(summary.duration_ms));
                println!(
                    "Video: {}x{} @ {:.2} fps, {} frames [{}]",
                    summary.width,
                    summary.height,
                    summary.frames_per_second,
                    summary.frame_count,
                    summary.codec,
                );
            }
        }
        Commands::Extract {
            input,
            start,
            end,
            out,
            count,
            gate,
            quality,
        } => {
            let session = ExtractionSession::from_input(&input, &start, &end, &out, count)?;
            let mut options = ExtractOptions::new()
                .with_gate(gate)
                .with_jpeg_quality(quality);

            let bar = if cli.global.progress {
                let bar = progress_bar(count)?;
                options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
                Some(bar)
            } else {
                None
            };

            let result = session.run(&FfmpegOpener, &options);
            if let Some(bar) = bar {
                bar.finish_with_message("Extraction Complete");
            }
            let result = result?;

            if let Some(note) = describe_stop(&result.stop_reason) {
                eprintln!("{} {}", "warning:".yellow().bold(), note.yellow());
            }
            if result.frames_written == 0 {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    "no decoded frame matched the sampling interval".yellow()
                );
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Frames extracted successfully! Total frames: {} ({} ms apart) in {}",
                    result.frames_written,
                    result.frame_interval_ms,
                    out.display()
                )
                .green()
            );
        }
        Commands::Preview {
            input,
            until,
            poll_ms,
        } => {
            let until_ms = until.as_deref().map(parse_time).transpose()?;
            let summary = probe_media(&input)?;

            let bar = progress_bar(summary.duration_ms)?;
            bar.set_style(ProgressStyle::with_template(
                "{spinner:.green} {bar:40.cyan/blue} {msg}",
            )?);
            let surface = TerminalSurface::new(bar, until_ms);

            let options = PreviewOptions::new().with_poll_interval(Duration::from_millis(poll_ms));
            let playback = framepick::play(&FfmpegOpener, &input, surface, &options)?;

            let stopped = match &playback.stop {
                PlaybackStop::EndOfStream => "end of video".to_string(),
                PlaybackStop::Quit => "quit".to_string(),
                PlaybackStop::Closed => "closed".to_string(),
                PlaybackStop::Cancelled => "cancelled".to_string(),
                PlaybackStop::DecodeFailure(message) => format!("decode failure: {message}"),
            };
            println!(
                "{} {} frame(s) shown, stopped at {} ({stopped})",
                "preview".cyan().bold(),
                playback.frames_shown,
                format_milliseconds(playback.last_position_ms.unwrap_or(0)),
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framepick", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
    use framepick::{FfmpegLogLevel, FrameGate, StopReason, SurfaceEvent};

    use super::{Cli, Commands, describe_stop, key_to_event};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn extract_defaults_match_form_defaults() {
        let cli = Cli::try_parse_from(["framepick", "extract", "video.mp4"]).unwrap();
        match cli.command {
            Commands::Extract {
                start,
                end,
                out,
                count,
                gate,
                quality,
                ..
            } => {
                assert_eq!(start, "0:1:53");
                assert_eq!(end, "0:2:23");
                assert_eq!(out.to_str(), Some("."));
                assert_eq!(count, 10);
                assert_eq!(gate, FrameGate::NextDue);
                assert_eq!(quality, 95);
            }
            other => panic!("Expected Extract, got: {other:?}"),
        }
    }

    #[test]
    fn extract_rejects_zero_count() {
        let result = Cli::try_parse_from(["framepick", "extract", "video.mp4", "--count", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn gate_and_log_level_parse() {
        let cli = Cli::try_parse_from([
            "framepick",
            "extract",
            "video.mp4",
            "--gate",
            "modulo",
            "--log-level",
            "quiet",
        ])
        .unwrap();
        assert_eq!(cli.global.log_level, Some(FfmpegLogLevel::Quiet));
        match cli.command {
            Commands::Extract { gate, .. } => assert_eq!(gate, FrameGate::Modulo),
            other => panic!("Expected Extract, got: {other:?}"),
        }

        assert!(Cli::try_parse_from(["framepick", "extract", "v.mp4", "--gate", "nearest"]).is_err());
    }

    #[test]
    fn stop_reasons_worth_a_warning() {
        assert!(describe_stop(&StopReason::CountReached).is_none());
        assert!(describe_stop(&StopReason::RangeEnd).is_none());
        assert!(describe_stop(&StopReason::EndOfStream).is_some());
        let note = describe_stop(&StopReason::DecodeFailure("bad packet".to_string())).unwrap();
        assert!(note.contains("bad packet"));
    }

    #[test]
    fn preview_keys_map_to_surface_events() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(
            key_to_event(&press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(SurfaceEvent::Quit)
        );
        assert_eq!(
            key_to_event(&press(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(SurfaceEvent::Quit)
        );
        assert_eq!(
            key_to_event(&press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(SurfaceEvent::Quit)
        );
        assert_eq!(
            key_to_event(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(SurfaceEvent::Closed)
        );
        assert_eq!(key_to_event(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(key_to_event(&press(KeyCode::Char(' '), KeyModifiers::NONE)), None);
    }

    #[test]
    fn preview_ignores_key_releases() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(key_to_event(&release), None);
    }
}
