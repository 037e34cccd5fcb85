use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use shortreel_core::{
    AssetSource, FluxImageSource, PexelsVideoSource, Provider, Renderer, ScriptGenerator,
    ShortreelError, SpeechConfig, SpeechSynthesizer, SttConfig, Transcriber, Transcription,
    UnmappedPolicy, WorkDir, align_captions,
    cache::{get_audio_path, get_cache_dir, get_script_path, get_transcript_path},
    fetch_scene_asset, format_timestamp, group_scenes, intervals_from_scenes, load_script,
    load_transcription, resolve_timeline, save_script, save_transcription, wav_duration,
};
use tokio::fs;

/// CLI wrapper for Provider (needed for clap ValueEnum)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliProvider {
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

/// Where the background footage for each scene comes from.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliAssets {
    /// Generate a still with FLUX and animate it
    Flux,
    /// Search stock video on Pexels
    Pexels,
}

/// What to do with a caption chunk that cannot be timed.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPolicy {
    Drop,
    Nearest,
    Fail,
}

impl From<CliPolicy> for UnmappedPolicy {
    fn from(cli: CliPolicy) -> Self {
        match cli {
            CliPolicy::Drop => UnmappedPolicy::Drop,
            CliPolicy::Nearest => UnmappedPolicy::Nearest,
            CliPolicy::Fail => UnmappedPolicy::Fail,
        }
    }
}

#[derive(Parser)]
#[command(name = "shortreel")]
#[command(about = "Turn a topic into a narrated short-form video", long_about = None)]
struct Cli {
    /// Topic to build a video about
    #[arg(required_unless_present = "ideas")]
    topic: Option<String>,

    /// Suggest five topic ideas and exit
    #[arg(long)]
    ideas: bool,

    /// AI provider for the script and search queries
    #[arg(short, long, value_enum, default_value = "grok")]
    provider: CliProvider,

    /// Source of background footage
    #[arg(short, long, value_enum, default_value = "flux")]
    assets: CliAssets,

    /// Narration voice
    #[arg(long, default_value = "alloy")]
    voice: String,

    /// Narration speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Scene length in seconds
    #[arg(long, default_value_t = 5.0)]
    scene_seconds: f64,

    /// Longest caption line, in characters
    #[arg(long, default_value_t = 15)]
    caption_chars: usize,

    /// How to handle caption chunks that cannot be timed
    #[arg(long, value_enum, default_value = "drop")]
    on_unmapped: CliPolicy,

    /// Directory for finished videos
    #[arg(short, long, default_value = "final_videos")]
    output: PathBuf,

    /// Re-run every stage even when cached files exist
    #[arg(short, long)]
    force: bool,

    /// Keep the work directory with intermediate clips
    #[arg(long)]
    keep_work: bool,

    /// Transcribe with a local whisper model instead of the hosted engine
    #[cfg(feature = "local-whisper")]
    #[arg(long)]
    local: bool,
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

#[cfg(feature = "local-whisper")]
extern "C" fn whisper_log_callback(
    _level: u32,
    _message: *const std::ffi::c_char,
    _user_data: *mut std::ffi::c_void,
) {
    // silent
}

#[cfg(feature = "local-whisper")]
async fn transcribe_locally(audio: &Path) -> Result<Transcription> {
    let root = shortreel_core::cache::get_root_cache_dir();
    let model_path = shortreel_core::ensure_model(&root).await?;
    Ok(shortreel_core::transcribe_local(audio, &model_path).await?)
}

#[cfg(not(feature = "local-whisper"))]
async fn transcribe_locally(_audio: &Path) -> Result<Transcription> {
    Err(anyhow::anyhow!(
        "this build does not include the local-whisper feature"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    #[cfg(feature = "local-whisper")]
    unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    }

    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    let generator = ScriptGenerator::new(provider.clone())?;

    if cli.ideas {
        let spinner = create_spinner(&format!("Brainstorming topics with {}...", provider.name()));
        let topics = generator.suggest_topics().await?;
        spinner.finish_and_clear();
        println!("{}", style("Topic ideas:").cyan().bold());
        for (i, topic) in topics.iter().enumerate() {
            println!("  {}. {}", i + 1, topic);
        }
        return Ok(());
    }

    // clap guarantees the topic is present when --ideas is absent
    let topic = cli.topic.clone().unwrap_or_default();

    #[cfg(feature = "local-whisper")]
    let use_local = cli.local;
    #[cfg(not(feature = "local-whisper"))]
    let use_local = false;

    // Build the remaining clients up front so a missing API key fails
    // before any stage has run.
    let speech = SpeechSynthesizer::new(SpeechConfig {
        voice: cli.voice.clone(),
        speed: cli.speed,
        ..Default::default()
    })?;
    let transcriber = if use_local {
        None
    } else {
        Some(Transcriber::new(SttConfig::default())?)
    };
    let source: Box<dyn AssetSource> = match cli.assets {
        CliAssets::Flux => Box::new(FluxImageSource::new()?),
        CliAssets::Pexels => Box::new(PexelsVideoSource::new()?),
    };

    println!(
        "\n{}  {}\n",
        style("shortreel").cyan().bold(),
        style("topic to short video").dim()
    );
    println!("{} {}", style("Topic:").dim(), style(&topic).bold());
    println!("{}", style("─".repeat(60)).dim());

    let cache_dir = get_cache_dir(&topic);
    fs::create_dir_all(&cache_dir).await?;

    let total_start = Instant::now();

    // Step 1: Script (check cache)
    let step_start = Instant::now();
    let script_path = get_script_path(&cache_dir);
    let script = if !cli.force && script_path.exists() {
        let script = load_script(&script_path).await?;
        println!(
            "{} Script ready: {} words {}",
            style("✓").green().bold(),
            script.split_whitespace().count(),
            style("(cached)").dim()
        );
        script
    } else {
        let spinner = create_spinner(&format!("Writing script with {}...", provider.name()));
        let script = generator.generate_script(&topic).await?;
        save_script(&script, &script_path).await?;
        spinner.finish_with_message(format!(
            "{} Script ready: {} words {}",
            style("✓").green().bold(),
            script.split_whitespace().count(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        script
    };

    // Step 2: Narration (check cache)
    let step_start = Instant::now();
    let audio_file = get_audio_path(&cache_dir);
    let narration_secs = if !cli.force && audio_file.exists() {
        let secs = wav_duration(&audio_file)?;
        println!(
            "{} Narration ready: {:.1}s {}",
            style("✓").green().bold(),
            secs,
            style("(cached)").dim()
        );
        secs
    } else {
        let spinner = create_spinner("Synthesizing narration...");
        let secs = speech.synthesize(&script, &audio_file).await?;
        spinner.finish_with_message(format!(
            "{} Narration ready: {:.1}s, voice {} {}",
            style("✓").green().bold(),
            secs,
            style(speech.voice()).yellow(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        secs
    };

    // Step 3: Transcription (check cache)
    let step_start = Instant::now();
    let transcript_path = get_transcript_path(&cache_dir);
    let transcription = if !cli.force && transcript_path.exists() {
        let transcription = load_transcription(&transcript_path).await?;
        println!(
            "{} Transcribed: {} words, language: {} {}",
            style("✓").green().bold(),
            transcription.words.len(),
            style(transcription.language.as_deref().unwrap_or("unknown")).yellow(),
            style("(cached)").dim()
        );
        transcription
    } else {
        let spinner = create_spinner("Transcribing narration...");
        let transcription = match &transcriber {
            Some(t) => t.transcribe(&audio_file).await?,
            None => transcribe_locally(&audio_file).await?,
        };
        save_transcription(&transcription, &transcript_path).await?;
        spinner.finish_with_message(format!(
            "{} Transcribed: {} words, language: {} {}",
            style("✓").green().bold(),
            transcription.words.len(),
            style(transcription.language.as_deref().unwrap_or("unknown")).yellow(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        transcription
    };

    // Captions and scenes are pure transforms, no spinner needed.
    let aligned = align_captions(&transcription, cli.caption_chars, cli.on_unmapped.into())?;
    if aligned.segments.is_empty() {
        anyhow::bail!("no caption could be aligned with the narration");
    }
    let dropped_note = if aligned.dropped > 0 {
        format!(" ({} dropped)", aligned.dropped)
    } else {
        String::new()
    };
    println!(
        "{} Captions aligned: {} segments{}",
        style("✓").green().bold(),
        aligned.segments.len(),
        style(dropped_note).yellow()
    );

    let mut scenes = group_scenes(&aligned.segments, cli.scene_seconds);
    if scenes.is_empty() {
        anyhow::bail!("no scene covers the narration");
    }
    println!(
        "{} Scenes grouped: {} windows of {:.1}s",
        style("✓").green().bold(),
        scenes.len(),
        cli.scene_seconds
    );

    // Step 4: Footage for every scene (skip-and-continue)
    let work = WorkDir::create(&cache_dir, cli.keep_work).await?;
    let step_start = Instant::now();
    let bar = ProgressBar::new(scenes.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Fetching footage {bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    let mut skipped = 0usize;
    for scene in scenes.iter_mut() {
        bar.set_message(format!("[{}]", format_timestamp(scene.start)));
        match fetch_scene_asset(&generator, source.as_ref(), scene, &work.clips_dir()).await {
            Ok(path) => scene.video_path = Some(path),
            Err(e) => {
                bar.println(format!(
                    "{} scene at {} skipped: {}",
                    style("!").yellow().bold(),
                    format_timestamp(scene.start),
                    e
                ));
                skipped += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    if skipped == scenes.len() {
        return Err(ShortreelError::NoUsableAssets.into());
    }
    println!(
        "{} Footage fetched ({}): {} of {} scenes {}",
        style("✓").green().bold(),
        source.name(),
        scenes.len() - skipped,
        scenes.len(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    );

    let timeline = resolve_timeline(&intervals_from_scenes(&scenes));
    let filled_note = if timeline.filled > 0 {
        format!(" ({} filled from neighbors)", timeline.filled)
    } else {
        String::new()
    };
    println!(
        "{} Timeline resolved: {} ranges{}",
        style("✓").green().bold(),
        timeline.intervals.len(),
        style(filled_note).dim()
    );

    // Step 5: Render
    let step_start = Instant::now();
    fs::create_dir_all(&cli.output).await?;
    let final_path = cli
        .output
        .join(format!("video_{}.mp4", Local::now().format("%Y%m%d_%H%M%S")));
    let spinner = create_spinner("Rendering video...");
    let renderer = Renderer::new(work.segments_dir());
    renderer
        .render(
            &timeline.intervals,
            &aligned.segments,
            &audio_file,
            narration_secs,
            &work.srt_path(),
            &final_path,
        )
        .await?;
    spinner.finish_with_message(format!(
        "{} Rendered {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}",
        style("Saved:").dim(),
        style(final_path.display()).cyan()
    );
    if cli.keep_work {
        println!(
            "{} {}",
            style("Work files:").dim(),
            style(work.path().display()).dim()
        );
    }

    Ok(())
}
