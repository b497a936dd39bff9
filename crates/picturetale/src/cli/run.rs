//! The `picturetale run` command: one image through every stage, in the terminal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use picturetale_core::{AudioArtifact, Config, MediaType, Picturetale};

use super::pipeline_args::{self, PipelineArgs};

/// Arguments for the `run` command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Image file to caption (jpg, png, webp, gif)
    pub image: PathBuf,

    /// Where to write the narration audio (default: story_audio.<ext> for the audio format)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Stop after the story; don't call the narration provider
    #[arg(long)]
    pub skip_narration: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    args.pipeline.apply(&mut config);
    pipeline_args::prompt_for_missing_token(&mut config)?;

    let bytes = std::fs::read(&args.image)?;
    let media_type = MediaType::from_path(&args.image)
        .map(|m| m.mime())
        .unwrap_or("application/octet-stream");

    let app = Picturetale::new(config)?;
    let mut session = app.session();

    let bold = Style::new().bold();
    let dim = Style::new().dim();

    let spinner = stage_spinner("Captioning image...");
    let caption = session.submit_image(bytes, media_type).await;
    spinner.finish_and_clear();
    let caption = caption?;

    println!("{}", bold.apply_to("Caption"));
    println!("{}", caption.text);
    println!(
        "{}",
        dim.apply_to(format!("{} · {}ms", caption.model, caption.latency_ms))
    );
    println!();

    let spinner = stage_spinner("Writing story...");
    let story = session.expand_to_story(&caption).await;
    spinner.finish_and_clear();
    let story = story?;

    println!("{}", bold.apply_to("Story"));
    println!("{}", story.text);
    println!(
        "{}",
        dim.apply_to(format!("{} · {}ms", story.model, story.latency_ms))
    );

    if args.skip_narration {
        return Ok(());
    }

    let spinner = stage_spinner("Narrating story...");
    let audio = session.narrate(&story).await;
    spinner.finish_and_clear();

    let audio = audio?;
    let extension = audio.file_extension();
    match audio {
        AudioArtifact::Audio {
            bytes,
            media_type,
            model,
        } => {
            let output = output_path(args.output.as_deref(), extension);
            std::fs::write(&output, &bytes)?;
            tracing::info!("Wrote {} bytes of {media_type} from {model}", bytes.len());

            let ok = Style::new().for_stderr().green();
            eprintln!();
            eprintln!(
                "  {} Audio saved to {}",
                ok.apply_to("✓"),
                output.display()
            );
        }
        AudioArtifact::Directive(_) => {
            let warn = Style::new().for_stderr().yellow();
            eprintln!();
            eprintln!(
                "  {}",
                warn.apply_to(
                    "Narration was delegated to a client speech engine; no audio file written. \
                     Use --narration-provider huggingface or openai to save audio."
                )
            );
        }
    }

    Ok(())
}

fn stage_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Resolve `--output`, defaulting to `story_audio.<ext>` for the audio's format.
fn output_path(raw: Option<&str>, extension: &str) -> PathBuf {
    match raw {
        Some(raw) => Path::new(shellexpand::tilde(raw).as_ref()).to_path_buf(),
        None => PathBuf::from(format!("story_audio.{extension}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_expands_tilde() {
        assert_eq!(output_path(Some("story.wav"), "flac"), PathBuf::from("story.wav"));
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(
                output_path(Some("~/story.wav"), "wav"),
                PathBuf::from(home).join("story.wav")
            );
        }
    }

    #[test]
    fn test_default_output_follows_audio_format() {
        assert_eq!(output_path(None, "wav"), PathBuf::from("story_audio.wav"));
        assert_eq!(output_path(None, "flac"), PathBuf::from("story_audio.flac"));
    }
}
