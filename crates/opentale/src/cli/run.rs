//! Command handlers.

use crate::cli::{Cli, Commands, SaveTarget};
use anyhow::{Context, bail};
use opentale::{
    ChatCompletionsDriver, ContextSnapshot, ContextStore, FileSystemArtifactStore,
    OpentaleConfig, OpentaleResult, ParseFallbackWarning, StreamEvent, StreamOutcome, Studio,
    normalize_manual_edit,
};
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const EVENT_BUFFER: usize = 64;

/// Execute one parsed command line.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => OpentaleConfig::from_file(path)?,
        None => OpentaleConfig::load()?,
    };
    let project = cli
        .project
        .clone()
        .unwrap_or_else(|| config.project.name.clone());

    let backend = Arc::new(FileSystemArtifactStore::new(&config.project.output_dir)?);
    let store = Arc::new(ContextStore::open(&project, backend).await?);
    info!(project = %project, output_dir = %config.project.output_dir.display(), "Opened project");

    match cli.command {
        command @ (Commands::Chapters { .. } | Commands::Save { .. } | Commands::Show) => {
            run_offline(command, &config, &store).await
        }
        command => {
            let driver = ChatCompletionsDriver::from_env(
                &config.provider.api_key_env,
                &config.provider.model,
                &config.provider.base_url,
                config.timeout(),
            )?;
            let studio = Studio::new(
                config.orchestrator()?,
                Arc::new(driver),
                store,
                config.studio_settings()?,
            );
            run_generation(command, cli.sse, &config, &studio).await
        }
    }
}

async fn run_generation(
    command: Commands,
    sse: bool,
    config: &OpentaleConfig,
    studio: &Studio,
) -> anyhow::Result<()> {
    match command {
        Commands::World {
            topic,
            chapters,
            suggest,
            finalize,
        } => {
            let snapshot = studio.snapshot().await;
            let topic = match topic {
                Some(topic) => topic,
                None if !snapshot.topic().is_empty() => snapshot.topic().clone(),
                None => bail!("no topic stored for this project; pass --topic"),
            };
            let chapters = chapters.unwrap_or(match *snapshot.chapter_count() {
                0 => config.project.chapter_count,
                n => n,
            });
            studio.begin(&topic, chapters).await?;

            if suggest {
                println!("{}", studio.suggest_world().await?);
            } else if finalize {
                stream(sse, |sink, cancel| studio.finalize_world_stream(sink, cancel)).await?;
            } else {
                stream(sse, |sink, cancel| studio.generate_world_stream(sink, cancel)).await?;
            }
        }

        Commands::Characters { count, finalize } => {
            if finalize {
                stream(sse, |sink, cancel| {
                    studio.finalize_characters_stream(count, sink, cancel)
                })
                .await?;
            } else {
                stream(sse, |sink, cancel| {
                    studio.generate_characters_stream(count, sink, cancel)
                })
                .await?;
            }
        }

        Commands::Outline { chapters, finalize } => {
            if let Some(chapters) = chapters {
                let snapshot = studio.snapshot().await;
                studio.begin(snapshot.topic(), chapters).await?;
            }
            if finalize {
                stream(sse, |sink, cancel| studio.finalize_outline_stream(sink, cancel)).await?;
            } else {
                stream(sse, |sink, cancel| studio.generate_outline_stream(sink, cancel)).await?;
            }
        }

        Commands::Chat { stage, message } => {
            stream(sse, |sink, cancel| {
                studio.chat_stream(stage, &message, sink, cancel)
            })
            .await?;
        }

        Commands::Consult { stage, message } => {
            println!("{}", studio.consult(stage, &message).await?);
        }

        Commands::Chapter { number, context } => {
            stream(sse, |sink, cancel| {
                studio.generate_chapter_stream(number, context.as_deref(), sink, cancel)
            })
            .await?;
        }

        Commands::Edit { number } => {
            let output = studio.edit_chapter(number).await?;
            println!("{}", output.text());
        }

        Commands::Chapters { .. } | Commands::Save { .. } | Commands::Show => {
            bail!("this command does not call the generation service")
        }
    }

    Ok(())
}

async fn run_offline(
    command: Commands,
    config: &OpentaleConfig,
    store: &ContextStore,
) -> anyhow::Result<()> {
    let snapshot = store.snapshot().await;
    let declared = |explicit: Option<u32>| {
        explicit.unwrap_or(match *snapshot.chapter_count() {
            0 => config.project.chapter_count,
            n => n,
        })
    };

    match command {
        Commands::Chapters { count } => {
            let warning = store.reparse_outline(declared(count)).await?;
            report(warning.as_ref());
            print_chapters(&store.snapshot().await);
        }

        Commands::Save {
            target,
            file,
            chapters,
        } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let text = normalize_manual_edit(&text);
            match target {
                SaveTarget::World => store.write_world(&text).await?,
                SaveTarget::Characters => store.write_characters(&text).await?,
                SaveTarget::Outline => {
                    let warning = store.write_outline(&text, declared(chapters)).await?;
                    report(warning.as_ref());
                    print_chapters(&store.snapshot().await);
                }
            }
        }

        Commands::Show => print_snapshot(&snapshot),

        _ => bail!("this command needs a generation service"),
    }

    Ok(())
}

/// Run one streaming operation, printing events as they arrive.
///
/// Ctrl-C cancels the stream; a cancelled stream leaves the project untouched.
async fn stream<F, Fut>(sse: bool, start: F) -> anyhow::Result<()>
where
    F: FnOnce(mpsc::Sender<StreamEvent>, CancellationToken) -> Fut,
    Fut: Future<Output = OpentaleResult<StreamOutcome>>,
{
    let (sink, mut events) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            if sse {
                stdout.write_all(event.to_sse_frame().as_bytes()).await?;
            } else if !event.is_heartbeat() && !event.is_done() {
                stdout.write_all(event.content().as_bytes()).await?;
            }
            stdout.flush().await?;
        }
        if !sse {
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let outcome = start(sink, cancel).await;
    interrupt.abort();
    printer.await??;

    match outcome? {
        StreamOutcome::Completed(output) => report(output.warning().as_ref()),
        StreamOutcome::Cancelled => eprintln!("Cancelled; nothing was saved."),
    }
    Ok(())
}

fn report(warning: Option<&ParseFallbackWarning>) {
    if let Some(warning) = warning {
        warn!(%warning, "Outline fallback");
        eprintln!("Warning: {}", warning);
    }
}

fn print_chapters(snapshot: &ContextSnapshot) {
    for record in snapshot.outline().parsed() {
        println!("Chapter {}: {}", record.number(), record.title());
    }
}

fn print_snapshot(snapshot: &ContextSnapshot) {
    println!("Topic: {}", snapshot.topic());
    println!("Declared chapters: {}", snapshot.chapter_count());
    println!();
    println!("World:\n{}", or_placeholder(snapshot.world_theme()));
    println!();
    println!("Characters:\n{}", or_placeholder(snapshot.characters()));
    println!();
    println!("Outline:");
    if snapshot.outline().parsed().is_empty() {
        println!("(none)");
    }
    for record in snapshot.outline().parsed() {
        let words = snapshot
            .chapters()
            .get(record.number())
            .and_then(|chapter| chapter.content().as_ref())
            .map(|content| content.split_whitespace().count());
        match words {
            Some(words) => println!(
                "  Chapter {}: {} ({} words)",
                record.number(),
                record.title(),
                words
            ),
            None => println!("  Chapter {}: {} (not written)", record.number(), record.title()),
        }
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "(none)"
    } else {
        text
    }
}
