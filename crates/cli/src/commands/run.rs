//! `switchyard run` — Execute one turn against a recorded model response.
//!
//! Reads the response text from a file or stdin, feeds it through the
//! streaming pipeline in fixed-size chunks and prints command activity as
//! it happens, the way a live session would see it.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use switchyard_commands::commands_with_preferences;
use switchyard_config::AppConfig;
use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::event::{ChannelObserver, PartialDelta, PipelineEvent};
use switchyard_runtime::TurnRunner;
use tokio::sync::mpsc;

pub async fn run(
    input: Option<PathBuf>,
    chunk_size: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let text = match &input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let registry = commands_with_preferences(Arc::new(config.preference_store()))
        .map_err(|e| format!("Failed to build command registry: {e}"))?;

    let ctx = TurnContext::new(
        config.allowed_commands.iter().cloned(),
        config.preference_flags.clone(),
    );

    let (event_tx, mut events) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if !json {
                print_event(event);
            }
        }
    });

    let runner = TurnRunner::new(Arc::new(registry))
        .with_observer(Arc::new(ChannelObserver::new(event_tx)))
        .with_reasoning_command(config.reasoning_command.clone());

    let chunks = split_chunks(&text, chunk_size);
    let (chunk_tx, chunk_rx) = mpsc::channel(chunks.len().max(1));
    for chunk in chunks {
        let _ = chunk_tx.send(chunk).await;
    }
    drop(chunk_tx);

    let report = runner.run(&ctx, chunk_rx).await;
    drop(runner);
    printer.await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("  Outcome:     {}", report.outcome.as_str());
        println!(
            "  Dispatched:  {} commands ({} actionable)",
            report.commands_dispatched, report.actionable_dispatched
        );
        if let Some(feedback) = &report.failure {
            println!();
            for line in feedback.lines() {
                println!("  [feedback] {line}");
            }
        }
    }

    Ok(())
}

fn print_event(event: PipelineEvent) {
    match event {
        PipelineEvent::PartialCommand { name, delta, .. } => match delta {
            PartialDelta::Text { suffix } => {
                if !suffix.is_empty() {
                    print!("{suffix}");
                    let _ = std::io::stdout().flush();
                }
            }
            PartialDelta::Full { args } => {
                match args.sole_string() {
                    Some((_, text)) => print!("\n  {name} > {text}"),
                    None => print!("\n  {name} > {}", preview(&args)),
                }
                let _ = std::io::stdout().flush();
            }
        },
        PipelineEvent::RunningCommand { name, args } => {
            println!();
            println!("  [run] {name} {}", preview(&args));
        }
        PipelineEvent::CommandResult { name, result } => {
            if !result.is_null() {
                println!("  [result] {name} {result}");
            }
        }
    }
}

fn preview(args: &CommandArgs) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "<unprintable>".into())
}

/// Split `text` into chunks of roughly `chunk_size` bytes, never inside a
/// character.
fn split_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if current.len() >= size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_the_whole_text() {
        let text = "[{\"say\": {\"text\": \"hello\"}}]";
        let chunks = split_chunks(text, 7);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let text = "héllo wörld ← arrows →";
        let chunks = split_chunks(text, 4);
        assert_eq!(chunks.concat(), text);
        // A chunk may overshoot by one char at most: 4 + 3 bytes.
        for chunk in &chunks {
            assert!(chunk.len() <= 7);
        }
    }

    #[test]
    fn zero_chunk_size_still_makes_progress() {
        let chunks = split_chunks("abc", 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_chunks("", 64).is_empty());
    }
}
