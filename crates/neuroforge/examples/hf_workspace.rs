//! # Interactive workspace on the Hugging Face Inference API
//!
//! A line-based stand-in for the editor UI. Every line you type is appended
//! to the buffer, analysed after the 1.5 s quiet period and can be continued
//! by the generator.
//!
//! ```bash
//! export HF_API_TOKEN=hf_…                 # mandatory
//! export NEUROFORGE_SETTINGS=settings.json # optional, see `AppSettings`
//! RUST_LOG=neuroforge_session=debug cargo run -p neuroforge --example hf_workspace
//! ```
//!
//! Commands:
//!
//! ```text
//! /gen            continue the text with the generator
//! /model <id>     switch the sentiment classifier
//! /models         list the known classifier models
//! /analysis       print the latest analysis snapshot
//! /status         print every task's status
//! /logs           print the system log
//! /quit
//! ```
use std::env;

use anyhow::Context;
use neuroforge::{
    Task, catalog,
    hf::HfEngineBuilder,
    session::{GenerateOutcome, Session},
    settings::AppSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match env::var("NEUROFORGE_SETTINGS") {
        Ok(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading settings from {path}"))?;
            AppSettings::from_json(&json)?
        }
        Err(_) => AppSettings::default(),
    };

    let engine = HfEngineBuilder::new_from_env().build()?;
    let session = Session::builder(engine).with_settings(settings).build()?;

    println!("Loading models…");
    session.initialize().await;
    print_statuses(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/status" => print_statuses(&session),
            "/logs" => print_logs(&session),
            "/analysis" => print_analysis(&session),
            "/models" => {
                for model in catalog::models(Task::Classifier) {
                    println!("{:<60} {}", model.id, model.name);
                }
            }
            "/gen" => match session.generate().await {
                GenerateOutcome::Completed(completion) => {
                    println!("+{completion}");
                    println!("{}", session.text());
                }
                GenerateOutcome::Skipped(reason) => println!("skipped: {reason:?}"),
                GenerateOutcome::Failed(message) => println!("generation failed: {message}"),
            },
            command if command.starts_with("/model ") => {
                let model_id = command.trim_start_matches("/model ").trim();
                let status = session.swap_model(Task::Classifier, model_id).await?;
                println!("{:?}: {}", status.task(), status.state());
            }
            text => {
                let mut buffer = session.text();
                if !buffer.is_empty() {
                    buffer.push(' ');
                }
                buffer.push_str(text);
                println!("{:?}", session.edit(buffer));
            }
        }
    }

    Ok(())
}

fn print_statuses<E: neuroforge::InferenceEngine + 'static>(session: &Session<E>) {
    for status in session.statuses() {
        let detail = match (status.progress(), status.message()) {
            (Some(percent), _) => format!("{percent}%"),
            (None, Some(message)) => message.to_owned(),
            (None, None) => String::new(),
        };
        println!("{} {} {detail}", status.task(), status.state());
    }
}

fn print_logs<E: neuroforge::InferenceEngine + 'static>(session: &Session<E>) {
    for entry in session.logs() {
        println!(
            "{} [{}] {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.source,
            entry.message
        );
    }
}

fn print_analysis<E: neuroforge::InferenceEngine + 'static>(session: &Session<E>) {
    let Some(snapshot) = session.snapshot() else {
        println!("no analysis yet");
        return;
    };

    println!(
        "v{} sentiment {} ({:.0}%)",
        snapshot.produced_at_version,
        snapshot.sentiment.label,
        snapshot.sentiment.score * 100.0
    );
    if let Some(conflict) = snapshot.conflict {
        println!("   conflict  {} ({:.0}%)", conflict.label, conflict.score * 100.0);
    }
}
