use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use quill_app::utils::likes::{self, PostRecord};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "quill", version, about = "Quill blog platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP server using the layered configuration
    Serve,
    /// Summarise likes in a JSON array of posts
    Likes {
        /// File containing `[{"title": ..., "author": ..., "likes": ...}, ...]`
        path: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => serve(),
        Command::Likes { path, json } => print_likes(&path, json),
    }
}

fn serve() -> anyhow::Result<()> {
    let settings = quill_kernel::settings::Settings::load()
        .with_context(|| "failed to load Quill settings")?;
    quill_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, "quill serve starting");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(quill_app::app::serve(settings))
}

fn print_likes(path: &Path, as_json: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let records = likes::records_from_json(value)
        .with_context(|| format!("{} does not hold post records", path.display()))?;

    let total = likes::total_likes(&records);
    let favorite = likes::favorite_post(&records);

    if as_json {
        println!("{}", json!({ "total_likes": total, "favorite": favorite }));
    } else {
        println!("total likes: {}", total);
        println!("favorite: {}", describe(favorite));
    }
    Ok(())
}

fn describe(favorite: Option<&PostRecord>) -> String {
    match favorite {
        Some(PostRecord {
            title,
            author: Some(author),
            likes,
        }) => format!("{} by {} ({} likes)", title, author, likes),
        Some(PostRecord { title, likes, .. }) => format!("{} ({} likes)", title, likes),
        None => "none (no posts)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn describe_favorite() {
        let post = PostRecord::new("Type wars", Some("Robert C. Martin"), 2);
        assert_eq!(describe(Some(&post)), "Type wars by Robert C. Martin (2 likes)");
        assert_eq!(
            describe(Some(&PostRecord::new("Anonymous", None, 1))),
            "Anonymous (1 likes)"
        );
        assert_eq!(describe(None), "none (no posts)");
    }
}
