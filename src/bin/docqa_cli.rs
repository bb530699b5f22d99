use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docqa::{
    answer::{ComposerKind, generate_answer_with},
    embedding::{Embedding, EmbeddingStrategy, generate_embedding},
    logging,
};
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "docqa-cli",
    about = "Answer questions and embed text without a running server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question from the contents of a context file.
    Answer {
        #[arg(long)]
        question: String,
        #[arg(long)]
        context: PathBuf,
        #[arg(long, default_value = "template", value_parser = parse_composer)]
        composer: ComposerKind,
    },
    /// Embed a file, or every `.txt`/`.md` file under a directory.
    Embed {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "word", value_parser = parse_strategy)]
        strategy: EmbeddingStrategy,
        /// Write JSON here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct EmbeddedFile {
    path: String,
    embedding: Embedding,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init_tracing("warn");
    let cli = Cli::parse();
    match cli.command {
        Command::Answer {
            question,
            context,
            composer,
        } => answer(&question, &context, composer),
        Command::Embed {
            input,
            strategy,
            output,
        } => embed(&input, strategy, output.as_deref()),
    }
}

fn parse_composer(value: &str) -> Result<ComposerKind, String> {
    value.parse().map_err(|()| {
        format!("unknown composer `{value}` (expected template, plain, keyword, or sentence)")
    })
}

fn parse_strategy(value: &str) -> Result<EmbeddingStrategy, String> {
    value
        .parse()
        .map_err(|()| format!("unknown strategy `{value}` (expected word or char)"))
}

fn answer(question: &str, context_path: &Path, composer: ComposerKind) -> Result<()> {
    if question.trim().is_empty() {
        bail!("question must not be blank");
    }
    let context = fs::read_to_string(context_path)
        .with_context(|| format!("failed to read context file {}", context_path.display()))?;

    let answer = generate_answer_with(question, &context, composer);
    tracing::debug!(composer = %composer, chars = context.len(), "Answered from context file");
    println!("{answer}");
    Ok(())
}

fn embed(input: &Path, strategy: EmbeddingStrategy, output: Option<&Path>) -> Result<()> {
    let files = collect_text_files(input)?;
    if files.is_empty() {
        bail!("no .txt or .md files found under {}", input.display());
    }

    let mut embedded = Vec::with_capacity(files.len());
    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        embedded.push(EmbeddedFile {
            path: path.display().to_string(),
            embedding: generate_embedding(&text, strategy),
        });
    }

    let json = serde_json::to_string_pretty(&embedded).context("failed to serialize embeddings")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} embeddings to {}", embedded.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write embeddings to stdout")?;
        }
    }
    Ok(())
}

fn collect_text_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input path {} does not exist", input.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext == "txt" || ext == "md")
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}
