//! Babel Tavern CLI - character card translator.

use anyhow::{Context, Result, bail};
use babel_tavern::backend::create_backend;
use babel_tavern::card::Card;
use babel_tavern::config::{Config, Provider};
use babel_tavern::console::Console;
use babel_tavern::error::WalkError;
use babel_tavern::translator::{TranslateSource, Translator};
use babel_tavern::walker;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Translates the text fields of a character card through an LLM.
#[derive(Parser, Debug)]
#[command(name = "babel-tavern")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Card to translate (.json, or .png with embedded metadata).
    input: PathBuf,

    /// Language the card is written in.
    #[arg(long = "from")]
    source_lang: Option<String>,

    /// Language to translate into.
    #[arg(long = "to")]
    target_lang: Option<String>,

    /// Where to write the translated card.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use this config file instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text-generation service to use.
    #[arg(long, value_enum)]
    provider: Option<Provider>,

    /// Model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Ceiling on concurrent backend requests.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_in_flight: Option<u64>,

    /// List the translatable fields of the card and exit.
    #[arg(long)]
    inspect: bool,

    /// Log every backend request.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let console = Console::new();

    let _ = SubscriberBuilder::default()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .try_init();

    match run(&args, &console).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            console.error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, console: &Console) -> Result<()> {
    console.section("Babel Tavern - Character Card Translator");

    console.step("Loading configuration...");
    let config = load_config(args)?;

    console.step(&format!("Reading {}...", args.input.display()));
    let mut source = load_source(&args.input, &config).await?;
    console.success(&format!(
        "Loaded {} card \"{}\"",
        source.card.version(),
        source.card.name()
    ));

    if args.inspect {
        return inspect(&source.card, console).await;
    }

    if !config.api.is_configured() {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        console.warning(&format!(
            "API key not configured. Please edit: {}",
            config_path.display()
        ));
        console.info(&format!(
            "Or set {} in the environment and run again.",
            config.api.provider.key_env()
        ));
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;
    console.success(&format!(
        "Using {} ({})",
        config.api.provider,
        console.muted(&config.api.model)
    ));

    let backend = create_backend(&config.api, config.translation.request_timeout())
        .context("Failed to create backend")?;
    let translator = Translator::from_config(backend, &config);

    console.step(&format!(
        "Translating {}...",
        console.language_pair(&source.source_lang, &source.target_lang)
    ));
    translator
        .run(&mut source)
        .await
        .context("Translation failed")?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.input, &config),
    };
    let bytes = source.card.to_json_bytes()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    console.success(&format!("Saved to {}", output.display()));
    Ok(())
}

/// Loads the config file, then layers environment and command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(provider) = args.provider {
        config.api.set_provider(provider);
    }
    config.apply_env(|name| std::env::var(name).ok());

    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(lang) = &args.source_lang {
        config.translation.source_lang = lang.clone();
    }
    if let Some(lang) = &args.target_lang {
        config.translation.target_lang = lang.clone();
    }
    if let Some(limit) = args.max_in_flight {
        config.translation.max_in_flight = Some(usize::try_from(limit)?);
    }

    Ok(config)
}

async fn load_source(input: &Path, config: &Config) -> Result<TranslateSource> {
    let source_lang = config.translation.source_lang.as_str();
    let target_lang = config.translation.target_lang.as_str();

    let is_png = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

    let source = if is_png {
        let bytes = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        TranslateSource::from_png(&bytes, source_lang, target_lang)?
    } else {
        let text = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", input.display()))?;
        TranslateSource::from_json(value, source_lang, target_lang)?
    };

    Ok(source)
}

/// Lists every declared field the walker reaches.
async fn inspect(card: &Card, console: &Console) -> Result<()> {
    let names = Mutex::new(Vec::new());
    let collected = &names;
    let record = move |name: &'static str| async move {
        collected.lock().await.push(name);
        Ok::<(), WalkError>(())
    };
    walker::visit(card, &record).await?;

    let names = names.into_inner();
    if names.is_empty() {
        bail!("card has no translatable fields");
    }

    console.info(&format!("{} declared fields:", console.count(names.len())));
    for (index, name) in names.iter().enumerate() {
        console.field(index + 1, name);
    }
    Ok(())
}

fn default_output_path(input: &Path, config: &Config) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "card".to_string());

    config
        .output_dir_for(input)
        .join(format!("{}.{}.json", stem, config.translation.target_lang))
}
