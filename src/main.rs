use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use tracing_subscriber::EnvFilter;

use mothersync::services::{SpeechService, TranslationService};
use mothersync::{
    AllergenCatalog, Assistant, Config, GoogleTranslateClient, ImageUpload, Language, Resilient,
    Session, TextToSpeech, allergen_warning,
};

/// MotherSync - assistant for new mothers with allergen screening
#[derive(Parser)]
#[command(name = "mothersync", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/mothersync/config.toml)
    #[arg(short, long, env = "MOTHERSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and chat (default)
    Chat {
        /// Write spoken replies as MP3 files into this directory
        #[arg(long)]
        audio_dir: Option<PathBuf>,
    },
    /// Log in and screen one product image for allergens
    Scan {
        /// JPEG or PNG image
        image: PathBuf,
        /// Account username
        #[arg(short, long)]
        user: String,
    },
    /// Check a product description against allergies (offline)
    Detect {
        /// Product description
        description: String,
        /// Allergy to check; repeat for several
        #[arg(short, long = "allergy", required = true)]
        allergies: Vec<String>,
    },
    /// Translate text
    Translate {
        text: String,
        /// Target language name or code
        #[arg(short, long)]
        to: Language,
    },
    /// Synthesize speech to an MP3 file
    Speak {
        text: String,
        /// Language name or code
        #[arg(short, long, default_value = "en")]
        language: Language,
        /// Output file
        #[arg(short, long, default_value = "speech.mp3")]
        output: PathBuf,
    },
    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,mothersync=info",
        1 => "info,mothersync=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let load_config = || Config::load(cli.config.as_deref());

    match cli.command.unwrap_or(Command::Chat { audio_dir: None }) {
        Command::Chat { audio_dir } => chat(&load_config()?, audio_dir.as_deref()).await,
        Command::Scan { image, user } => scan(&load_config()?, &image, &user).await,
        Command::Detect {
            description,
            allergies,
        } => detect(&description, &allergies),
        Command::Translate { text, to } => translate(&load_config()?, &text, to).await,
        Command::Speak {
            text,
            language,
            output,
        } => speak(&load_config()?, &text, language, &output).await,
        Command::Languages => {
            for language in Language::ALL {
                println!("{:<10} {}", language.name(), language.code());
            }
            Ok(())
        }
    }
}

fn detect(description: &str, allergies: &[String]) -> anyhow::Result<()> {
    let catalog = AllergenCatalog::builtin();
    let (allergies, unknown) = split_known(catalog, allergies);

    for name in &unknown {
        let known: Vec<_> = catalog.names().collect();
        println!("Skipping unknown allergen '{name}' (known: {}).", known.join(", "));
    }

    let detected = catalog.detect(description, &allergies);
    match allergen_warning(&detected) {
        Some(warning) => println!("{warning}"),
        None => println!("No listed allergens detected."),
    }
    Ok(())
}

/// Normalize allergy names and separate those missing from `catalog`
fn split_known(catalog: &AllergenCatalog, allergies: &[String]) -> (Vec<String>, Vec<String>) {
    allergies
        .iter()
        .map(|a| a.trim().to_lowercase())
        .partition(|a| catalog.contains(a))
}

/// Prompt for credentials until login succeeds
///
/// With a fixed `username` a failed login is returned instead of retried.
fn prompt_login(assistant: &Assistant, username: Option<&str>) -> anyhow::Result<Session> {
    loop {
        let name = match username {
            Some(name) => name.to_string(),
            None => Input::<String>::new().with_prompt("Username").interact_text()?,
        };
        let password = Password::new().with_prompt("Password").interact()?;

        match assistant.login(&name, &password) {
            Ok(session) => {
                println!("Welcome, {}!", session.account().username());
                return Ok(session);
            }
            Err(e) if username.is_none() => println!("{e}. Try again."),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn chat(config: &Config, audio_dir: Option<&Path>) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    if let Some(dir) = audio_dir {
        std::fs::create_dir_all(dir)?;
    }

    println!("MotherSync. Commands: /upload <path>, /language <name>, /translate, /logout, /quit");

    loop {
        let mut session = prompt_login(&assistant, None)?;
        let mut replies = 0usize;

        loop {
            let line: String = Input::new()
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()?;
            let line = line.trim();

            let (command, argument) = line
                .split_once(' ')
                .map_or((line, ""), |(c, a)| (c, a.trim()));

            match command {
                "" => {}
                "/quit" => {
                    session.end();
                    return Ok(());
                }
                "/logout" => {
                    session.end();
                    break;
                }
                "/upload" => match ImageUpload::from_path(Path::new(argument)) {
                    Ok(upload) => match assistant.upload_image(&mut session, upload).await {
                        Ok(Some(warning)) => println!("{warning}"),
                        Ok(None) => println!("Image uploaded."),
                        Err(e) => println!("Image uploaded, but screening failed: {e}"),
                    },
                    Err(e) => println!("{e}"),
                },
                "/language" => match argument.parse::<Language>() {
                    Ok(language) => {
                        session.set_language(language);
                        println!("Language set to {language}.");
                    }
                    Err(e) => println!("{e}"),
                },
                "/translate" => match assistant.translate_last(&session).await {
                    Ok(Some(translation)) => {
                        println!("[{}] {}", translation.language, translation.text);
                        save_reply_audio(audio_dir, &mut replies, translation.audio.as_deref());
                    }
                    Ok(None) => println!("Nothing to translate yet."),
                    Err(e) => println!("Translation failed: {e}"),
                },
                _ => match assistant.chat(&mut session, line).await {
                    Ok(turn) => {
                        println!("MotherSync: {}", turn.display_text);
                        save_reply_audio(audio_dir, &mut replies, turn.audio.as_deref());
                    }
                    Err(e) => println!("Sorry, something went wrong: {e}"),
                },
            }
        }
    }
}

/// Write spoken audio as the next numbered MP3 in `dir`
///
/// A failed write is reported and the chat carries on.
fn save_reply_audio(
    dir: Option<&Path>,
    replies: &mut usize,
    audio: Option<&[u8]>,
) -> Option<PathBuf> {
    let (dir, audio) = (dir?, audio?);
    *replies += 1;
    let path = dir.join(format!("reply-{:03}.mp3", *replies));

    match std::fs::write(&path, audio) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), bytes = audio.len(), "saved reply audio");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to save reply audio");
            println!("Could not save audio: {e}");
            None
        }
    }
}

async fn scan(config: &Config, image: &Path, user: &str) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    let upload = ImageUpload::from_path(image)?;
    let mut session = prompt_login(&assistant, Some(user))?;

    if !session.account().is_child() || session.allergies().is_empty() {
        println!("No allergies on file for {user}; nothing to screen.");
        session.end();
        return Ok(());
    }

    match assistant.upload_image(&mut session, upload).await? {
        Some(warning) => println!("{warning}"),
        None => println!("No listed allergens detected."),
    }
    session.end();
    Ok(())
}

async fn translate(config: &Config, text: &str, to: Language) -> anyhow::Result<()> {
    let client = Resilient::new(
        GoogleTranslateClient::new().with_base_url(config.translation.base_url.clone()),
        config.retry.clone(),
    );
    let translated = client.translate(text, to).await?;
    println!("{translated}");
    Ok(())
}

async fn speak(
    config: &Config,
    text: &str,
    language: Language,
    output: &Path,
) -> anyhow::Result<()> {
    let tts = Resilient::new(TextToSpeech::from_config(&config.speech)?, config.retry.clone());

    let audio = tts.synthesize(text, language).await?;
    std::fs::write(output, &audio)?;
    println!("Wrote {} bytes to {}", audio.len(), output.display());
    Ok(())
}
