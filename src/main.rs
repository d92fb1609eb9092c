mod app;
mod config;
mod constants;
mod generate;
mod input;
mod mail;
mod ui;
mod validate;

use anyhow::Result;
use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,quill=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .map(|dir| dir.join("quill.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"quill - AI-assisted email drafting and sending

Usage: quill [command]

Commands:
    (none)      Start quill
    setup       Create the configuration file
    help        Show this help message

Configuration file: ~/.config/quill/config.toml
"#
    );
}

fn run_setup() -> Result<()> {
    use std::io::{self, Write};

    println!("Quill Setup");
    println!("===========\n");

    // Check if config exists
    let config_path = Config::config_path()?;
    if config_path.exists() {
        print!("Configuration already exists. Overwrite? [y/N]: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    // Sender address, with the same check the form applies to recipients
    let sender = loop {
        print!("Your Gmail address: ");
        io::stdout().flush()?;
        let mut sender = String::new();
        io::stdin().read_line(&mut sender)?;
        let sender = sender.trim().to_string();

        if validate::is_valid_email(&sender) {
            break sender;
        }
        println!("Invalid email format. Please enter a valid address (e.g., you@gmail.com)");
    };

    print!("Ollama model [llama3.1]: ");
    io::stdout().flush()?;
    let mut model = String::new();
    io::stdin().read_line(&mut model)?;
    let model = model.trim();

    print!("Ollama host [http://localhost:11434]: ");
    io::stdout().flush()?;
    let mut host = String::new();
    io::stdin().read_line(&mut host)?;
    let host = host.trim();

    let mut generation = config::GenerationConfig::default();
    if !model.is_empty() {
        generation.model = model.to_string();
    }
    if !host.is_empty() {
        generation.host = host.to_string();
    }

    let config = Config {
        generation,
        mail: config::MailConfig {
            sender,
            client_secret_path: None,
            token_path: None,
        },
        ui: config::UiConfig::default(),
    };

    config.ensure_dirs()?;
    config.save()?;
    println!("Configuration saved to {}", config_path.display());

    let secret_path = config.mail.client_secret_path()?;
    if !secret_path.exists() {
        println!(
            "\nNext step: download an OAuth client secret (Desktop app) from\n\
             https://console.cloud.google.com/apis/credentials and save it as\n\
             {}",
            secret_path.display()
        );
    }

    println!("\nSetup complete! Run 'quill' to start.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("setup") => run_setup(),
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
        None => {
            setup_logging();

            let config = Config::load()?;
            config.ensure_dirs()?;

            crate::ui::theme::init_theme(config.ui.theme);

            // Authentication runs before the terminal enters raw mode; a
            // failure here is fatal for startup.
            let mut app = App::new(config).await?;
            app.run().await
        }
    }
}
