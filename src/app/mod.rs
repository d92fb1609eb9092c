//! Application core - manages state, the mail session and the generator

mod actions;
mod event_loop;
pub mod state;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::generate::{GenerateCommand, GeneratorHandle, OllamaClient, spawn_generator};
use crate::input::KeyBindings;
use crate::mail::{GmailClient, MailSession};
use state::AppState;

pub struct App {
    pub(crate) config: Config,
    pub(crate) state: AppState,
    pub(crate) bindings: KeyBindings,
    pub(crate) generator: GeneratorHandle,
    pub(crate) mailer: GmailClient,
    pub(crate) session: MailSession,
    /// Dirty flag: when true, the UI needs a re-render.
    pub(crate) dirty: bool,
}

impl App {
    /// Create the app and establish the mail session.
    ///
    /// Runs before the terminal enters raw mode so the browser-based
    /// authorization flow can print instructions. Authentication failures
    /// here propagate and abort startup.
    pub async fn new(config: Config) -> Result<Self> {
        let client = OllamaClient::new(
            config.generation.host.clone(),
            config.generation.model.clone(),
        );
        let generator = spawn_generator(client);

        let mut session = MailSession::new(
            config.mail.client_secret_path()?,
            config.mail.token_path()?,
        );
        session.authenticate().await?;

        let mut state = AppState::default();
        state.session = session.state();
        state.set_status("Fill in the form, then Ctrl+G to generate");

        Ok(Self {
            config,
            state,
            bindings: KeyBindings::new(),
            generator,
            mailer: GmailClient::new(),
            session,
            dirty: true,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Stop the generation worker; a late in-flight result is dropped.
        let _ = self.generator.cmd_tx.send(GenerateCommand::Shutdown).await;

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();

        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::mpsc;

    use super::*;
    use crate::generate::GenerateEvent;

    /// Build an app with unconnected channels and temp credential paths, for
    /// exercising action handlers without a terminal or network.
    pub(crate) fn test_app(
        tag: &str,
    ) -> (
        App,
        mpsc::Receiver<GenerateCommand>,
        mpsc::Sender<GenerateEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, event_rx) = mpsc::channel(4);

        let dir = std::env::temp_dir().join(format!("quill_app_{}_{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let config = Config {
            generation: Default::default(),
            mail: crate::config::MailConfig {
                sender: "me@example.com".to_string(),
                client_secret_path: Some(dir.join("client_secret.json")),
                token_path: Some(dir.join("token.json")),
            },
            ui: Default::default(),
        };

        let session = MailSession::new(
            config.mail.client_secret_path().unwrap(),
            config.mail.token_path().unwrap(),
        );

        let app = App {
            config,
            state: AppState::default(),
            bindings: KeyBindings::new(),
            generator: GeneratorHandle { cmd_tx, event_rx },
            mailer: GmailClient::new(),
            session,
            dirty: true,
        };

        (app, cmd_rx, event_tx)
    }
}
