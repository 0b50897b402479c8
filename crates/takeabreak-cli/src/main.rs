//! # takeabreak
//!
//! Terminal client for takeabreak sign-in: prints the Google sign-in URL,
//! completes the provider callback, and manages the stored session.

#![deny(unsafe_code)]

mod logging;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use takeabreak_auth::{
    AuthClient, AuthManager, CallbackParams, FileStorage, GuardDecision, SessionStore,
    authorization_url, landing_message, landing_redirect,
};
use takeabreak_settings::TakeabreakSettings;

/// takeabreak sign-in and session management.
#[derive(Parser, Debug)]
#[command(name = "takeabreak", about = "takeabreak sign-in and session management")]
struct Cli {
    /// Settings file (defaults to `~/.takeabreak/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory holding the session file (overrides settings).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Google sign-in URL.
    LoginUrl,
    /// Complete sign-in from the provider redirect query (e.g. `code=abc`).
    Callback {
        /// Query string or full redirect URL.
        query: String,
    },
    /// Show whether a session is stored.
    Status,
    /// Re-fetch and print the signed-in profile.
    Whoami,
    /// Exchange the refresh token for a new token pair.
    Refresh,
    /// Sign out and forget the stored session.
    Logout,
    /// Print what the dashboard guard decides.
    Guard,
}

fn load_settings(path: Option<&PathBuf>) -> Result<TakeabreakSettings> {
    let path = path.cloned().unwrap_or_else(takeabreak_settings::settings_path);
    takeabreak_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Restore the session store and wire it to the backend client.
fn open_manager(settings: &TakeabreakSettings, data_dir: Option<PathBuf>) -> AuthManager {
    let data_dir = data_dir.unwrap_or_else(|| settings.storage.resolve_data_dir());
    let storage = FileStorage::in_dir(&data_dir);
    tracing::debug!(path = %storage.path().display(), "using session storage");
    let store = Arc::new(SessionStore::restore(storage));
    let client = AuthClient::from_settings(&settings.api);
    AuthManager::new(Arc::new(client), store)
}

async fn run(
    command: Command,
    settings: &TakeabreakSettings,
    manager: &AuthManager,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::LoginUrl => {
            let url = authorization_url(&settings.google)
                .context("Failed to build the sign-in URL")?;
            writeln!(out, "{url}")?;
        }
        Command::Callback { query } => {
            let params = CallbackParams::from_query(&query);
            let outcome = manager.callback_controller().run(&params).await;
            writeln!(out, "{}", outcome.target)?;
            if let Some(message) = landing_message(outcome.target.error().map(|e| e.code())) {
                writeln!(out, "{message}")?;
            }
        }
        Command::Status => {
            let session = manager.store().snapshot();
            match session.user() {
                Some(user) if session.is_authenticated() => {
                    writeln!(out, "signed in as {} <{}>", user.full_name, user.email)?;
                }
                _ => writeln!(out, "not signed in")?,
            }
            if let Some(target) = landing_redirect(session.is_authenticated()) {
                writeln!(out, "landing redirects to {target}")?;
            }
        }
        Command::Whoami => {
            let user = manager
                .reload_user()
                .await
                .context("Failed to fetch the current user")?;
            writeln!(out, "Welcome back, {}!", user.first_name())?;
            writeln!(out, "email: {}", user.email)?;
            writeln!(
                out,
                "preferred break: {} min",
                user.preferred_break_duration
            )?;
        }
        Command::Refresh => {
            let _ = manager
                .refresh()
                .await
                .context("Token refresh failed, sign in again")?;
            writeln!(out, "tokens refreshed")?;
        }
        Command::Logout => {
            manager.logout().await;
            writeln!(out, "signed out")?;
        }
        Command::Guard => match manager.route_guard().check() {
            GuardDecision::Allow => writeln!(out, "allow")?,
            GuardDecision::Redirect(target) => writeln!(out, "redirect {target}")?,
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = load_settings(args.settings.as_ref())?;
    logging::init_subscriber(&settings.logging.level);

    let manager = open_manager(&settings, args.data_dir);
    let mut stdout = std::io::stdout().lock();
    run(args.command, &settings, &manager, &mut stdout).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn exec(command: Command, data_dir: &std::path::Path) -> String {
        let settings = TakeabreakSettings::default();
        let manager = open_manager(&settings, Some(data_dir.to_path_buf()));
        let mut out = Vec::new();
        run(command, &settings, &manager, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_parses_callback_query() {
        let cli = Cli::parse_from(["takeabreak", "callback", "code=abc123"]);
        assert!(matches!(cli.command, Command::Callback { ref query } if query == "code=abc123"));
    }

    #[test]
    fn cli_parses_global_data_dir() {
        let cli = Cli::parse_from(["takeabreak", "status", "--data-dir", "/tmp/tab"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tab")));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.api.base_url, "http://localhost:5001");
    }

    #[tokio::test]
    async fn login_url_prints_provider_url() {
        let dir = tempfile::tempdir().unwrap();
        let out = exec(Command::LoginUrl, dir.path()).await;
        assert!(out.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    }

    #[tokio::test]
    async fn status_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let out = exec(Command::Status, dir.path()).await;
        assert_eq!(out, "not signed in\n");
    }

    #[tokio::test]
    async fn guard_without_session_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let out = exec(Command::Guard, dir.path()).await;
        assert_eq!(out, "redirect /\n");
    }

    #[tokio::test]
    async fn denied_callback_prints_landing_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = Command::Callback {
            query: "?error=access_denied".to_string(),
        };
        let out = exec(command, dir.path()).await;
        assert_eq!(
            out,
            "/?error=oauth_denied\nSign-in was cancelled. Please try again.\n"
        );
        assert!(dir.path().join("auth-storage.json").exists());
    }

    #[tokio::test]
    async fn logout_without_session_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let out = exec(Command::Logout, dir.path()).await;
        assert_eq!(out, "signed out\n");
    }

    #[tokio::test]
    async fn whoami_without_session_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TakeabreakSettings::default();
        let manager = open_manager(&settings, Some(dir.path().to_path_buf()));
        let mut out = Vec::new();
        assert!(
            run(Command::Whoami, &settings, &manager, &mut out)
                .await
                .is_err()
        );
    }
}
