//! narbox-auth - manage a Narbox session from the command line.
//!
//! Subcommands: `status`, `login`, `refresh`, `logout`. Tokens are stored
//! under the platform data directory; set `NARBOX_STORE=keyring` to use the
//! OS keychain instead, or `NARBOX_STORE=encrypted` (with
//! `NARBOX_STORE_PASSPHRASE`) for an encrypted file.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use narbox_auth_core::{
    AuthApiClient, AuthPhase, Config, EncryptedFileStore, FileStore, KeyringStore,
    SessionController, SessionStore, Storage, TokenRefresher,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage: narbox-auth <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status   Show the current session state");
    eprintln!("  login    Authenticate and store a new session");
    eprintln!("  refresh  Force a refresh-token exchange");
    eprintln!("  logout   Clear the stored session");
}

/// Pick the storage backend from NARBOX_STORE (default: plain file).
fn open_storage() -> Result<Storage> {
    match std::env::var("NARBOX_STORE").ok().as_deref() {
        None | Some("file") => Ok(Storage::new(FileStore::new(Config::data_dir()?)?)),
        Some("keyring") => Ok(Storage::new(KeyringStore::new())),
        Some("encrypted") => {
            let passphrase = std::env::var("NARBOX_STORE_PASSPHRASE")
                .context("NARBOX_STORE=encrypted requires NARBOX_STORE_PASSPHRASE")?;
            Ok(Storage::new(EncryptedFileStore::new(
                Config::data_dir()?,
                &passphrase,
            )?))
        }
        Some(other) => bail!("Unknown NARBOX_STORE value: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    let config = Config::load()?;
    let store = SessionStore::new(open_storage()?);
    let client = AuthApiClient::new(config.api_base_url())?;
    let mut session = SessionController::new(store, client.clone());

    match command {
        Some("status") => status(&mut session),
        Some("login") => login(&mut session, config, &client).await,
        Some("refresh") => refresh(&mut session, &client).await,
        Some("logout") => {
            session.logout();
            println!("Logged out.");
            Ok(())
        }
        _ => {
            print_usage();
            std::process::exit(2);
        }
    }
}

fn status(session: &mut SessionController<AuthApiClient>) -> Result<()> {
    let phase = session.bootstrap();
    let store = session.store();

    let describe = match phase {
        AuthPhase::Unauthenticated => "no session",
        AuthPhase::Authenticated => "authenticated",
        AuthPhase::AccessExpiredRefreshable => "access token expired, refresh possible",
        AuthPhase::Expired => "session expired, login required",
    };
    println!("Session: {describe}");
    println!(
        "Access token:  {}",
        if store.access_token().is_some() { "present" } else { "absent" }
    );
    println!(
        "Refresh token: {}",
        if store.refresh_token().is_some() { "present" } else { "absent" }
    );
    Ok(())
}

async fn login(
    session: &mut SessionController<AuthApiClient>,
    mut config: Config,
    client: &AuthApiClient,
) -> Result<()> {
    let email = match std::env::var("NARBOX_EMAIL") {
        Ok(email) if !email.is_empty() => email,
        _ => match config.last_email.clone() {
            Some(email) => {
                eprintln!("Logging in as {email} (set NARBOX_EMAIL to override)");
                email
            }
            None => prompt_email()?,
        },
    };

    let password = match std::env::var("NARBOX_PASSWORD") {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let grant = client.login(&email, &password).await?;
    session.complete_login(&grant);

    config.last_email = Some(email);
    config.save()?;

    info!("Login succeeded");
    println!("Logged in.");
    Ok(())
}

async fn refresh(
    session: &mut SessionController<AuthApiClient>,
    client: &AuthApiClient,
) -> Result<()> {
    let Some(refresh_token) = session.store().refresh_token() else {
        bail!("No stored refresh token - run `narbox-auth login` first");
    };

    let grant = client
        .refresh(&refresh_token)
        .await
        .context("Refresh failed")?;
    session.complete_login(&grant);
    println!("Session refreshed.");
    Ok(())
}

fn prompt_email() -> Result<String> {
    eprint!("Email: ");
    io::stderr().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}
