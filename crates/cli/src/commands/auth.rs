//! Session commands: `login`, `logout`, `check`.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use hexmart_admin::{AdminClient, AdminConsole, Screen};
use hexmart_core::{Credentials, Email};
use secrecy::{ExposeSecret, SecretString};

use super::{CliError, connect};

/// Build the admin console over the environment's backend.
pub fn console() -> Result<AdminConsole<AdminClient>, CliError> {
    let api = connect()?;
    Ok(AdminConsole::new(Arc::new(AdminClient::new(api))))
}

/// Verify the stored session and land on the product list.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` when there is no session or the backend
/// rejects it.
pub async fn signed_in_console() -> Result<AdminConsole<AdminClient>, CliError> {
    let console = console()?;
    console.check_admin().await;
    if console.view().screen == Screen::Products {
        Ok(console)
    } else {
        Err(CliError::NotSignedIn)
    }
}

/// Sign in and store the session cookie.
pub async fn login(username: &str) -> Result<(), CliError> {
    let username = Email::parse(username)?;
    let password = read_password()?;
    let credentials = Credentials::new(username, password.expose_secret());

    let console = console()?;
    let result = console.login(&credentials).await;

    if let Some(message) = console.view().login_message {
        if message.is_error() {
            tracing::warn!("{}", message.text());
        } else {
            tracing::info!("{}", message.text());
        }
    }
    result?;

    let page = console.products().page;
    tracing::info!(
        "{} products on page {} of {}",
        page.products.len(),
        page.pagination.current_page,
        page.pagination.total_pages
    );
    Ok(())
}

/// Forget the stored session.
pub fn logout() -> Result<(), CliError> {
    console()?.logout()?;
    tracing::info!("Signed out");
    Ok(())
}

/// Report whether the stored session is still accepted.
pub async fn check() -> Result<(), CliError> {
    signed_in_console().await?;
    tracing::info!("Session is valid");
    Ok(())
}

/// `HEXMART_PASSWORD`, or one line from stdin.
fn read_password() -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var("HEXMART_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    tracing::info!("Password:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|source| CliError::Read {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}
