// Entry point of the letter editor.
//
// **Architecture Overview:**
// - `core/` = Business logic (session, drafts, letters), no I/O details
// - `infra/` = Implementations of core traits (Google APIs, local storage)
// - `ui/` = Widget model, views and the terminal loop
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Hand the root view to the terminal loop

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "ui/ui_layer.rs"]
mod ui;

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Cli, ServiceAccountSource};
use crate::core::drafts::{DraftService, LocalStorage};
use crate::core::letters::LetterService;
use crate::core::session::{IdentityService, SessionHandle, TokenGrant, TokenService};
use crate::infra::google::{
    ConsentPrompt, ConsentPrompter, DeviceCodeGrant, DiscoveryClient, GoogleDriveClient,
    GoogleIdentityProvider, LettersBackendClient, OAuthEndpoints, ServiceAccountGrant,
};
use crate::infra::storage::{InMemoryLocalStorage, JsonLocalStorage};
use crate::ui::editor_view::EditorView;
use crate::ui::notifier::TerminalNotifier;
use crate::ui::root_view::RootView;

fn show_consent_prompt(prompt: &ConsentPrompt) {
    println!();
    println!(
        "To continue, open {} and enter the code {}",
        prompt.verification_url, prompt.user_code
    );
    println!("(the code expires in {} minutes)", prompt.expires_in / 60);
}

fn device_grant(config: &AppConfig, prompter: &ConsentPrompter) -> DeviceCodeGrant {
    DeviceCodeGrant::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        OAuthEndpoints::default(),
        Arc::clone(prompter),
    )
}

async fn drive_token_grant(
    config: &AppConfig,
    prompter: &ConsentPrompter,
) -> anyhow::Result<Box<dyn TokenGrant>> {
    let grant = match &config.service_account {
        Some(ServiceAccountSource::File(path)) => {
            let path = path.to_string_lossy();
            ServiceAccountGrant::from_file(&path)
                .await
                .with_context(|| format!("loading service account key {}", path))?
        }
        Some(ServiceAccountSource::Json(json)) => ServiceAccountGrant::from_json(json)
            .context("parsing GOOGLE_SERVICE_ACCOUNT_JSON")?,
        None => return Ok(Box::new(device_grant(config, prompter))),
    };
    tracing::info!(account = %grant.client_email(), "Drive access uses a service account");
    Ok(Box::new(grant))
}

fn local_storage(config: &AppConfig) -> anyhow::Result<Box<dyn LocalStorage>> {
    if config.ephemeral {
        tracing::info!("Drafts are kept in memory only");
        return Ok(Box::new(InMemoryLocalStorage::new()));
    }

    let path = config.local_storage_path();
    let storage = JsonLocalStorage::open(&path)
        .with_context(|| format!("opening local storage {}", path.display()))?;
    tracing::info!(path = %storage.path().display(), "Drafts are stored on disk");
    Ok(Box::new(storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with the editor screen.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?.with_cli(Cli::parse())?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let session = SessionHandle::new();
    let prompter: ConsentPrompter = Arc::new(show_consent_prompt);

    let identity_service = IdentityService::new(
        Box::new(GoogleIdentityProvider::new(device_grant(&config, &prompter))),
        session.clone(),
    );

    let token_service = TokenService::new(
        Box::new(DiscoveryClient::new(config.google_api_key.clone())),
        drive_token_grant(&config, &prompter).await?,
        session.clone(),
    );

    let letter_service = LetterService::new(
        Arc::new(GoogleDriveClient::new()),
        Arc::new(LettersBackendClient::new(&config.letters_backend_url)),
        session.clone(),
    );

    let drafts = DraftService::new(local_storage(&config)?, config.max_drafts);

    let editor = EditorView::new(
        drafts,
        letter_service,
        token_service,
        session.clone(),
        Arc::new(TerminalNotifier),
        config.timezone,
    );
    let root = RootView::new(identity_service, session, editor);

    ui::terminal::run(root).await?;
    Ok(())
}
