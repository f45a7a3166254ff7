use std::sync::Arc;

use fin_onboard::api::{HttpApi, TokenPair, TokenStore};
use fin_onboard::config::{ApiConfig, SessionConfig};
use fin_onboard::store::FileStore;
use fin_onboard::ui::WizardCli;
use fin_onboard::wizard::WizardController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let api_config = ApiConfig::from_env()?;
    let session_config = SessionConfig::from_env();

    // Tokens come from a prior login; the client refreshes transparently
    // from here on.
    let access_token = std::env::var("FIN_ONBOARD_ACCESS_TOKEN").unwrap_or_else(|_| {
        eprintln!("Error: FIN_ONBOARD_ACCESS_TOKEN not set");
        eprintln!("  export FIN_ONBOARD_ACCESS_TOKEN=<token from login>");
        std::process::exit(1);
    });
    let refresh_token = std::env::var("FIN_ONBOARD_REFRESH_TOKEN").ok();
    let user_id: i64 = std::env::var("FIN_ONBOARD_USER_ID")
        .unwrap_or_else(|_| "1".to_string())
        .parse()
        .unwrap_or(1);

    eprintln!("🧭 fin-onboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", api_config.base_url);
    eprintln!("   Sessions: {}", session_config.data_dir.display());
    eprintln!("   Type /back, /skip or /quit at any prompt.\n");

    let tokens = Arc::new(TokenStore::new(TokenPair::new(access_token, refresh_token)));
    let api = Arc::new(HttpApi::new(&api_config, tokens)?);
    let store = Arc::new(FileStore::open(&session_config.data_dir).await?);

    let controller = Arc::new(WizardController::resume_or_start(api, store, user_id).await?);
    WizardCli::new(controller, user_id).run().await
}
