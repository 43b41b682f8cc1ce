//! Triage bot - symptom triage over Telegram
//!
//! Users pick symptoms from menus, answer short detail questions and get an
//! AI-written urgency summary plus nearby facilities. Each chat runs its own
//! session state machine.

mod catalog;
mod llm;
mod runtime;
mod settings;
mod shutdown;
mod state_machine;
mod telegram;
mod triage;

use catalog::Catalog;
use llm::{GeminiService, LlmService, LoggingService};
use runtime::SessionManager;
use settings::Settings;
use std::sync::Arc;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage::TriageAdvisor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let settings = Settings::from_env()?;

    // Catalog errors are fatal
    tracing::info!(
        symptoms = %settings.symptoms_path.display(),
        facilities = %settings.facilities_path.display(),
        "Loading triage catalog"
    );
    let catalog = Catalog::load(&settings.symptoms_path, &settings.facilities_path)?;
    telegram::validate_payloads(&catalog)?;
    tracing::info!(
        categories = catalog.categories().len(),
        symptoms = catalog.symptoms().count(),
        "Catalog loaded"
    );

    // Model
    let gemini = GeminiService::new(
        settings.gemini_api_key.clone(),
        &settings.gemini_model,
        settings.gemini_base_url.as_deref(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));
    tracing::info!(model = %llm.model_id(), "Model client initialized");
    let advisor = Arc::new(TriageAdvisor::new(llm, settings.ai_timeout));

    // Transport and sessions
    let client = Arc::new(TelegramClient::new(
        &settings.telegram_token,
        settings.telegram_base_url.as_deref(),
    )?);
    let sessions = SessionManager::new(Arc::new(catalog), advisor, client.clone());

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    telegram::run_polling(client.as_ref(), &sessions, settings.poll_timeout, &cancel).await;

    cancel.cancel();
    signals.await??;
    Ok(())
}
