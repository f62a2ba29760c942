use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use umra_faq_bot::bot::{self, BotState, TelegramGateway};
use umra_faq_bot::completion::CompletionClient;
use umra_faq_bot::config::BotConfig;
use umra_faq_bot::content::ContentStore;
use umra_faq_bot::db::PgLocaleStore;
use umra_faq_bot::locale_store::{JsonFileLocaleStore, LocaleResolver, LocaleStore};
use umra_faq_bot::localization::LocalizationManager;
use umra_faq_bot::navigation::Navigator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Umra FAQ Telegram Bot");

    let config = BotConfig::from_env()?;

    let content = match &config.catalog_path {
        Some(path) => ContentStore::from_path(path)?,
        None => ContentStore::embedded()?,
    };
    info!(topics = content.len(), "Topic catalog loaded");

    let localization = LocalizationManager::new().context("Failed to load UI translations")?;

    let store: Arc<dyn LocaleStore> = match &config.database_url {
        Some(database_url) => {
            info!("Using PostgreSQL for locale preferences");
            Arc::new(PgLocaleStore::connect(database_url).await?)
        }
        None => {
            info!(path = %config.locale_store_path.display(), "Using JSON file for locale preferences");
            Arc::new(JsonFileLocaleStore::open(&config.locale_store_path))
        }
    };
    let resolver = LocaleResolver::new(store);

    // Initialize the bot
    let bot = Bot::new(config.bot_token.clone());

    let bot_username = match config.bot_username.clone() {
        Some(username) => Some(username),
        None => match bot.get_me().await {
            Ok(me) => me.user.username.clone(),
            Err(e) => {
                warn!(error = %e, "Could not resolve bot username, deep links disabled");
                None
            }
        },
    };

    let mut navigator = Navigator::new(
        Arc::new(content),
        Arc::new(localization),
        Arc::new(resolver),
        config.page_size,
    );
    if let Some(username) = &bot_username {
        navigator = navigator.with_bot_username(username.clone());
    }

    let gateway = Arc::new(TelegramGateway::new(bot.clone(), config.outbound_timeout()));
    let mut state = BotState::new(navigator, gateway)
        .with_allowed_chat_id(config.allowed_chat_id)
        .with_outbound_timeout(config.outbound_timeout());
    if let Some(completion) = config.completion.clone() {
        state = state.with_completion(CompletionClient::new(completion)?);
    }
    let state = Arc::new(state);

    info!(
        allowed_chat = ?config.allowed_chat_id,
        bot_username = bot_username.as_deref().unwrap_or("(unknown)"),
        "Bot initialized, starting dispatcher"
    );

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    Ok(())
}
