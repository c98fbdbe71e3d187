use crate::{
    error::ScrapeError,
    fetch::{FetchConfig, USER_AGENT},
    listing::FilterPolicy,
    notify::{Notifier, StdoutNotifier, TelegramNotifier, TELEGRAM_API},
    sites::SitesConfig,
};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::info;

/// Scrapes Valencia new-build developers and reports the matching
/// promotions to a Telegram chat.
#[derive(Debug, Parser)]
#[command(name = "promo-watch", version)]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Chat receiving the report
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = TELEGRAM_API)]
    pub telegram_api: String,

    /// Comma separated municipalities, accents and case do not matter
    #[arg(
        long,
        env = "PROMO_LOCATIONS",
        value_delimiter = ',',
        default_value = "mislata,valencia,quart de poblet,paterna,manises"
    )]
    pub locations: Vec<String>,

    /// Highest acceptable starting price, in euros
    #[arg(long, env = "PROMO_MAX_PRICE", default_value_t = 270_000)]
    pub max_price: u32,

    #[arg(long, env = "PROMO_MIN_BEDROOMS", default_value_t = 2)]
    pub min_bedrooms: u32,

    /// Per request timeout
    #[arg(long, env = "PROMO_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Pause between two requests
    #[arg(long, env = "PROMO_DELAY_MS", default_value_t = 300)]
    pub delay_ms: u64,

    /// Attempts per request, transient failures only
    #[arg(long, env = "PROMO_FETCH_ATTEMPTS", default_value_t = 1)]
    pub fetch_attempts: u32,

    #[arg(long, env = "PROMO_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// JSON file overriding site URLs and selectors
    #[arg(long, env = "PROMO_SITES_CONFIG")]
    pub sites_config: Option<PathBuf>,

    /// SQLite file of already notified listings, every match is reported
    /// when unset
    #[arg(long, env = "PROMO_SEEN_DB")]
    pub seen_db: Option<PathBuf>,

    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Reads `.env` when present, then the command line and environment.
    pub fn load() -> Args {
        let _ = dotenvy::dotenv();
        Args::parse()
    }

    pub fn policy(&self) -> FilterPolicy {
        FilterPolicy::new(&self.locations, self.max_price, self.min_bedrooms)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            politeness_delay: Duration::from_millis(self.delay_ms),
            attempts: self.fetch_attempts.max(1),
            backoff: Duration::from_millis(self.backoff_ms),
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn sites(&self) -> Result<SitesConfig, ScrapeError> {
        match &self.sites_config {
            Some(path) => {
                info!("Site overrides from {:?}", path);
                SitesConfig::load(path)
            }
            None => Ok(SitesConfig::default()),
        }
    }

    /// Telegram credentials are only needed when the message is really sent.
    pub fn notifier(&self) -> Result<Box<dyn Notifier>, ScrapeError> {
        if self.dry_run {
            return Ok(Box::new(StdoutNotifier));
        }

        let token = non_blank(&self.telegram_token)
            .ok_or(ScrapeError::MissingSetting("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = non_blank(&self.telegram_chat_id)
            .ok_or(ScrapeError::MissingSetting("TELEGRAM_CHAT_ID"))?;

        Ok(Box::new(
            TelegramNotifier::new(token, chat_id)?.with_api_base(&self.telegram_api),
        ))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
