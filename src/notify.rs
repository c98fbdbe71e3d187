use crate::error::ScrapeError;
use lazy_regex::regex;
use serde::Serialize;
use std::future::Future;
use tokio::time::Duration;
use tracing::{debug, info, warn};

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram rejects longer texts, counted in UTF-16 units.
pub const MESSAGE_LIMIT: usize = 4096;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), ScrapeError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ScrapeError::Notify(e.to_string()))?;
        Ok(TelegramNotifier {
            client,
            api_base: TELEGRAM_API.to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, text: &str, parse_mode: Option<&'static str>) -> Result<(), String> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        // The URL carries the bot token, keep it out of the logs.
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(format!("Telegram answered {}: {}", status, body))
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, text: &str) -> Result<(), ScrapeError> {
        let this = self;
        deliver_chunks(text, MESSAGE_LIMIT, move |chunk, parse_mode| async move {
            this.send(&chunk, parse_mode).await
        })
        .await
    }
}

/// Prints the message instead of sending it.
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn deliver(&self, text: &str) -> Result<(), ScrapeError> {
        println!("{}", text);
        Ok(())
    }
}

/// Sends every chunk as Markdown. A rejected chunk gets one more try as
/// plain text, a second failure aborts the delivery.
async fn deliver_chunks<F, Fut>(text: &str, limit: usize, mut send: F) -> Result<(), ScrapeError>
where
    F: FnMut(String, Option<&'static str>) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    let chunks = split_message(text, limit);
    let total = chunks.len();

    for (i, chunk) in chunks.into_iter().enumerate() {
        if let Err(e) = send(chunk.clone(), Some("Markdown")).await {
            warn!(
                "Chunk {}/{} rejected: {}, retrying as plain text",
                i + 1,
                total,
                e
            );
            send(strip_markdown(&chunk), None)
                .await
                .map_err(ScrapeError::Notify)?;
        }
        debug!("Chunk {}/{} delivered", i + 1, total);
    }

    info!("Message delivered in {} chunk(s)", total);
    Ok(())
}

/// Telegram measures message length in UTF-16 code units, so every emoji
/// outside the basic plane counts twice.
fn units(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Splits `text` into pieces of at most `limit` UTF-16 units, breaking at
/// line ends. Only a line longer than `limit` is cut in the middle.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    let mut chunks = vec![];
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = units(line);
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            let mut piece = String::new();
            let mut piece_len = 0;
            for c in line.chars() {
                if piece_len + c.len_utf16() > limit {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
                piece.push(c);
                piece_len += c.len_utf16();
            }
            chunks.push(piece);
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .map(|c| c.trim_end_matches('\n').to_string())
        .filter(|c| !c.trim().is_empty())
        .collect()
}

/// Legacy Markdown to plain text: `[text](url)` becomes `text (url)` and the
/// `*`, `_` and `` ` `` markers go away. Link targets are left untouched.
pub fn strip_markdown(text: &str) -> String {
    let unmark = |s: &str| s.replace(['*', '_', '`'], "");

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in regex!(r"\[([^\]]*)\]\(([^)\s]*)\)").captures_iter(text) {
        let Some(link) = caps.get(0) else { continue };
        out.push_str(&unmark(&text[last..link.start()]));
        out.push_str(&unmark(&caps[1]));
        out.push_str(" (");
        out.push_str(&caps[2]);
        out.push(')');
        last = link.end();
    }
    out.push_str(&unmark(&text[last..]));
    out
}
