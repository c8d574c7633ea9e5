//! Telegram Bot API delivery
//!
//! Sends each rendered report as a single Markdown message through the
//! `sendMessage` method. Failures are returned, not swallowed, so a scheduled
//! run that cannot deliver its report exits with an error.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::alert::{format_history_message, format_scan_message, Notifier};
use crate::config::TelegramConfig;
use crate::scan::{HistoryReport, ScanReport};
use crate::{Result, ScanError};

pub const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MISSING_CREDENTIALS: &str = "Telegram credentials not configured. \
    Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID as env vars or in .env";

/// Body of a `sendMessage` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

/// Notifier that posts reports to one Telegram chat
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    api_base: String,
    http: Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramNotifier {
    /// Fails with [`ScanError::Notify`] when either credential is blank.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            error!("{MISSING_CREDENTIALS}");
            return Err(ScanError::Notify(MISSING_CREDENTIALS.into()));
        }

        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScanError::Notify(format!("HTTP client: {e}")))?;

        Ok(Self {
            bot_token,
            chat_id,
            api_base: API_BASE.to_string(),
            http,
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        Self::new(
            config.bot_token.clone().unwrap_or_default(),
            config.chat_id.clone().unwrap_or_default(),
        )
    }

    /// Target a self-hosted Bot API server instead of api.telegram.org
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    pub fn request<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        }
    }

    /// Post `text` to the chat; any non-2xx answer is an error
    pub fn send_message(&self, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint())
            .json(&self.request(text))
            .send()
            .map_err(|e| {
                // the URL carries the bot token
                let message = format!("Telegram request failed: {}", e.without_url());
                error!("{message}");
                ScanError::Notify(message)
            })?;

        let status = resp.status();
        if status.is_success() {
            info!(chat_id = %self.chat_id, "Telegram message sent");
            return Ok(());
        }

        let body = resp.text().unwrap_or_default();
        error!(status = status.as_u16(), %body, "Telegram API error");
        Err(ScanError::Notify(format!(
            "Telegram API error {}: {body}",
            status.as_u16()
        )))
    }
}

impl Notifier for TelegramNotifier {
    fn notify_scan(&self, report: &ScanReport) -> Result<()> {
        let now = chrono::Local::now().naive_local();
        self.send_message(&format_scan_message(report, now))
    }

    fn notify_history(&self, report: &HistoryReport) -> Result<()> {
        let now = chrono::Local::now().naive_local();
        self.send_message(&format_history_message(report, now))
    }
}
