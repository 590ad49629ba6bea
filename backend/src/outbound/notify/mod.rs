//! Buyer notification adapters.

mod telegram;

pub use telegram::{DEFAULT_BOT_API_BASE_URL, TelegramNotifier};
