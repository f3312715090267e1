use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound side of the transport.
///
/// Telegram is the only implementation; the dispatcher never sees it, only
/// the transport handlers do.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;
}
