//! Ephemeral per-operator UI modes for the support console.
//!
//! Deliberately kept OUT of the durable store: a mode only marks where a
//! human agent's attention is right now, and losing it on restart is
//! acceptable. Nothing here ever touches the snapshot file.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// Режим составления ответа: оператор пишет в конкретный тикет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMode {
    /// Номер тикета, в который пойдёт следующее сообщение оператора
    pub ticket_number: String,
}

/// Режим поиска по тикетам.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchMode {
    /// Последний введённый запрос, если есть
    pub query: Option<String>,
}

/// Два независимых реестра режимов, ключ — ID оператора.
/// `set_*` перезаписывает значение целиком, без merge.
#[derive(Debug, Default)]
pub struct OperatorModes {
    reply: Mutex<HashMap<i64, ReplyMode>>,
    search: Mutex<HashMap<i64, SearchMode>>,
}

impl OperatorModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reply_mode(&self, operator_id: i64) -> Option<ReplyMode> {
        let modes = self.reply.lock().await;
        modes.get(&operator_id).cloned()
    }

    pub async fn set_reply_mode(&self, operator_id: i64, mode: ReplyMode) {
        let mut modes = self.reply.lock().await;
        modes.insert(operator_id, mode);
    }

    pub async fn clear_reply_mode(&self, operator_id: i64) {
        let mut modes = self.reply.lock().await;
        modes.remove(&operator_id);
    }

    pub async fn search_mode(&self, operator_id: i64) -> Option<SearchMode> {
        let modes = self.search.lock().await;
        modes.get(&operator_id).cloned()
    }

    pub async fn set_search_mode(&self, operator_id: i64, mode: SearchMode) {
        let mut modes = self.search.lock().await;
        modes.insert(operator_id, mode);
    }

    pub async fn clear_search_mode(&self, operator_id: i64) {
        let mut modes = self.search.lock().await;
        modes.remove(&operator_id);
    }
}
