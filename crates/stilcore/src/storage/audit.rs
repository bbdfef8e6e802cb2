//! Audit recorder: append-only history of state-changing actions.

use super::store::{now_ms, Store};
use crate::core::types::{AuditDraft, AuditEntry};

/// Синтезирует ID записи аудита: метка времени плюс случайный суффикс.
/// Вероятность коллизии считается пренебрежимо малой.
fn audit_id(created_at: i64) -> String {
    format!("{}-{:08x}", created_at, rand::random::<u32>())
}

impl Store {
    /// Добавляет запись аудита. Обязателен непустой тег действия,
    /// иначе no-op (None). Записи никогда не изменяются и не удаляются.
    pub async fn append_audit_log(&self, draft: AuditDraft) -> Option<AuditEntry> {
        if draft.action.trim().is_empty() {
            log::warn!("Store: audit entry without action tag, ignoring");
            return None;
        }
        let mut tables = self.tables.lock().await;
        let created_at = draft.created_at.unwrap_or_else(now_ms);
        let entry = AuditEntry {
            id: draft.id.unwrap_or_else(|| audit_id(created_at)),
            user_id: draft.user_id,
            action: draft.action,
            actor: draft.actor.unwrap_or_else(|| "system".to_string()),
            entity_type: draft.entity_type,
            entity_id: draft.entity_id,
            metadata: draft.metadata,
            created_at,
        };
        tables.audit_log.push(entry.clone());
        self.persist(&tables).await;
        Some(entry)
    }

    /// Полный журнал аудита в порядке добавления (копия).
    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        let tables = self.tables.lock().await;
        tables.audit_log.clone()
    }

    /// Записи аудита, связанные с пользователем, в порядке добавления.
    pub async fn audit_log_for_user(&self, user_id: i64) -> Vec<AuditEntry> {
        let tables = self.tables.lock().await;
        tables
            .audit_log
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .cloned()
            .collect()
    }
}
