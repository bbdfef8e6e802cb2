//! Ticket engine: lifecycle, message threads, and lookups.
//!
//! Status flow is `open → in_progress → closed`; `closed` is terminal,
//! but terminality is enforced by the handlers, not here — the store
//! accepts any write so that support tooling can correct records.

use super::store::{now_ms, Store};
use crate::core::types::{
    NewTicketMessage, Ticket, TicketDraft, TicketMessage, TicketPatch, TicketStatus,
};

impl Store {
    /// Создаёт тикет. Пустой номер — no-op (None). Уникальность номера
    /// обеспечивает вызывающая сторона: дубликат перезаписывается.
    pub async fn create_ticket(&self, draft: TicketDraft) -> Option<Ticket> {
        if draft.ticket_number.trim().is_empty() {
            log::warn!("Store: create_ticket without ticket number, ignoring");
            return None;
        }
        let mut tables = self.tables.lock().await;
        let ticket = Ticket {
            ticket_number: draft.ticket_number.clone(),
            user_id: draft.user_id,
            username: draft.username,
            name: draft.name,
            plan: draft.plan,
            contact: draft.contact,
            status: draft.status.unwrap_or_default(),
            analysis: draft.analysis,
            created_at: draft.created_at.unwrap_or_else(now_ms),
            closed_at: None,
        };
        tables.tickets.insert(draft.ticket_number, ticket.clone());
        self.persist(&tables).await;
        Some(ticket)
    }

    /// Применяет патч к тикету (merge, не replace). None — тикет не найден.
    pub async fn update_ticket(&self, ticket_number: &str, patch: TicketPatch) -> Option<Ticket> {
        let mut tables = self.tables.lock().await;
        let ticket = tables.tickets.get_mut(ticket_number)?;
        ticket.apply(patch);
        let updated = ticket.clone();
        self.persist(&tables).await;
        Some(updated)
    }

    pub async fn get_ticket(&self, ticket_number: &str) -> Option<Ticket> {
        let tables = self.tables.lock().await;
        tables.tickets.get(ticket_number).cloned()
    }

    /// Добавляет сообщение в тред тикета, создавая тред при первом
    /// сообщении. Пустой номер тикета — no-op (None).
    pub async fn append_ticket_message(&self, message: NewTicketMessage) -> Option<TicketMessage> {
        if message.ticket_number.trim().is_empty() {
            log::warn!("Store: append_ticket_message without ticket number, ignoring");
            return None;
        }
        let mut tables = self.tables.lock().await;
        let entry = TicketMessage {
            direction: message.direction,
            text: message.text,
            created_at: message.created_at.unwrap_or_else(now_ms),
        };
        tables
            .ticket_messages
            .entry(message.ticket_number)
            .or_default()
            .push(entry.clone());
        self.persist(&tables).await;
        Some(entry)
    }

    /// Тред тикета: защитная копия, отсортированная по created_at по
    /// возрастанию. Сортировка стабильная — при равных метках времени
    /// сохраняется порядок вставки; на этом держится экспорт переписки.
    pub async fn get_ticket_messages(&self, ticket_number: &str) -> Vec<TicketMessage> {
        let tables = self.tables.lock().await;
        let mut messages = tables
            .ticket_messages
            .get(ticket_number)
            .cloned()
            .unwrap_or_default();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    /// Тикеты пользователя; пустой список статусов — без фильтра.
    pub async fn get_tickets_by_user(
        &self,
        user_id: i64,
        statuses: &[TicketStatus],
    ) -> Vec<Ticket> {
        let tables = self.tables.lock().await;
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| statuses.is_empty() || statuses.contains(&t.status))
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.created_at);
        tickets
    }

    /// Все тикеты с одним из указанных статусов; пустой список — все.
    pub async fn get_tickets_by_status(&self, statuses: &[TicketStatus]) -> Vec<Ticket> {
        let tables = self.tables.lock().await;
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| statuses.is_empty() || statuses.contains(&t.status))
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.created_at);
        tickets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MessageDirection;
    use crate::storage::Store;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn make_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("store.json");
        let store = Store::open(path.to_str().unwrap()).await;
        (dir, store)
    }

    fn draft(number: &str, user_id: i64) -> TicketDraft {
        TicketDraft {
            ticket_number: number.to_string(),
            user_id,
            ..Default::default()
        }
    }

    fn message(number: &str, text: &str, created_at: i64) -> NewTicketMessage {
        NewTicketMessage {
            ticket_number: number.to_string(),
            direction: MessageDirection::User,
            text: text.to_string(),
            created_at: Some(created_at),
        }
    }

    // ==================== create_ticket() ====================

    #[tokio::test]
    async fn test_create_and_get_ticket() {
        let (_dir, store) = make_store().await;
        let created = store.create_ticket(draft("T1", 42)).await.expect("created");
        assert_eq!(created.status, TicketStatus::Open);

        let fetched = store.get_ticket("T1").await.expect("found");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_ticket_without_number_is_noop() {
        let (_dir, store) = make_store().await;
        store.create_ticket(draft("T1", 42)).await;
        let result = store.create_ticket(draft("", 42)).await;
        assert!(result.is_none());
        // существующие тикеты не тронуты
        assert_eq!(store.get_tickets_by_user(42, &[]).await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_number_overwrites() {
        let (_dir, store) = make_store().await;
        store.create_ticket(draft("T1", 42)).await;
        store.create_ticket(draft("T1", 99)).await;
        let ticket = store.get_ticket("T1").await.expect("found");
        assert_eq!(ticket.user_id, 99);
    }

    // ==================== update_ticket() ====================

    #[tokio::test]
    async fn test_update_unknown_ticket_returns_none() {
        let (_dir, store) = make_store().await;
        let result = store
            .update_ticket("missing", TicketPatch::default())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_ticket_is_idempotent() {
        let (_dir, store) = make_store().await;
        store.create_ticket(draft("T1", 42)).await;
        let patch = TicketPatch {
            status: Some(TicketStatus::InProgress),
            ..Default::default()
        };
        let first = store.update_ticket("T1", patch.clone()).await;
        let second = store.update_ticket("T1", patch).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_preserves_unpatched_fields() {
        let (_dir, store) = make_store().await;
        store
            .create_ticket(TicketDraft {
                contact: Some("ann@example.com".to_string()),
                ..draft("T1", 42)
            })
            .await;
        let updated = store
            .update_ticket(
                "T1",
                TicketPatch {
                    status: Some(TicketStatus::Closed),
                    closed_at: Some(Some(500)),
                    ..Default::default()
                },
            )
            .await
            .expect("updated");
        assert_eq!(updated.contact.as_deref(), Some("ann@example.com"));
        assert_eq!(updated.status, TicketStatus::Closed);
        assert_eq!(updated.closed_at, Some(500));
    }

    // ==================== messages ====================

    #[tokio::test]
    async fn test_messages_sorted_by_created_at() {
        let (_dir, store) = make_store().await;
        store.append_ticket_message(message("T1", "c", 300)).await;
        store.append_ticket_message(message("T1", "a", 100)).await;
        store.append_ticket_message(message("T1", "b", 200)).await;

        let times: Vec<i64> = store
            .get_ticket_messages("T1")
            .await
            .iter()
            .map(|m| m.created_at)
            .collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_order() {
        let (_dir, store) = make_store().await;
        store.append_ticket_message(message("T1", "first", 100)).await;
        store.append_ticket_message(message("T1", "second", 100)).await;
        let texts: Vec<String> = store
            .get_ticket_messages("T1")
            .await
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_messages_returned_as_defensive_copy() {
        let (_dir, store) = make_store().await;
        store.append_ticket_message(message("T1", "a", 100)).await;
        let mut copy = store.get_ticket_messages("T1").await;
        copy.clear();
        assert_eq!(store.get_ticket_messages("T1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_append_without_number_is_noop() {
        let (_dir, store) = make_store().await;
        assert!(store.append_ticket_message(message("", "a", 100)).await.is_none());
    }

    #[tokio::test]
    async fn test_messages_for_unknown_ticket_empty() {
        let (_dir, store) = make_store().await;
        assert!(store.get_ticket_messages("missing").await.is_empty());
    }

    // ==================== filters ====================

    #[tokio::test]
    async fn test_status_filters() {
        let (_dir, store) = make_store().await;
        store.create_ticket(draft("T1", 1)).await;
        store
            .create_ticket(TicketDraft {
                status: Some(TicketStatus::Closed),
                ..draft("T2", 1)
            })
            .await;
        store
            .create_ticket(TicketDraft {
                status: Some(TicketStatus::InProgress),
                ..draft("T3", 2)
            })
            .await;

        // пустой фильтр — все тикеты
        assert_eq!(store.get_tickets_by_status(&[]).await.len(), 3);
        assert_eq!(
            store
                .get_tickets_by_status(&[TicketStatus::Open, TicketStatus::InProgress])
                .await
                .len(),
            2
        );
        assert_eq!(store.get_tickets_by_user(1, &[]).await.len(), 2);
        assert_eq!(
            store
                .get_tickets_by_user(1, &[TicketStatus::Closed])
                .await
                .len(),
            1
        );
        assert!(store.get_tickets_by_user(99, &[]).await.is_empty());
    }
}
