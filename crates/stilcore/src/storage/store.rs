//! The durable store: persistence driver and record tables.
//!
//! All seven tables live behind one lock and are written out as a single
//! snapshot after every mutation. Handlers for different chat users
//! interleave arbitrarily between their store calls, so each operation is
//! one atomic critical section: lock, mutate, persist, release. In-memory
//! state stays authoritative when a disk write fails; the failure is
//! logged and the process keeps serving from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::snapshot;
use crate::core::types::{
    AuditEntry, ConversationState, ConversationStep, Payment, StatePatch, Ticket, TicketMessage,
    UserRecord, UserUpsert,
};
use crate::core::StoreResult;

/// Текущее время в миллисекундах с эпохи.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Все таблицы store — одна единица персистентности.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub state: HashMap<i64, ConversationState>,
    pub free_tier: HashMap<i64, i64>,
    pub tickets: HashMap<String, Ticket>,
    pub ticket_messages: HashMap<String, Vec<TicketMessage>>,
    pub users: HashMap<i64, UserRecord>,
    pub payments: HashMap<String, Payment>,
    pub audit_log: Vec<AuditEntry>,
}

/// Durable state store бота.
///
/// Внедряется в обработчики как `Arc<Store>`; все операции идут через
/// единый мьютекс, поэтому два последовательных вызова одного пользователя
/// всегда видят эффекты друг друга.
pub struct Store {
    path: PathBuf,
    pub(crate) tables: Mutex<Tables>,
}

impl Store {
    /// Открывает store, загружая снапшот с диска.
    ///
    /// Отсутствующий файл — не ошибка (пустой store). Повреждённый файл
    /// логируется, store стартует пустым вместо падения процесса.
    pub async fn open(path: &str) -> Self {
        let expanded = shellexpand::tilde(path).into_owned();
        let path = PathBuf::from(expanded);
        let tables = Self::load(&path).await;
        Self {
            path,
            tables: Mutex::new(tables),
        }
    }

    async fn load(path: &Path) -> Tables {
        match fs::read(path).await {
            Ok(bytes) => match snapshot::decode(&bytes) {
                Ok(tables) => {
                    log::info!("Store: loaded snapshot from {}", path.display());
                    tables
                }
                Err(e) => {
                    log::warn!(
                        "Store: malformed snapshot {}, starting empty: {}",
                        path.display(),
                        e
                    );
                    Tables::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => {
                log::warn!(
                    "Store: failed to read snapshot {}, starting empty: {}",
                    path.display(),
                    e
                );
                Tables::default()
            }
        }
    }

    /// Путь к файлу снапшота.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Записывает снапшот на диск. Ошибка записи логируется и
    /// проглатывается: состояние в памяти остаётся авторитетным.
    pub(crate) async fn persist(&self, tables: &Tables) {
        if let Err(e) = self.try_persist(tables).await {
            log::error!(
                "Store: failed to persist snapshot to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    async fn try_persist(&self, tables: &Tables) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let bytes = snapshot::encode(tables)?;
        fs::write(&self.path, bytes).await?;
        Ok(())
    }

    // ==================== conversation state ====================

    /// Возвращает состояние диалога, лениво создавая запись по умолчанию
    /// при первом обращении.
    pub async fn get_state(&self, user_id: i64) -> ConversationState {
        let mut tables = self.tables.lock().await;
        if let Some(state) = tables.state.get(&user_id) {
            return state.clone();
        }
        let state = ConversationState::default();
        tables.state.insert(user_id, state.clone());
        self.persist(&tables).await;
        state
    }

    /// Применяет патч к состоянию диалога (merge, не replace) и
    /// возвращает запись после слияния.
    pub async fn set_state(&self, user_id: i64, patch: StatePatch) -> ConversationState {
        let mut tables = self.tables.lock().await;
        let state = tables.state.entry(user_id).or_default();
        state.apply(patch);
        let updated = state.clone();
        self.persist(&tables).await;
        updated
    }

    /// Полностью удаляет состояние диалога пользователя (запрос на
    /// стирание данных). Тикеты, платежи и аудит сохраняются — история
    /// поддержки остаётся для отчётности.
    pub async fn reset_user_data(&self, user_id: i64) -> bool {
        let mut tables = self.tables.lock().await;
        let removed = tables.state.remove(&user_id).is_some();
        if removed {
            self.persist(&tables).await;
        }
        removed
    }

    /// Проставляет оба согласия и возвращает диалог к шагу idle одной
    /// персистентной записью.
    pub async fn accept_all_consents(&self, user_id: i64) -> ConversationState {
        let mut tables = self.tables.lock().await;
        let state = tables.state.entry(user_id).or_default();
        state.privacy_accepted = true;
        state.offer_terms_accepted = true;
        state.step = ConversationStep::Idle;
        let updated = state.clone();
        self.persist(&tables).await;
        updated
    }

    /// Чистый предикат: можно ли принимать фото от пользователя.
    /// Не создаёт запись и ничего не пишет на диск.
    pub async fn can_accept_photo(&self, user_id: i64) -> bool {
        let tables = self.tables.lock().await;
        tables
            .state
            .get(&user_id)
            .map(ConversationState::can_accept_photo)
            .unwrap_or(false)
    }

    // ==================== user directory ====================

    /// Upsert пользователя: заполненные поля перезаписывают прежние,
    /// незаполненные сохраняются; первая запись фиксирует created_at.
    pub async fn upsert_user(&self, input: UserUpsert) -> UserRecord {
        let mut tables = self.tables.lock().await;
        let record = tables
            .users
            .entry(input.internal_user_id)
            .or_insert_with(|| UserRecord {
                username: None,
                name: None,
                created_at: now_ms(),
                deleted_at: None,
            });
        if let Some(username) = input.username {
            record.username = Some(username);
        }
        if let Some(name) = input.name {
            record.name = Some(name);
        }
        let updated = record.clone();
        self.persist(&tables).await;
        updated
    }

    pub async fn get_user(&self, user_id: i64) -> Option<UserRecord> {
        let tables = self.tables.lock().await;
        tables.users.get(&user_id).cloned()
    }

    /// Мягкое удаление: проставляет deleted_at, запись остаётся.
    pub async fn mark_user_deleted(&self, user_id: i64) -> Option<UserRecord> {
        let mut tables = self.tables.lock().await;
        let record = tables.users.get_mut(&user_id)?;
        record.deleted_at = Some(now_ms());
        let updated = record.clone();
        self.persist(&tables).await;
        Some(updated)
    }

    // ==================== payments ====================

    /// Сохраняет платёж целиком (replace, не merge). Пустой payment id —
    /// no-op: вызывающая сторона обязана проверить возврат.
    pub async fn upsert_payment(&self, payment: Payment) -> Option<Payment> {
        if payment.payment_id.trim().is_empty() {
            log::warn!("Store: upsert_payment without payment id, ignoring");
            return None;
        }
        let mut tables = self.tables.lock().await;
        tables
            .payments
            .insert(payment.payment_id.clone(), payment.clone());
        self.persist(&tables).await;
        Some(payment)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Option<Payment> {
        let tables = self.tables.lock().await;
        tables.payments.get(payment_id).cloned()
    }

    /// Все платежи пользователя, от старых к новым.
    pub async fn get_payments_by_user(&self, user_id: i64) -> Vec<Payment> {
        let tables = self.tables.lock().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        payments
    }
}
