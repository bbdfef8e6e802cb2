use serde::{Deserialize, Serialize};

/// Тарифный план пользователя.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Plan {
    /// Тариф ещё не выбран
    #[default]
    None,
    Free,
    Pro,
    Premium,
}

/// Текущий шаг диалога с пользователем.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStep {
    #[default]
    Idle,
    AwaitingConsent,
    ChoosingPlan,
    AwaitingPayment,
    AwaitingPhoto,
    AwaitingContact,
    AwaitingSupportMessage,
}

/// Тип контакта, оставленного для связи с поддержкой.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactType {
    Phone,
    Email,
    Telegram,
}

/// Статус тикета поддержки: open → in_progress → closed.
///
/// `closed` — терминальный статус. Сам store не запрещает запись поверх
/// закрытого тикета; терминальность обеспечивают обработчики.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

/// Направление сообщения в треде тикета.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageDirection {
    User,
    Support,
    System,
}

/// Состояние диалога пользователя. Ровно одна запись на user id;
/// отсутствие записи эквивалентно состоянию по умолчанию.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Текущий шаг диалога
    pub step: ConversationStep,
    /// Выбранный тарифный план
    pub plan: Plan,
    /// Оплачен ли выбранный план
    pub paid: bool,
    /// Согласие на обработку персональных данных
    pub privacy_accepted: bool,
    /// Согласие с офертой
    pub offer_terms_accepted: bool,
    /// Контакт для связи с поддержкой (телефон/email/telegram)
    pub support_contact: Option<String>,
    /// Тип оставленного контакта
    pub support_contact_type: Option<ContactType>,
    /// Пользователь находится в режиме диалога с поддержкой
    pub support_mode: bool,
    /// Пользователь ждет ответа поддержки по открытому тикету
    pub support_awaiting_reply: bool,
    /// Номер последнего тикета пользователя
    pub last_ticket: Option<String>,
    /// ID последнего показанного уведомления
    pub last_notice_id: Option<i64>,
    /// Принято ли персональное предложение
    pub offer_accepted: bool,
}

/// Частичное обновление [`ConversationState`]: перезаписываются только
/// заполненные поля. Для nullable-полей внешний `Option` означает
/// «поле передано», внутренний — новое значение (включая сброс в None).
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub step: Option<ConversationStep>,
    pub plan: Option<Plan>,
    pub paid: Option<bool>,
    pub privacy_accepted: Option<bool>,
    pub offer_terms_accepted: Option<bool>,
    pub support_contact: Option<Option<String>>,
    pub support_contact_type: Option<Option<ContactType>>,
    pub support_mode: Option<bool>,
    pub support_awaiting_reply: Option<bool>,
    pub last_ticket: Option<Option<String>>,
    pub last_notice_id: Option<Option<i64>>,
    pub offer_accepted: Option<bool>,
}

impl ConversationState {
    /// Применяет патч: только заполненные поля перезаписывают текущие.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(step) = patch.step {
            self.step = step;
        }
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(paid) = patch.paid {
            self.paid = paid;
        }
        if let Some(privacy_accepted) = patch.privacy_accepted {
            self.privacy_accepted = privacy_accepted;
        }
        if let Some(offer_terms_accepted) = patch.offer_terms_accepted {
            self.offer_terms_accepted = offer_terms_accepted;
        }
        if let Some(support_contact) = patch.support_contact {
            self.support_contact = support_contact;
        }
        if let Some(support_contact_type) = patch.support_contact_type {
            self.support_contact_type = support_contact_type;
        }
        if let Some(support_mode) = patch.support_mode {
            self.support_mode = support_mode;
        }
        if let Some(support_awaiting_reply) = patch.support_awaiting_reply {
            self.support_awaiting_reply = support_awaiting_reply;
        }
        if let Some(last_ticket) = patch.last_ticket {
            self.last_ticket = last_ticket;
        }
        if let Some(last_notice_id) = patch.last_notice_id {
            self.last_notice_id = last_notice_id;
        }
        if let Some(offer_accepted) = patch.offer_accepted {
            self.offer_accepted = offer_accepted;
        }
    }

    /// Можно ли принимать фото: оба согласия должны быть даны.
    pub fn can_accept_photo(&self) -> bool {
        self.privacy_accepted && self.offer_terms_accepted
    }
}

/// Структурированный результат vision-модели, сохраняемый как есть.
/// Store не валидирует форму ответа модели.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    /// Определённая форма лица
    pub face_shape: String,
    /// Список рекомендаций стилиста
    pub recommendations: Vec<String>,
}

/// Тикет поддержки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Уникальный номер тикета (выдаётся вызывающей стороной)
    pub ticket_number: String,
    /// Telegram ID пользователя
    pub user_id: i64,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    /// Отображаемое имя пользователя
    pub name: Option<String>,
    /// Тарифный план на момент обращения
    pub plan: Plan,
    /// Контакт для связи
    pub contact: Option<String>,
    /// Статус тикета
    pub status: TicketStatus,
    /// Результат анализа фото, если тикет связан с разбором стиля
    pub analysis: Option<StyleAnalysis>,
    /// Время создания (мс с эпохи)
    pub created_at: i64,
    /// Время закрытия (мс с эпохи)
    pub closed_at: Option<i64>,
}

/// Данные для создания тикета. Номер обязателен: пустой номер — no-op.
#[derive(Debug, Clone, Default)]
pub struct TicketDraft {
    pub ticket_number: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
    pub plan: Plan,
    pub contact: Option<String>,
    /// Статус; по умолчанию `open`
    pub status: Option<TicketStatus>,
    pub analysis: Option<StyleAnalysis>,
    /// Время создания; по умолчанию текущее
    pub created_at: Option<i64>,
}

/// Частичное обновление тикета. Номер тикета неизменяем.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub username: Option<Option<String>>,
    pub name: Option<Option<String>>,
    pub plan: Option<Plan>,
    pub contact: Option<Option<String>>,
    pub status: Option<TicketStatus>,
    pub analysis: Option<Option<StyleAnalysis>>,
    pub closed_at: Option<Option<i64>>,
}

impl Ticket {
    /// Применяет патч: только заполненные поля перезаписывают текущие.
    pub fn apply(&mut self, patch: TicketPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(plan) = patch.plan {
            self.plan = plan;
        }
        if let Some(contact) = patch.contact {
            self.contact = contact;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(analysis) = patch.analysis {
            self.analysis = analysis;
        }
        if let Some(closed_at) = patch.closed_at {
            self.closed_at = closed_at;
        }
    }
}

/// Сообщение в треде тикета.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    /// Кто отправил: пользователь, поддержка или система
    pub direction: MessageDirection,
    /// Текст сообщения
    pub text: String,
    /// Время отправки (мс с эпохи)
    pub created_at: i64,
}

/// Данные для добавления сообщения в тред тикета.
#[derive(Debug, Clone)]
pub struct NewTicketMessage {
    pub ticket_number: String,
    pub direction: MessageDirection,
    pub text: String,
    /// Время отправки; по умолчанию текущее
    pub created_at: Option<i64>,
}

/// Запись в справочнике пользователей.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    /// Отображаемое имя
    pub name: Option<String>,
    /// Время первой записи (мс с эпохи)
    pub created_at: i64,
    /// Время мягкого удаления (мс с эпохи)
    pub deleted_at: Option<i64>,
}

/// Данные для upsert пользователя: незаполненные поля сохраняют
/// прежние значения, первая запись фиксирует created_at.
#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    pub internal_user_id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Платёж. Хранится целиком: повторный upsert с тем же payment id
/// полностью заменяет запись.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Внешний ID платежа (выдаётся платёжным провайдером)
    pub payment_id: String,
    /// Telegram ID пользователя
    pub user_id: i64,
    /// Оплаченный тарифный план
    pub plan: Plan,
    /// Сумма в минорных единицах валюты
    pub amount: i64,
    /// Код валюты, например "RUB"
    pub currency: String,
    /// Статус платежа у провайдера (as is)
    pub status: String,
    /// Время платежа (мс с эпохи)
    pub created_at: i64,
}

/// Запись аудита. Неизменяема после добавления.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Синтетический ID: `{timestamp_ms}-{случайный hex-суффикс}`
    pub id: String,
    /// Telegram ID пользователя, если действие связано с пользователем
    pub user_id: Option<i64>,
    /// Тег действия, например "ticket_created"
    pub action: String,
    /// Кто выполнил действие; по умолчанию "system"
    pub actor: String,
    /// Тип затронутой сущности, например "ticket"
    pub entity_type: Option<String>,
    /// ID затронутой сущности
    pub entity_id: Option<String>,
    /// Произвольные метаданные
    pub metadata: Option<serde_json::Value>,
    /// Время записи (мс с эпохи)
    pub created_at: i64,
}

/// Данные для записи аудита. Обязателен только тег действия.
#[derive(Debug, Clone, Default)]
pub struct AuditDraft {
    /// ID; если не задан, будет синтезирован
    pub id: Option<String>,
    pub user_id: Option<i64>,
    pub action: String,
    /// Актор; по умолчанию "system"
    pub actor: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Время записи; по умолчанию текущее
    pub created_at: Option<i64>,
}
