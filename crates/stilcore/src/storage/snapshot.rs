//! Snapshot codec: the on-disk image of every store table.
//!
//! Keyed tables are serialized as sorted `(key, value)` pair lists rather
//! than native maps — JSON objects only take string keys, and pair lists
//! round-trip numeric user ids without string coercion on load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::store::Tables;
use crate::core::types::{
    AuditEntry, ConversationState, Payment, Ticket, TicketMessage, UserRecord,
};
use crate::core::StoreResult;

/// Версия формата снапшота; увеличивается при несовместимых изменениях.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub state: Vec<(i64, ConversationState)>,
    #[serde(default)]
    pub free_tier: Vec<(i64, i64)>,
    #[serde(default)]
    pub tickets: Vec<(String, Ticket)>,
    #[serde(default)]
    pub ticket_messages: Vec<(String, Vec<TicketMessage>)>,
    #[serde(default)]
    pub users: Vec<(i64, UserRecord)>,
    #[serde(default)]
    pub payments: Vec<(String, Payment)>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
}

impl Snapshot {
    pub fn from_tables(tables: &Tables) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state: sorted_pairs(&tables.state),
            free_tier: sorted_pairs(&tables.free_tier),
            tickets: sorted_pairs(&tables.tickets),
            ticket_messages: sorted_pairs(&tables.ticket_messages),
            users: sorted_pairs(&tables.users),
            payments: sorted_pairs(&tables.payments),
            audit_log: tables.audit_log.clone(),
        }
    }

    pub fn into_tables(self) -> Tables {
        Tables {
            state: self.state.into_iter().collect(),
            free_tier: self.free_tier.into_iter().collect(),
            tickets: self.tickets.into_iter().collect(),
            ticket_messages: self.ticket_messages.into_iter().collect(),
            users: self.users.into_iter().collect(),
            payments: self.payments.into_iter().collect(),
            audit_log: self.audit_log,
        }
    }
}

/// Пары (ключ, значение), отсортированные по ключу — файл снапшота
/// детерминирован и удобно диффается.
fn sorted_pairs<K: Ord + Clone, V: Clone>(map: &HashMap<K, V>) -> Vec<(K, V)> {
    let mut pairs: Vec<(K, V)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

pub(crate) fn encode(tables: &Tables) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&Snapshot::from_tables(tables))?)
}

pub(crate) fn decode(bytes: &[u8]) -> StoreResult<Tables> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    if snapshot.version > SNAPSHOT_VERSION {
        log::warn!(
            "Snapshot version {} is newer than supported {}, loading anyway",
            snapshot.version,
            SNAPSHOT_VERSION
        );
    }
    Ok(snapshot.into_tables())
}
