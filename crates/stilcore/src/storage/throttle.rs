//! Free-tier throttling: at most one free analysis per rolling window.
//!
//! A single last-used timestamp per user is enough — the policy is "one
//! free use per rolling window", not a counting quota, so no usage
//! history needs to be retained.

use super::store::Store;
use crate::core::config::free_tier::WINDOW_MS;

impl Store {
    /// Доступен ли бесплатный тариф пользователю в момент `now` (мс).
    /// Всегда true, если пользователь им ещё не пользовался.
    pub async fn can_use_free_tariff(&self, user_id: i64, now: i64) -> bool {
        let tables = self.tables.lock().await;
        match tables.free_tier.get(&user_id) {
            Some(&last_used) => now - last_used >= WINDOW_MS,
            None => true,
        }
    }

    /// Фиксирует использование бесплатного тарифа в момент `now`.
    /// Значение сохраняется как есть, без клэмпа к прежнему.
    pub async fn mark_free_tariff_usage(&self, user_id: i64, now: i64) {
        let mut tables = self.tables.lock().await;
        tables.free_tier.insert(user_id, now);
        self.persist(&tables).await;
    }

    /// Момент, когда бесплатный тариф снова станет доступен.
    /// None — доступен прямо сейчас (или ещё не использовался).
    pub async fn next_free_tariff_at(&self, user_id: i64, now: i64) -> Option<i64> {
        let tables = self.tables.lock().await;
        let &last_used = tables.free_tier.get(&user_id)?;
        if now - last_used >= WINDOW_MS {
            None
        } else {
            Some(last_used + WINDOW_MS)
        }
    }
}
