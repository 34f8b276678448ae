//! Кеш схемы зала в Redis.
//!
//! Храним уже сериализованный JSON ответа `GET /shows/{id}/seats`. Источник
//! истины по местам всегда `ShowInventory`: кеш только сглаживает нагрузку на
//! чтение. Ключ содержит версию инвентаря, поэтому бронь или отмена делает
//! старую запись недостижимой, а поздняя запись старой схемы не перекрывает новую.
//! Устаревшие версии уходят по TTL.

use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::{debug, warn};

use crate::models::ShowId;

#[derive(Clone)]
pub struct LayoutCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

pub fn layout_key(show_id: ShowId, version: u64) -> String {
    format!("seats:{}:{}", show_id, version)
}

impl LayoutCache {
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl_seconds })
    }

    // Получить схему из кеша; ошибки Redis считаем промахом
    pub async fn get(&self, show_id: ShowId, version: u64) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(layout_key(show_id, version)).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(show_id, "layout cache read failed: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, show_id: ShowId, version: u64, json: &str) {
        let mut conn = self.conn.clone();
        let res: redis::RedisResult<()> = conn.set_ex(layout_key(show_id, version), json, self.ttl_seconds).await;
        match res {
            Ok(()) => debug!(show_id, version, "cached seat layout"),
            Err(e) => warn!(show_id, "layout cache write failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_per_show_and_version() {
        assert_eq!(layout_key(42, 0), "seats:42:0");
        assert_ne!(layout_key(42, 3), layout_key(42, 4));
    }
}
