use serde::Serialize;
use sqlx::FromRow;

pub type UserId = i64;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
}

impl User {
    // Найти активного пользователя по email
    pub async fn find_active_by_email(email: &str, pool: &sqlx::PgPool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, email, password_hash, is_active FROM users WHERE email = $1 AND is_active = true"
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    // Проверить пароль по bcrypt-хешу
    pub fn verify_password(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(user_id = self.user_id, "malformed password hash: {}", e);
                false
            }
        }
    }
}
