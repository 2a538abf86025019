use sqlx::Row;

use cotiza_core::chrono::Utc;
use cotiza_core::domain::user::{IssuerProfile, UserId};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<IssuerProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM usuarios WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| IssuerProfile {
            id: UserId(row.get::<String, _>("id")),
            name: row.get::<String, _>("nombre"),
            company: row.get::<Option<String>, _>("empresa"),
            email: row.get::<String, _>("email"),
            logo_url: row.get::<Option<String>, _>("logo_url"),
        }))
    }

    async fn upsert(&self, profile: &IssuerProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO usuarios (id, nombre, empresa, email, logo_url, creado_en)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                nombre = excluded.nombre,
                empresa = excluded.empresa,
                email = excluded.email,
                logo_url = excluded.logo_url
            "#,
        )
        .bind(&profile.id.0)
        .bind(&profile.name)
        .bind(&profile.company)
        .bind(&profile.email)
        .bind(&profile.logo_url)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
