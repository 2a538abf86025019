use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cotiza_core::domain::item::{CatalogItem, ItemId};
use cotiza_core::domain::user::UserId;

use super::{
    decode_category, decode_decimal, decode_recurrence, decode_timestamp, ItemRepository,
    RepositoryError, WriteOutcome,
};
use crate::DbPool;

pub struct SqlItemRepository {
    pool: DbPool,
}

impl SqlItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &ItemId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM items WHERE id = ?")
            .bind(&id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

fn decode_item(row: &SqliteRow) -> Result<CatalogItem, RepositoryError> {
    Ok(CatalogItem {
        id: ItemId(row.get::<String, _>("id")),
        owner_id: UserId(row.get::<String, _>("usuario_id")),
        name: row.get::<String, _>("nombre"),
        sku: row.get::<Option<String>, _>("codigo_sku"),
        description: row.get::<String, _>("descripcion"),
        base_price: decode_decimal("precio_base", &row.get::<String, _>("precio_base"))?,
        category: decode_category(&row.get::<String, _>("categoria"))?,
        recurrence: decode_recurrence(row.get::<Option<String>, _>("recurrencia").as_deref())?,
        internal_notes: row.get::<Option<String>, _>("notas_internas"),
        created_at: decode_timestamp("creado_en", &row.get::<String, _>("creado_en"))?,
    })
}

#[async_trait::async_trait]
impl ItemRepository for SqlItemRepository {
    async fn create(&self, item: &CatalogItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id, usuario_id, nombre, codigo_sku, descripcion, precio_base,
                categoria, recurrencia, notas_internas, creado_en
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id.0)
        .bind(&item.owner_id.0)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.base_price.to_string())
        .bind(item.category.as_str())
        .bind(item.recurrence.map(|unit| unit.as_str()))
        .bind(&item.internal_notes)
        .bind(item.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: &CatalogItem) -> Result<WriteOutcome, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                nombre = ?, codigo_sku = ?, descripcion = ?, precio_base = ?,
                categoria = ?, recurrencia = ?, notas_internas = ?
            WHERE id = ? AND usuario_id = ?
            "#,
        )
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.base_price.to_string())
        .bind(item.category.as_str())
        .bind(item.recurrence.map(|unit| unit.as_str()))
        .bind(&item.internal_notes)
        .bind(&item.id.0)
        .bind(&item.owner_id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Updated);
        }
        if self.exists(&item.id).await? {
            Ok(WriteOutcome::Forbidden)
        } else {
            Ok(WriteOutcome::NotFound)
        }
    }

    async fn delete(&self, id: &ItemId, owner: &UserId) -> Result<WriteOutcome, RepositoryError> {
        // No cascade: quote lines keep their denormalized copy and their
        // weak item_id reference is allowed to dangle.
        let result = sqlx::query("DELETE FROM items WHERE id = ? AND usuario_id = ?")
            .bind(&id.0)
            .bind(&owner.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Updated);
        }
        if self.exists(id).await? {
            Ok(WriteOutcome::Forbidden)
        } else {
            Ok(WriteOutcome::NotFound)
        }
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_item).transpose()
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<CatalogItem>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM items WHERE usuario_id = ? ORDER BY creado_en DESC")
            .bind(&owner.0)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_item).collect()
    }
}
