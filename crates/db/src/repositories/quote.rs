use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cotiza_core::domain::item::ItemId;
use cotiza_core::domain::quote::{DocumentKind, LineItem, PipelineStatus, Quote, QuoteId};
use cotiza_core::domain::user::UserId;
use cotiza_core::totals::Totals;

use super::{
    decode_category, decode_decimal, decode_document_kind, decode_recurrence, decode_status,
    decode_timestamp, QuoteRepository, RepositoryError, WriteOutcome,
};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn owner_of(&self, id: &QuoteId) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT usuario_id FROM cotizaciones WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get::<String, _>("usuario_id")))
    }

    async fn guarded_outcome(
        &self,
        id: &QuoteId,
        owner: &UserId,
        rows_affected: u64,
    ) -> Result<WriteOutcome, RepositoryError> {
        if rows_affected > 0 {
            return Ok(WriteOutcome::Updated);
        }
        match self.owner_of(id).await? {
            None => Ok(WriteOutcome::NotFound),
            Some(actual) if actual != owner.0 => Ok(WriteOutcome::Forbidden),
            Some(_) => Ok(WriteOutcome::Conflict),
        }
    }

    async fn lines_for(&self, id: &QuoteId) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM cotizacion_items WHERE cotizacion_id = ? ORDER BY posicion ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_line).collect()
    }
}

fn decode_line(row: &SqliteRow) -> Result<LineItem, RepositoryError> {
    Ok(LineItem {
        item_id: ItemId(row.get::<String, _>("item_id")),
        name: row.get::<String, _>("nombre"),
        sku: row.get::<Option<String>, _>("codigo_sku"),
        quantity: row.get::<i64, _>("cantidad").max(1) as u32,
        unit_price: decode_decimal("precio_unitario", &row.get::<String, _>("precio_unitario"))?,
        extended_price: decode_decimal("precio_total", &row.get::<String, _>("precio_total"))?,
        category: decode_category(&row.get::<String, _>("categoria"))?,
        recurrence: decode_recurrence(row.get::<Option<String>, _>("recurrencia").as_deref())?,
    })
}

fn decode_quote(row: &SqliteRow, lines: Vec<LineItem>) -> Result<Quote, RepositoryError> {
    Ok(Quote {
        id: QuoteId(row.get::<String, _>("id")),
        owner_id: UserId(row.get::<String, _>("usuario_id")),
        client_name: row.get::<String, _>("cliente_nombre"),
        client_email: row.get::<Option<String>, _>("cliente_email"),
        lines,
        tax_rate_percent: decode_decimal("tasa_impuesto", &row.get::<String, _>("tasa_impuesto"))?,
        totals: Totals {
            subtotal: decode_decimal("subtotal", &row.get::<String, _>("subtotal"))?,
            tax_amount: decode_decimal("impuestos", &row.get::<String, _>("impuestos"))?,
            total: decode_decimal("total", &row.get::<String, _>("total"))?,
        },
        notes: row.get::<Option<String>, _>("notas_visibles"),
        legal_terms: row.get::<Option<String>, _>("temas_legales_visibles"),
        exclusions: row.get::<Option<String>, _>("exclusiones_visibles"),
        signature_url: row.get::<Option<String>, _>("firma_url"),
        document_kind: decode_document_kind(&row.get::<String, _>("tipo_documento"))?,
        status: decode_status(&row.get::<String, _>("estado"))?,
        created_at: decode_timestamp("creado_en", &row.get::<String, _>("creado_en"))?,
    })
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cotizaciones (
                id, usuario_id, cliente_nombre, cliente_email, tasa_impuesto,
                subtotal, impuestos, total, notas_visibles, temas_legales_visibles,
                exclusiones_visibles, firma_url, tipo_documento, estado, creado_en
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quote.id.0)
        .bind(&quote.owner_id.0)
        .bind(&quote.client_name)
        .bind(&quote.client_email)
        .bind(quote.tax_rate_percent.to_string())
        .bind(quote.totals.subtotal.to_string())
        .bind(quote.totals.tax_amount.to_string())
        .bind(quote.totals.total.to_string())
        .bind(&quote.notes)
        .bind(&quote.legal_terms)
        .bind(&quote.exclusions)
        .bind(&quote.signature_url)
        .bind(quote.document_kind.as_str())
        .bind(quote.status.as_str())
        .bind(quote.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (position, line) in quote.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cotizacion_items (
                    cotizacion_id, item_id, nombre, codigo_sku, cantidad,
                    precio_unitario, precio_total, categoria, recurrencia, posicion
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&quote.id.0)
            .bind(&line.item_id.0)
            .bind(&line.name)
            .bind(&line.sku)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.to_string())
            .bind(line.extended_price.to_string())
            .bind(line.category.as_str())
            .bind(line.recurrence.map(|unit| unit.as_str()))
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM cotizaciones WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let lines = self.lines_for(id).await?;
                decode_quote(&row, lines).map(Some)
            }
        }
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM cotizaciones WHERE usuario_id = ? ORDER BY creado_en DESC",
        )
        .bind(&owner.0)
        .fetch_all(&self.pool)
        .await?;

        let mut quotes = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = QuoteId(row.get::<String, _>("id"));
            let lines = self.lines_for(&id).await?;
            quotes.push(decode_quote(row, lines)?);
        }
        Ok(quotes)
    }

    async fn update_status(
        &self,
        id: &QuoteId,
        owner: &UserId,
        status: PipelineStatus,
    ) -> Result<WriteOutcome, RepositoryError> {
        // Terminal stages absorb; the guard lives in the statement so the
        // read-then-write cannot interleave with another writer.
        let result = sqlx::query(
            r#"
            UPDATE cotizaciones SET estado = ?
            WHERE id = ? AND usuario_id = ?
              AND (estado NOT IN ('Ganado', 'Perdido') OR estado = ?)
            "#,
        )
        .bind(status.as_str())
        .bind(&id.0)
        .bind(&owner.0)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        self.guarded_outcome(id, owner, result.rows_affected()).await
    }

    async fn convert_document_kind(
        &self,
        id: &QuoteId,
        owner: &UserId,
        kind: DocumentKind,
    ) -> Result<WriteOutcome, RepositoryError> {
        if kind == DocumentKind::Quote {
            return Ok(WriteOutcome::Conflict);
        }

        // One-way: only an unconverted quote matches. Converting implies
        // client acceptance, hence estado jumps to Aprobado.
        let result = sqlx::query(
            r#"
            UPDATE cotizaciones SET tipo_documento = ?, estado = 'Aprobado'
            WHERE id = ? AND usuario_id = ? AND tipo_documento = 'cotizacion'
            "#,
        )
        .bind(kind.as_str())
        .bind(&id.0)
        .bind(&owner.0)
        .execute(&self.pool)
        .await?;

        self.guarded_outcome(id, owner, result.rows_affected()).await
    }

    async fn apply_opened_signal(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        // Monotonic upgrade in one atomic statement: only Enviado moves,
        // and a repeat signal matches zero rows.
        let result = sqlx::query(
            "UPDATE cotizaciones SET estado = 'Leído' WHERE id = ? AND estado = 'Enviado'",
        )
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
