//! Collection repository for database operations.
//!
//! One table per collection kind, unique on `(owner_id, product_id)`. Queries
//! are built at runtime because the table name depends on the kind.

use chrono::{DateTime, Utc};
use gemcase_core::{CollectionKind, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::RepositoryError;
use crate::sync::{CollectionRow, RemoteStore};

const CART_COLUMNS: &str = "owner_id, product_id, product_name, product_price, product_image, \
                            product_description, product_material, quantity";
const WISHLIST_COLUMNS: &str = "owner_id, product_id, product_name, product_price, \
                                product_image, product_description, product_material";

const fn columns(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Cart => CART_COLUMNS,
        CollectionKind::Wishlist => WISHLIST_COLUMNS,
    }
}

/// Repository for owner-scoped collection rows.
///
/// Holds its own pool handle so it can be moved into background writes.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of rows `owner` has in one collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_owner(
        &self,
        kind: CollectionKind,
        owner: UserId,
    ) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE owner_id = $1", kind.table());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// When `owner`'s collection last changed, if it has any rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn last_updated_for_owner(
        &self,
        kind: CollectionKind,
        owner: UserId,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let sql = format!(
            "SELECT MAX(updated_at) FROM {} WHERE owner_id = $1",
            kind.table()
        );
        let updated: Option<DateTime<Utc>> = sqlx::query_scalar(&sql)
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }
}

fn push_row(
    mut values: sqlx::query_builder::Separated<'_, '_, Postgres, &'static str>,
    kind: CollectionKind,
    row: CollectionRow,
) -> Result<(), RepositoryError> {
    values
        .push_bind(row.owner_id)
        .push_bind(row.product_id.clone())
        .push_bind(row.product_name)
        .push_bind(row.product_price)
        .push_bind(row.product_image)
        .push_bind(row.product_description)
        .push_bind(row.product_material);
    if kind.has_quantity() {
        let quantity = row.quantity.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "cart row for product {} has no quantity",
                row.product_id
            ))
        })?;
        values.push_bind(quantity);
    }
    Ok(())
}

impl RemoteStore for CollectionRepository {
    #[instrument(skip(self), fields(table = kind.table()))]
    async fn load_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
    ) -> Result<Vec<CollectionRow>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE owner_id = $1 ORDER BY id",
            columns(kind),
            kind.table()
        );
        let rows = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self, rows), fields(table = kind.table(), count = rows.len()))]
    async fn replace_rows(
        &self,
        kind: CollectionKind,
        owner: UserId,
        rows: Vec<CollectionRow>,
    ) -> Result<(), RepositoryError> {
        // Two statements outside a transaction: concurrent replaces for the
        // same owner are last-writer-wins.
        let delete = format!("DELETE FROM {} WHERE owner_id = $1", kind.table());
        sqlx::query(&delete)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if rows.is_empty() {
            return Ok(());
        }

        let mut insert: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) ", kind.table(), columns(kind)));
        let mut invalid = None;
        insert.push_values(rows, |values, row| {
            if let Err(e) = push_row(values, kind, row)
                && invalid.is_none()
            {
                invalid = Some(e);
            }
        });
        if let Some(e) = invalid {
            return Err(e);
        }

        insert.build().execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self, row), fields(table = kind.table(), product_id = %row.product_id))]
    async fn upsert_row(
        &self,
        kind: CollectionKind,
        row: CollectionRow,
    ) -> Result<(), RepositoryError> {
        let mut upsert: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) ", kind.table(), columns(kind)));
        let mut invalid = None;
        upsert.push_values(std::iter::once(row), |values, row| {
            if let Err(e) = push_row(values, kind, row)
                && invalid.is_none()
            {
                invalid = Some(e);
            }
        });
        if let Some(e) = invalid {
            return Err(e);
        }

        upsert.push(
            " ON CONFLICT (owner_id, product_id) DO UPDATE SET \
             product_name = EXCLUDED.product_name, \
             product_price = EXCLUDED.product_price, \
             product_image = EXCLUDED.product_image, \
             product_description = EXCLUDED.product_description, \
             product_material = EXCLUDED.product_material, ",
        );
        if kind.has_quantity() {
            upsert.push("quantity = EXCLUDED.quantity, ");
        }
        upsert.push("updated_at = NOW()");

        upsert.build().execute(&self.pool).await?;
        Ok(())
    }
}
