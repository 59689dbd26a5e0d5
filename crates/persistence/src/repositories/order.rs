//! Order repository: audit-projection loading and the tracking-protected
//! two-phase upsert.
//!
//! The commit writes the change log and both upsert phases inside one
//! transaction; any failure rolls back everything. Phase one (rows carrying
//! a tracking number) includes `tracking_no` in its update column list;
//! phase two (rows without) omits it, so a re-upload without a tracking
//! number never erases a previously recorded one.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use domain::models::{NewChangeLog, StandardOrderRecord};
use domain::services::reconcile::ExistingOrderView;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::entities::OrderAuditEntity;

/// Rows per bulk statement. Well under the Postgres bind-parameter ceiling
/// at 29 columns per row.
const CHUNK_SIZE: usize = 500;

/// Update column list shared by both upsert phases.
const COMMON_UPDATE_COLUMNS: &[&str] = &[
    "product_id",
    "product_title",
    "option_title",
    "quantity",
    "buyer_name",
    "buyer_phone",
    "buyer_postcode",
    "buyer_addr_full",
    "buyer_addr1",
    "buyer_addr2",
    "receiver_name",
    "receiver_phone",
    "receiver_postcode",
    "receiver_addr_full",
    "receiver_addr1",
    "receiver_addr2",
    "shipping_request",
    "customer_note",
    "admin_memo",
    "ordered_at",
    "status_src",
    "raw_payload",
    "raw_meta",
    "raw_hash",
    "updated_at",
];

/// Repository for order database operations.
#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the audited-field projections of every persisted order whose
    /// order number appears in `order_nos`, keyed by order number.
    ///
    /// Multi-product orders share an order number; the last row wins, which
    /// matches how the change log has always been computed.
    pub async fn load_audit_views(
        &self,
        channel_id: i64,
        order_nos: &[String],
    ) -> Result<HashMap<String, ExistingOrderView>, sqlx::Error> {
        if order_nos.is_empty() {
            return Ok(HashMap::new());
        }

        let entities = sqlx::query_as::<_, OrderAuditEntity>(
            r#"
            SELECT id, channel_order_no, tracking_no,
                   receiver_name, receiver_phone, receiver_addr_full,
                   shipping_request
            FROM orders
            WHERE channel_id = $1 AND channel_order_no = ANY($2)
            ORDER BY id
            "#,
        )
        .bind(channel_id)
        .bind(order_nos)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities
            .into_iter()
            .map(|e| (e.channel_order_no.clone(), e.into_view()))
            .collect())
    }

    /// Write the change log and upsert both row partitions in one
    /// transaction. Returns the number of rows affected by the upserts.
    pub async fn commit_batch(
        &self,
        channel_id: i64,
        with_tracking: &[&StandardOrderRecord],
        without_tracking: &[&StandardOrderRecord],
        changes: &[NewChangeLog],
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for chunk in changes.chunks(1000) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO order_change_logs \
                 (order_id, upload_id, source, field, old_value, new_value, changed_by, created_at) ",
            );
            qb.push_values(chunk, |mut b, change| {
                b.push_bind(change.order_id)
                    .push_bind(change.upload_id)
                    .push_bind(&change.source)
                    .push_bind(&change.field)
                    .push_bind(&change.old_value)
                    .push_bind(&change.new_value)
                    .push_bind(change.changed_by)
                    .push_bind(now);
            });
            qb.build().execute(&mut *tx).await?;
        }

        let mut affected = 0u64;

        let tracked = dedupe_last_wins(with_tracking);
        for chunk in tracked.chunks(CHUNK_SIZE) {
            affected += upsert_chunk(&mut tx, channel_id, chunk, true, now).await?;
        }
        let untracked = dedupe_last_wins(without_tracking);
        for chunk in untracked.chunks(CHUNK_SIZE) {
            affected += upsert_chunk(&mut tx, channel_id, chunk, false, now).await?;
        }

        tx.commit().await?;
        Ok(affected)
    }
}

/// Collapse duplicate (order number, product) keys within one batch, keeping
/// the last occurrence. A single INSERT may not touch the same conflict
/// target twice.
fn dedupe_last_wins<'a>(records: &[&'a StandardOrderRecord]) -> Vec<&'a StandardOrderRecord> {
    let mut by_key: HashMap<(String, i64), usize> = HashMap::new();
    for (pos, record) in records.iter().enumerate() {
        by_key.insert(
            (record.channel_order_no.clone(), record.product_id.unwrap_or(0)),
            pos,
        );
    }
    let mut positions: Vec<usize> = by_key.into_values().collect();
    positions.sort_unstable();
    positions.into_iter().map(|pos| records[pos]).collect()
}

async fn upsert_chunk(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    channel_id: i64,
    records: &[&StandardOrderRecord],
    update_tracking: bool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO orders \
         (channel_id, channel_order_no, product_id, product_title, option_title, quantity, \
          tracking_no, buyer_name, buyer_phone, buyer_postcode, buyer_addr_full, buyer_addr1, \
          buyer_addr2, receiver_name, receiver_phone, receiver_postcode, receiver_addr_full, \
          receiver_addr1, receiver_addr2, shipping_request, customer_note, admin_memo, \
          ordered_at, status_src, raw_payload, raw_meta, raw_hash, created_at, updated_at) ",
    );

    qb.push_values(records, |mut b, record| {
        let raw = record.raw.as_ref();
        let ordered_at: NaiveDateTime = record.ordered_at.unwrap_or_else(|| now.naive_utc());
        b.push_bind(channel_id)
            .push_bind(&record.channel_order_no)
            .push_bind(record.product_id)
            .push_bind(opt(&record.product_title))
            .push_bind(opt(&record.option_title))
            .push_bind(record.quantity)
            .push_bind(record.tracking_no.as_deref())
            .push_bind(opt(&record.buyer_name))
            .push_bind(opt(&record.buyer_phone))
            .push_bind(opt(&record.buyer_postcode))
            .push_bind(opt(&record.buyer_addr_full))
            .push_bind(opt(&record.buyer_addr1))
            .push_bind(opt(&record.buyer_addr2))
            .push_bind(opt(&record.receiver_name))
            .push_bind(opt(&record.receiver_phone))
            .push_bind(opt(&record.receiver_postcode))
            .push_bind(opt(&record.receiver_addr_full))
            .push_bind(opt(&record.receiver_addr1))
            .push_bind(opt(&record.receiver_addr2))
            .push_bind(opt(&record.shipping_request))
            .push_bind(opt(&record.customer_note))
            .push_bind(opt(&record.admin_memo))
            .push_bind(ordered_at)
            .push_bind(opt(&record.status_src))
            .push_bind(raw.map(|r| r.payload.clone()))
            .push_bind(raw.map(|r| serde_json::json!(r.meta)))
            .push_bind(raw.map(|r| r.sha256.clone()))
            .push_bind(now)
            .push_bind(now);
    });

    qb.push(" ON CONFLICT (channel_id, channel_order_no, COALESCE(product_id, 0)) DO UPDATE SET ");

    let mut first = true;
    for column in COMMON_UPDATE_COLUMNS {
        if !first {
            qb.push(", ");
        }
        qb.push(format!("{column} = EXCLUDED.{column}"));
        first = false;
    }
    if update_tracking {
        qb.push(", tracking_no = EXCLUDED.tracking_no");
    }

    let result = qb.build().execute(&mut **tx).await?;
    Ok(result.rows_affected())
}

fn opt(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_no: &str, product_id: Option<i64>) -> StandardOrderRecord {
        StandardOrderRecord {
            channel_order_no: order_no.into(),
            product_id,
            ..Default::default()
        }
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let a = record("A-1", Some(1));
        let b = record("A-1", Some(1));
        let c = record("A-2", Some(1));
        let refs = vec![&a, &b, &c];
        let deduped = dedupe_last_wins(&refs);
        assert_eq!(deduped.len(), 2);
        assert!(std::ptr::eq(deduped[0], &b));
    }

    #[test]
    fn test_dedupe_treats_missing_product_as_zero() {
        let a = record("A-1", None);
        let b = record("A-1", Some(0));
        let refs = vec![&a, &b];
        assert_eq!(dedupe_last_wins(&refs).len(), 1);
    }

    #[test]
    fn test_opt_maps_empty_to_none() {
        assert_eq!(opt(""), None);
        assert_eq!(opt("x"), Some("x"));
    }

    #[test]
    fn test_common_update_columns_never_touch_tracking() {
        // the whole point of the two-phase upsert: only rows that carry a
        // tracking number may update the column
        assert!(!COMMON_UPDATE_COLUMNS.contains(&"tracking_no"));
        assert!(COMMON_UPDATE_COLUMNS.contains(&"receiver_addr_full"));
        assert!(COMMON_UPDATE_COLUMNS.contains(&"updated_at"));
        assert!(!COMMON_UPDATE_COLUMNS.contains(&"created_at"));
    }
}
