//! Canonical per-row order representation after mapping and normalization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::raw_row::RowMeta;

/// Field keys the pipeline understands when building a record from mapped
/// values. Channels map their columns onto these keys.
pub mod field_keys {
    pub const CHANNEL_ORDER_NO: &str = "channel_order_no";
    pub const PRODUCT_TITLE: &str = "product_title";
    pub const OPTION_TITLE: &str = "option_title";
    pub const QUANTITY: &str = "quantity";
    pub const TRACKING_NO: &str = "tracking_no";

    pub const BUYER_NAME: &str = "buyer_name";
    pub const BUYER_PHONE: &str = "buyer_phone";
    pub const BUYER_POSTCODE: &str = "buyer_postcode";
    pub const BUYER_ADDR_FULL: &str = "buyer_addr_full";
    pub const BUYER_ADDR1: &str = "buyer_addr1";
    pub const BUYER_ADDR2: &str = "buyer_addr2";

    pub const RECEIVER_NAME: &str = "receiver_name";
    pub const RECEIVER_PHONE: &str = "receiver_phone";
    pub const RECEIVER_POSTCODE: &str = "receiver_postcode";
    pub const RECEIVER_ADDR_FULL: &str = "receiver_addr_full";
    pub const RECEIVER_ADDR1: &str = "receiver_addr1";
    pub const RECEIVER_ADDR2: &str = "receiver_addr2";

    pub const SHIPPING_REQUEST: &str = "shipping_request";
    /// Some channels label the shipping request a delivery message; absorbed
    /// into `shipping_request` when the primary key is unmapped.
    pub const DELIVERY_MESSAGE: &str = "delivery_message";
    pub const CUSTOMER_NOTE: &str = "customer_note";
    pub const ADMIN_MEMO: &str = "admin_memo";

    pub const ORDERED_AT: &str = "ordered_at";
    pub const STATUS_SRC: &str = "status_src";
}

/// The verbatim raw-row triple carried for audit.
///
/// Every record produced by the pipeline carries one; a record without it is
/// structurally defective and is rejected at commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAudit {
    /// JSON serialization of the source row's column → text map.
    pub payload: String,
    pub meta: RowMeta,
    /// SHA-256 hex of `payload`.
    pub sha256: String,
}

/// Canonical order record for one source row.
///
/// Text fields use the empty string for "not provided" (the mapping engine
/// never fails, it yields empty strings); they are stored as NULLs at the
/// persistence boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardOrderRecord {
    pub channel_code: String,
    pub channel_order_no: String,

    /// Resolved catalog product, when matching succeeded.
    pub product_id: Option<i64>,
    pub product_title: String,
    pub option_title: String,

    /// Always ≥ 1.
    pub quantity: i32,
    pub tracking_no: Option<String>,

    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_postcode: String,
    pub buyer_addr_full: String,
    pub buyer_addr1: String,
    pub buyer_addr2: String,

    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_postcode: String,
    pub receiver_addr_full: String,
    pub receiver_addr1: String,
    pub receiver_addr2: String,

    pub shipping_request: String,
    pub customer_note: String,
    pub admin_memo: String,

    /// None when the source carried no parseable timestamp; the commit step
    /// substitutes the processing timestamp.
    pub ordered_at: Option<NaiveDateTime>,

    /// Source status text, wording preserved.
    pub status_src: String,

    pub raw: Option<RawAudit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty() {
        let rec = StandardOrderRecord::default();
        assert!(rec.channel_order_no.is_empty());
        assert_eq!(rec.product_id, None);
        assert!(rec.raw.is_none());
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let rec = StandardOrderRecord {
            channel_code: "coupang".into(),
            channel_order_no: "C-100".into(),
            quantity: 2,
            tracking_no: Some("1234567890".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: StandardOrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.channel_order_no, "C-100");
        assert_eq!(back.quantity, 2);
        assert_eq!(back.tracking_no.as_deref(), Some("1234567890"));
    }
}
