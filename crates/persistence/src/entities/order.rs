//! Order entities.

use domain::services::reconcile::ExistingOrderView;
use sqlx::FromRow;

/// Projection of a persisted order onto the audited fields, loaded before a
/// commit to compute the change log.
#[derive(Debug, Clone, FromRow)]
pub struct OrderAuditEntity {
    pub id: i64,
    pub channel_order_no: String,
    pub tracking_no: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_addr_full: Option<String>,
    pub shipping_request: Option<String>,
}

impl OrderAuditEntity {
    pub fn into_view(self) -> ExistingOrderView {
        ExistingOrderView {
            id: self.id,
            channel_order_no: self.channel_order_no,
            tracking_no: self.tracking_no,
            receiver_name: self.receiver_name,
            receiver_phone: self.receiver_phone,
            receiver_addr_full: self.receiver_addr_full,
            shipping_request: self.shipping_request,
        }
    }
}
