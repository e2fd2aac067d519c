//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{
    CheckoutStatus, CustomerStatus, FormKind, QuoteStatus, SubmissionStatus, SubscriptionStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRecord {
    pub id: Uuid,
    pub reference: String,
    pub company_name: String,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: QuoteStatus,
    pub total_amount_cents: i64,
    pub currency: String,
    pub item_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub company_name: Option<String>,
    pub status: CustomerStatus,
    pub registered_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterSubscriberRecord {
    pub id: Uuid,
    pub email: String,
    pub status: SubscriptionStatus,
    pub source: Option<String>,
    pub subscribed_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmissionRecord {
    pub id: Uuid,
    pub kind: FormKind,
    pub email: String,
    pub name: Option<String>,
    pub message: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutEventRecord {
    pub id: Uuid,
    pub reference: String,
    pub customer_email: String,
    pub customer_id: Option<Uuid>,
    pub status: CheckoutStatus,
    pub total_amount_cents: i64,
    pub currency: String,
    /// Line items as stored, `[{ "sku", "name", "quantity" }, ...]`.
    pub items: JsonValue,
    pub occurred_at: OffsetDateTime,
}
