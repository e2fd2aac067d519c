//! Normalized activity timeline projection.
//!
//! Every dashboard source row is carried as one [`ActivitySource`] variant and
//! projected into the common [`ActivityEvent`] shape by a pure mapper, so the
//! merge step in the aggregator stays free of per-source conditionals.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    CheckoutEventRecord, CustomerRecord, FormSubmissionRecord, NewsletterSubscriberRecord,
    QuoteRecord,
};
use crate::domain::types::ActivityKind;

/// Who triggered an event. Email is the only guaranteed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityActor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single entry in the unified activity feed.
///
/// Derived, never persisted. `id` is globally unique within a page because it
/// embeds the source kind prefix alongside the source row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub actor: ActivityActor,
    pub status: String,
    pub data: JsonValue,
}

impl ActivityEvent {
    /// Descending recency with a stable id tie-break, so a fixed row set
    /// always paginates identically across cache refreshes.
    pub fn feed_ordering(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Tagged union over the heterogeneous dashboard sources.
#[derive(Debug, Clone)]
pub enum ActivitySource {
    Customer(CustomerRecord),
    Quote(QuoteRecord),
    Checkout(CheckoutEventRecord),
    Newsletter(NewsletterSubscriberRecord),
    Form(FormSubmissionRecord),
}

impl ActivitySource {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivitySource::Customer(_) => ActivityKind::UserRegistration,
            ActivitySource::Quote(_) => ActivityKind::QuoteRequest,
            ActivitySource::Checkout(_) => ActivityKind::Checkout,
            ActivitySource::Newsletter(_) => ActivityKind::NewsletterSignup,
            ActivitySource::Form(_) => ActivityKind::FormSubmission,
        }
    }

    /// Project the source row into the normalized feed shape.
    pub fn into_event(self) -> ActivityEvent {
        match self {
            ActivitySource::Customer(record) => customer_event(record),
            ActivitySource::Quote(record) => quote_event(record),
            ActivitySource::Checkout(record) => checkout_event(record),
            ActivitySource::Newsletter(record) => newsletter_event(record),
            ActivitySource::Form(record) => form_event(record),
        }
    }
}

fn event_id(kind: ActivityKind, source_id: Uuid) -> String {
    format!("{}:{}", kind.prefix(), source_id)
}

fn customer_event(record: CustomerRecord) -> ActivityEvent {
    ActivityEvent {
        id: event_id(ActivityKind::UserRegistration, record.id),
        kind: ActivityKind::UserRegistration,
        timestamp: record.registered_at,
        actor: ActivityActor {
            id: Some(record.id),
            email: record.email,
            name: record.display_name,
        },
        status: record.status.as_str().to_string(),
        data: json!({
            "company": record.company_name,
        }),
    }
}

fn quote_event(record: QuoteRecord) -> ActivityEvent {
    ActivityEvent {
        id: event_id(ActivityKind::QuoteRequest, record.id),
        kind: ActivityKind::QuoteRequest,
        timestamp: record.created_at,
        actor: ActivityActor {
            id: record.customer_id,
            email: record.contact_email,
            name: record.contact_name,
        },
        status: record.status.as_str().to_string(),
        data: json!({
            "reference": record.reference,
            "amount": record.total_amount_cents,
            "currency": record.currency,
            "items": record.item_count,
            "company": record.company_name,
        }),
    }
}

fn checkout_event(record: CheckoutEventRecord) -> ActivityEvent {
    ActivityEvent {
        id: event_id(ActivityKind::Checkout, record.id),
        kind: ActivityKind::Checkout,
        timestamp: record.occurred_at,
        actor: ActivityActor {
            id: record.customer_id,
            email: record.customer_email,
            name: None,
        },
        status: record.status.as_str().to_string(),
        data: json!({
            "reference": record.reference,
            "amount": record.total_amount_cents,
            "currency": record.currency,
            "items": record.items,
        }),
    }
}

fn newsletter_event(record: NewsletterSubscriberRecord) -> ActivityEvent {
    ActivityEvent {
        id: event_id(ActivityKind::NewsletterSignup, record.id),
        kind: ActivityKind::NewsletterSignup,
        timestamp: record.subscribed_at,
        actor: ActivityActor {
            id: None,
            email: record.email,
            name: None,
        },
        status: record.status.as_str().to_string(),
        data: json!({
            "source": record.source,
        }),
    }
}

fn form_event(record: FormSubmissionRecord) -> ActivityEvent {
    ActivityEvent {
        id: event_id(ActivityKind::FormSubmission, record.id),
        kind: ActivityKind::FormSubmission,
        timestamp: record.submitted_at,
        actor: ActivityActor {
            id: None,
            email: record.email,
            name: record.name,
        },
        status: record.status.as_str().to_string(),
        data: json!({
            "formType": record.kind.as_str(),
            "message": record.message,
        }),
    }
}
