//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "quote_status", rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "customer_status", rename_all = "snake_case")]
pub enum CustomerStatus {
    Pending,
    Verified,
    Suspended,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::Pending => "pending",
            CustomerStatus::Verified => "verified",
            CustomerStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Confirmed,
    Unsubscribed,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Confirmed => "confirmed",
            SubscriptionStatus::Unsubscribed => "unsubscribed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "form_kind", rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Support,
    Callback,
}

impl FormKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Support => "support",
            FormKind::Callback => "callback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    Read,
    Archived,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Read => "read",
            SubmissionStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "checkout_status", rename_all = "snake_case")]
pub enum CheckoutStatus {
    Started,
    Completed,
    Abandoned,
}

impl CheckoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutStatus::Started => "started",
            CheckoutStatus::Completed => "completed",
            CheckoutStatus::Abandoned => "abandoned",
        }
    }
}

/// Wire-level discriminant for normalized activity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    UserRegistration,
    QuoteRequest,
    Checkout,
    NewsletterSignup,
    FormSubmission,
}

impl ActivityKind {
    /// Short prefix used when deriving globally unique activity event ids.
    pub fn prefix(self) -> &'static str {
        match self {
            ActivityKind::UserRegistration => "user",
            ActivityKind::QuoteRequest => "quote",
            ActivityKind::Checkout => "checkout",
            ActivityKind::NewsletterSignup => "newsletter",
            ActivityKind::FormSubmission => "form",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::UserRegistration => "user_registration",
            ActivityKind::QuoteRequest => "quote_request",
            ActivityKind::Checkout => "checkout",
            ActivityKind::NewsletterSignup => "newsletter_signup",
            ActivityKind::FormSubmission => "form_submission",
        }
    }
}
