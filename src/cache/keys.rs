//! Cache key construction.
//!
//! Keys are a pure function of the logical query parameters, so identical
//! requests always hit the same slot and distinct requests never collide.
//! Invalidation happens by entity prefix, never by individual page key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::application::pagination::PageParams;
use crate::application::repos::{
    CustomerQueryFilter, FormQueryFilter, NewsletterQueryFilter, QuoteQueryFilter,
};

pub const ACTIVITIES_PREFIX: &str = "dashboard:activities";
pub const QUOTES_PREFIX: &str = "dashboard:quotes";
pub const USERS_PREFIX: &str = "dashboard:users";
pub const NEWSLETTER_PREFIX: &str = "dashboard:newsletter";
pub const FORMS_PREFIX: &str = "dashboard:forms";
pub const STATS_KEY: &str = "dashboard:stats";

pub fn activities_key(page: PageParams) -> String {
    format!("{ACTIVITIES_PREFIX}:{}:{}", page.offset(), page.limit())
}

pub fn quotes_key(page: PageParams, filter: &QuoteQueryFilter) -> String {
    let status = filter.status.map(|s| s.as_str()).unwrap_or("-");
    format!(
        "{QUOTES_PREFIX}:{}:{}:{}:{:016x}",
        page.offset(),
        page.limit(),
        status,
        hash_value(&filter.search)
    )
}

pub fn users_key(page: PageParams, filter: &CustomerQueryFilter) -> String {
    let status = filter.status.map(|s| s.as_str()).unwrap_or("-");
    format!(
        "{USERS_PREFIX}:{}:{}:{}",
        page.offset(),
        page.limit(),
        status
    )
}

pub fn newsletter_key(page: PageParams, filter: &NewsletterQueryFilter) -> String {
    let status = filter.status.map(|s| s.as_str()).unwrap_or("-");
    format!(
        "{NEWSLETTER_PREFIX}:{}:{}:{}",
        page.offset(),
        page.limit(),
        status
    )
}

pub fn forms_key(page: PageParams, filter: &FormQueryFilter) -> String {
    let status = filter.status.map(|s| s.as_str()).unwrap_or("-");
    let kind = filter.kind.map(|k| k.as_str()).unwrap_or("-");
    format!(
        "{FORMS_PREFIX}:{}:{}:{}:{}",
        page.offset(),
        page.limit(),
        status,
        kind
    )
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{QuoteStatus, SubmissionStatus};

    #[test]
    fn identical_parameters_produce_identical_keys() {
        let page = PageParams::new(20, 20);
        let filter = QuoteQueryFilter {
            status: Some(QuoteStatus::Pending),
            search: Some("nordwerk".to_string()),
        };
        assert_eq!(quotes_key(page, &filter), quotes_key(page, &filter));
    }

    #[test]
    fn distinct_filters_never_share_keys() {
        let page = PageParams::new(0, 20);
        let unfiltered = FormQueryFilter::default();
        let unread = FormQueryFilter {
            status: Some(SubmissionStatus::New),
            kind: None,
        };
        assert_ne!(forms_key(page, &unfiltered), forms_key(page, &unread));
    }

    #[test]
    fn distinct_pages_never_share_keys() {
        assert_ne!(
            activities_key(PageParams::new(0, 20)),
            activities_key(PageParams::new(20, 20))
        );
    }

    #[test]
    fn entity_keys_sit_under_their_prefix() {
        let page = PageParams::new(0, 20);
        assert!(forms_key(page, &FormQueryFilter::default()).starts_with(FORMS_PREFIX));
        assert!(quotes_key(page, &QuoteQueryFilter::default()).starts_with(QUOTES_PREFIX));
        // Prefixes are disjoint, so invalidating one entity leaves the rest.
        assert!(!forms_key(page, &FormQueryFilter::default()).starts_with(QUOTES_PREFIX));
    }
}
