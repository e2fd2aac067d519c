mod common;

use std::sync::Arc;

use vetrina::application::pagination::PageParams;
use vetrina::domain::types::ActivityKind;

use common::{SeedRepo, at_minutes, checkout_at, customer_at, feed_service, quote_at};

fn seed_25_quotes_5_users() -> Arc<SeedRepo> {
    let mut repo = SeedRepo::default();
    for i in 0..25 {
        repo.quotes.push(quote_at(at_minutes(i)));
    }
    // Registrations land after every quote, so they lead the feed.
    for i in 0..5 {
        repo.customers.push(customer_at(at_minutes(100 + i)));
    }
    Arc::new(repo)
}

#[tokio::test]
async fn first_page_holds_the_twenty_most_recent_events() {
    let service = feed_service(seed_25_quotes_5_users());

    let page = service.activities(PageParams::new(0, 20)).await;

    assert_eq!(page.data.len(), 20);
    assert_eq!(page.total, 30);
    assert!(page.has_more);

    // Five registrations first, then quotes, newest first throughout.
    for event in &page.data[..5] {
        assert_eq!(event.kind, ActivityKind::UserRegistration);
    }
    for event in &page.data[5..] {
        assert_eq!(event.kind, ActivityKind::QuoteRequest);
    }
    for pair in page.data.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[tokio::test]
async fn second_page_drains_the_remainder() {
    let service = feed_service(seed_25_quotes_5_users());

    let page = service.activities(PageParams::new(20, 20)).await;

    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total, 30);
    assert!(!page.has_more);
    for event in &page.data {
        assert_eq!(event.kind, ActivityKind::QuoteRequest);
    }
}

#[tokio::test]
async fn pagination_is_stable_across_repeated_reads() {
    let service = feed_service(seed_25_quotes_5_users());

    let first = service.activities(PageParams::new(10, 10)).await;
    let second = service.activities(PageParams::new(10, 10)).await;

    let ids: Vec<_> = first.data.iter().map(|e| e.id.clone()).collect();
    let ids_again: Vec<_> = second.data.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, ids_again);
}

#[tokio::test]
async fn simultaneous_events_tie_break_on_id() {
    let mut repo = SeedRepo::default();
    let at = at_minutes(0);
    for _ in 0..4 {
        repo.checkouts.push(checkout_at(at));
    }
    let service = feed_service(Arc::new(repo));

    let page = service.activities(PageParams::new(0, 10)).await;

    assert_eq!(page.data.len(), 4);
    for pair in page.data.windows(2) {
        assert_eq!(pair[0].timestamp, pair[1].timestamp);
        assert!(pair[0].id < pair[1].id);
    }
}

#[tokio::test]
async fn broken_source_degrades_to_a_partial_feed() {
    let mut repo = SeedRepo::default();
    for i in 0..3 {
        repo.quotes.push(quote_at(at_minutes(i)));
        repo.customers.push(customer_at(at_minutes(10 + i)));
    }
    repo.fail_quotes = true;
    let service = feed_service(Arc::new(repo));

    let page = service.activities(PageParams::new(0, 20)).await;

    // Quotes drop out of both the rows and the total; users still arrive.
    assert_eq!(page.data.len(), 3);
    assert_eq!(page.total, 3);
    assert!(page.data.iter().all(|e| e.kind == ActivityKind::UserRegistration));
}

#[tokio::test]
async fn offset_past_the_end_yields_an_empty_page() {
    let service = feed_service(seed_25_quotes_5_users());

    let page = service.activities(PageParams::new(90, 20)).await;

    assert!(page.data.is_empty());
    assert_eq!(page.total, 30);
    assert!(!page.has_more);
}
