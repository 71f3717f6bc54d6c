// tests/providers_walmart.rs
use std::fs;

use deal_scout::scrape::fetch::StaticFetcher;
use deal_scout::scrape::providers::WalmartAdapter;
use deal_scout::{FilterPolicy, ItemRequest, Platform, SourceAdapter};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

fn adapter(fetcher: StaticFetcher) -> WalmartAdapter {
    WalmartAdapter::with_fetcher(Box::new(fetcher), FilterPolicy::default())
}

#[tokio::test]
async fn embedded_search_state_wins_over_tiles() {
    let walmart = adapter(StaticFetcher::page(fixture("walmart_next_data.html")));
    let results = walmart
        .search(&ItemRequest::new("Instant Pot", 500.0))
        .await
        .unwrap();

    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Instant Pot Duo 7-in-1 Electric Pressure Cooker, 6 Qt",
            "Instant Pot Pro Plus 6 Qt",
            "Instant Pot Duo Mini 3 Qt",
        ]
    );
    assert!(results.iter().all(|r| r.platform == Platform::Walmart));
    assert_eq!(results[0].price, 59.0);
    assert_eq!(
        results[0].link,
        "https://www.walmart.com/ip/Instant-Pot-Duo-7-in-1/10001"
    );
    assert_eq!(results[2].price, 49.0);
    assert_eq!(
        results[2].link,
        "https://www.walmart.com/ip/Instant-Pot-Duo-Mini/10005"
    );
}

#[tokio::test]
async fn embedded_results_respect_price_ceiling() {
    let walmart = adapter(StaticFetcher::page(fixture("walmart_next_data.html")));
    let results = walmart
        .search(&ItemRequest::new("Instant Pot", 100.0))
        .await
        .unwrap();
    let prices: Vec<f64> = results.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![59.0, 49.0]);
}

#[tokio::test]
async fn html_tiles_are_the_fallback() {
    let walmart = adapter(StaticFetcher::page(fixture("walmart_html.html")));
    let results = walmart
        .search(&ItemRequest::new("Instant Pot", 2000.0))
        .await
        .unwrap();

    assert_eq!(results.len(), 2, "got {results:#?}");
    assert_eq!(results[0].title, "Instant Pot Duo 6 Qt");
    assert_eq!(results[0].price, 64.99);
    assert_eq!(
        results[0].link,
        "https://www.walmart.com/ip/Instant-Pot-Duo-6-Qt/20001?classType=REGULAR"
    );
    assert_eq!(results[1].price, 1079.0);
}

#[tokio::test]
async fn robot_page_yields_empty() {
    let walmart = adapter(StaticFetcher::page(fixture("walmart_blocked.html")));
    let results = walmart
        .search(&ItemRequest::new("Instant Pot", 500.0))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn blocked_redirect_yields_empty() {
    let walmart = adapter(StaticFetcher::redirected(
        "https://www.walmart.com/blocked?url=L3NlYXJjaA==",
        fixture("walmart_next_data.html"),
    ));
    let results = walmart
        .search(&ItemRequest::new("Instant Pot", 500.0))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_term_containing_error_is_not_a_block() {
    let walmart = adapter(StaticFetcher::page(fixture("walmart_html.html")));
    let results = walmart
        .search(&ItemRequest::new("terror twilight vinyl", 2000.0))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
}
