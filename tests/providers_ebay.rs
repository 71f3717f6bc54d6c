// tests/providers_ebay.rs
use std::fs;
use std::sync::Arc;

use deal_scout::scrape::fetch::StaticFetcher;
use deal_scout::scrape::providers::EbayAdapter;
use deal_scout::{FetchSettings, FilterPolicy, ItemRequest, Platform, SourceAdapter};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

fn adapter(body: String) -> (EbayAdapter, Arc<StaticFetcher>) {
    let fetcher = Arc::new(StaticFetcher::page(body));
    let adapter = EbayAdapter::with_fetcher(Box::new(fetcher.clone()), FilterPolicy::default());
    (adapter, fetcher)
}

#[tokio::test]
async fn keeps_only_cheap_well_rated_listings() {
    let (ebay, fetcher) = adapter(fixture("ebay_search.html"));
    let item = ItemRequest::new("RTX 3080", 500.0).with_min_seller_rating(95.0);

    let results = ebay.search(&item).await.expect("search never errors");

    assert_eq!(results.len(), 2, "got {results:#?}");
    let first = &results[0];
    assert_eq!(first.platform, Platform::Ebay);
    assert_eq!(first.search_term, "RTX 3080");
    assert_eq!(first.title, "NVIDIA GeForce RTX 3080 Founders Edition 10GB");
    assert_eq!(first.price, 450.0);
    assert_eq!(first.seller_rating, Some(97.2));
    assert_eq!(first.link, "https://www.ebay.com/itm/111");

    // Price range "$420.00 to $470.00" counts at its lower bound.
    assert_eq!(results[1].price, 420.0);
    assert_eq!(results[1].title, "ASUS TUF RTX 3080 OC & Box");
    assert_eq!(results[1].link, "https://www.ebay.com/itm/444");

    assert_eq!(
        fetcher.requested(),
        vec!["https://www.ebay.com/sch/i.html?_sacat=0&LH_BIN=1&rt=1&_nkw=RTX+3080".to_string()]
    );
}

#[tokio::test]
async fn without_rating_minimum_low_rated_seller_passes() {
    let (ebay, _) = adapter(fixture("ebay_search.html"));
    let item = ItemRequest::new("RTX 3080", 500.0);

    let results = ebay.search(&item).await.unwrap();
    let prices: Vec<f64> = results.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![450.0, 480.0, 420.0]);
}

#[tokio::test]
async fn placeholder_sponsored_and_priceless_cards_never_surface() {
    let (ebay, _) = adapter(fixture("ebay_search.html"));
    let item = ItemRequest::new("RTX 3080", 10_000.0);

    let results = ebay.search(&item).await.unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.title != "Shop on eBay"));
    assert!(results.iter().all(|r| !r.title.contains("promoted")));
    assert!(results.iter().all(|r| !r.title.contains("price on request")));
}

#[tokio::test]
async fn block_page_yields_empty() {
    let (ebay, _) = adapter(fixture("ebay_blocked.html"));
    let results = ebay
        .search(&ItemRequest::new("RTX 3080", 500.0))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn garbage_and_empty_pages_yield_empty() {
    for body in ["", "<html><body><p>No results</p></body></html>", "{\"not\": \"html\"}"] {
        let (ebay, _) = adapter(body.to_string());
        let results = ebay
            .search(&ItemRequest::new("RTX 3080", 500.0))
            .await
            .unwrap();
        assert!(results.is_empty(), "body {body:?} produced {results:?}");
    }
}

#[tokio::test]
async fn relevance_policy_drops_off_topic_titles() {
    let fetcher = StaticFetcher::page(fixture("ebay_search.html"));
    let ebay = EbayAdapter::with_fetcher(
        Box::new(fetcher),
        FilterPolicy {
            min_title_relevance: 90,
        },
    );
    let results = ebay
        .search(&ItemRequest::new("Founders Edition", 10_000.0))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].link, "https://www.ebay.com/itm/111");
}

#[tokio::test]
async fn seller_rating_comes_from_cards_even_with_json_ld_present() {
    let (ebay, _) = adapter(fixture("ebay_search_ldjson.html"));
    let item = ItemRequest::new("RTX 3080", 500.0).with_min_seller_rating(95.0);

    let results = ebay.search(&item).await.unwrap();
    assert_eq!(results.len(), 1, "got {results:#?}");
    assert_eq!(results[0].price, 450.0);
    assert_eq!(results[0].seller_rating, Some(97.0));
    assert_eq!(results[0].link, "https://www.ebay.com/itm/111");
}

#[test]
fn app_id_does_not_stop_the_adapter_from_building() {
    let settings = FetchSettings {
        ebay_app_id: Some("my-app-id".into()),
        ..FetchSettings::default()
    };
    assert!(EbayAdapter::new(settings, FilterPolicy::default()).is_ok());
}
