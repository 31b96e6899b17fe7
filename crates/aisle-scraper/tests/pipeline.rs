//! End-to-end pipeline tests against local mock servers.
//!
//! These drive the dispatcher through real HTTP fetches (wiremock),
//! covering the priority/early-stop contract, the problematic-retailer
//! skip, block detection, and second-phase renderer gating.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use aisle_core::ProductRow;
use aisle_scraper::{
    Dispatcher, ExternalRenderer, Fetcher, FetcherConfig, FetchStatus, OutcomeStatus, ProxyPool,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_fetcher() -> Arc<Fetcher> {
    let config = FetcherConfig {
        min_body_bytes: 100,
        browser_min_body_bytes: 1000,
        max_attempts: 1,
        inter_strategy_delay: Duration::from_millis(50),
        request_timeout: Duration::from_secs(5),
        browser_headful: false,
    };
    Arc::new(Fetcher::new(config, ProxyPool::new(Vec::new())))
}

/// A product page body carrying a five-element JSON-LD trail, padded
/// past the body-size floor.
fn dairy_jsonld_page() -> String {
    format!(
        r#"<!doctype html><html><head>
<script type="application/ld+json">{{"@type":"BreadcrumbList","itemListElement":[
{{"position":1,"name":"Home"}},
{{"position":2,"name":"Groceries"}},
{{"position":3,"name":"Fresh Food"}},
{{"position":4,"name":"Dairy"}},
{{"position":5,"name":"Milk"}}]}}</script>
</head><body><h1>Whole Milk 2L</h1><div>{}</div></body></html>"#,
        "filler ".repeat(40)
    )
}

fn plain_page(text: &str) -> String {
    format!(
        "<!doctype html><html><body><h1>{text}</h1><div>{}</div></body></html>",
        "filler ".repeat(40)
    )
}

fn row(product_code: &str, links: &[(&str, String)]) -> ProductRow {
    ProductRow {
        product_code: product_code.to_string(),
        store_links: links
            .iter()
            .map(|(r, u)| ((*r).to_string(), u.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

// ---------------------------------------------------------------------------
// Priority order and early stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confident_trail_early_stops_and_skips_lower_priority_retailers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groceries/en-GB/products/00001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dairy_jsonld_page()))
        .expect(1)
        .mount(&server)
        .await;
    // The lower-priority retailer must never be fetched.
    Mock::given(method("GET"))
        .and(path("/asda-product/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain_page("never served")))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(quick_fetcher(), None);
    let product = row(
        "P1",
        &[
            (
                "tesco",
                format!("{}/groceries/en-GB/products/00001", server.uri()),
            ),
            ("asda", format!("{}/asda-product/2", server.uri())),
        ],
    );

    let outcome = dispatcher.process_row(&product).await;

    let best = outcome.best.expect("expected a best outcome");
    assert_eq!(
        best.breadcrumbs,
        vec!["Home", "Fresh Food", "Dairy", "Milk"],
        "Groceries is navigation noise; Home survives at the front"
    );
    assert!(best.score >= 70, "expected a confident score, got {}", best.score);
    assert_eq!(best.method, "jsonld");

    let tesco = outcome.per_retailer.get("tesco").expect("tesco processed");
    assert_eq!(tesco.status, OutcomeStatus::Success);
    assert!(
        !outcome.per_retailer.contains_key("asda"),
        "early stop must prevent the asda fetch"
    );

    // The sink still gets one record per store link.
    let records = Dispatcher::to_records(&product, &outcome);
    assert_eq!(records.len(), 2);
    let asda = records.iter().find(|r| r.store == "asda").unwrap();
    assert_eq!(asda.aisle, "FAILED");
}

// ---------------------------------------------------------------------------
// Problematic retailers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn problematic_retailer_is_skipped_without_network_io() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/amazon/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain_page("never")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/freshmart/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dairy_jsonld_page()))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(quick_fetcher(), None);
    let product = row(
        "P2",
        &[
            ("amazon", format!("{}/amazon/1", server.uri())),
            ("freshmart", format!("{}/freshmart/1", server.uri())),
        ],
    );

    let outcome = dispatcher.process_row(&product).await;

    let amazon = outcome.per_retailer.get("amazon").expect("skip recorded");
    assert_eq!(amazon.status, OutcomeStatus::Skipped);
    assert_eq!(amazon.score, 0);

    let freshmart = outcome
        .per_retailer
        .get("freshmart")
        .expect("freshmart processed");
    assert_eq!(freshmart.status, OutcomeStatus::Success);
}

// ---------------------------------------------------------------------------
// Block detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn block_page_marks_host_blocked_and_fails_the_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/iceland/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain_page(
            "Pardon Our Interruption - unusual activity detected",
        )))
        .mount(&server)
        .await;

    let fetcher = quick_fetcher();
    let dispatcher = Dispatcher::new(Arc::clone(&fetcher), None);
    let product = row("P3", &[("iceland", format!("{}/iceland/1", server.uri()))]);

    let outcome = dispatcher.process_row(&product).await;

    let iceland = outcome.per_retailer.get("iceland").expect("processed");
    assert_eq!(iceland.status, OutcomeStatus::FetchFailed);
    assert_eq!(iceland.score, 0);
    assert!(outcome.best.is_none());
    assert!(
        fetcher.was_blocked("iceland"),
        "block indicator must record the host as blocked"
    );
}

#[tokio::test]
async fn blocked_status_code_writes_a_negative_cache_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coop/9"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = quick_fetcher();
    let url = format!("{}/coop/9", server.uri());
    let result = fetcher.fetch(&url, "coop").await;

    assert_eq!(result.status, FetchStatus::Blocked);
    assert!(fetcher.was_blocked("coop"));
    assert_eq!(fetcher.cache().get(&url), Some(None));
}

// ---------------------------------------------------------------------------
// Phase 2 gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn renderer_runs_only_for_blocked_hosts_and_stops_on_success() {
    let server = MockServer::start().await;
    // Two retailers blocked outright.
    Mock::given(method("GET"))
        .and(path("/iceland/5"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coop/5"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    // One retailer reachable but with no extractable trail — NOT blocked,
    // so it must never consume renderer quota.
    Mock::given(method("GET"))
        .and(path("/freshmart/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain_page("bare product page")))
        .mount(&server)
        .await;
    // The renderer endpoint answers with a confident trail; iceland
    // outranks coop, so exactly one render call happens.
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dairy_jsonld_page()))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = ExternalRenderer::new("test-key", 10)
        .unwrap()
        .with_endpoint(&format!("{}/render", server.uri()));

    let dispatcher = Dispatcher::new(quick_fetcher(), Some(Arc::new(renderer)));
    let product = row(
        "P4",
        &[
            ("iceland", format!("{}/iceland/5", server.uri())),
            ("coop", format!("{}/coop/5", server.uri())),
            ("freshmart", format!("{}/freshmart/5", server.uri())),
        ],
    );

    let outcome = dispatcher.process_row(&product).await;

    let iceland = outcome.per_retailer.get("iceland").expect("processed");
    assert_eq!(iceland.status, OutcomeStatus::Success);
    assert!(iceland.debug.contains("renderer"));
    assert!(iceland.score >= 50);

    // Coop stayed failed: the first render already cleared the bar.
    let coop = outcome.per_retailer.get("coop").expect("processed");
    assert_eq!(coop.status, OutcomeStatus::FetchFailed);

    let freshmart = outcome.per_retailer.get("freshmart").expect("processed");
    assert_eq!(freshmart.status, OutcomeStatus::NoBreadcrumbs);

    assert_eq!(outcome.best.unwrap().retailer, "iceland");
}

#[tokio::test]
async fn renderer_is_not_invoked_when_phase_one_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tesco/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dairy_jsonld_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dairy_jsonld_page()))
        .expect(0)
        .mount(&server)
        .await;

    let renderer = ExternalRenderer::new("test-key", 10)
        .unwrap()
        .with_endpoint(&format!("{}/render", server.uri()));
    let dispatcher = Dispatcher::new(quick_fetcher(), Some(Arc::new(renderer)));
    let product = row("P5", &[("tesco", format!("{}/tesco/7", server.uri()))]);

    let outcome = dispatcher.process_row(&product).await;
    assert!(outcome.best.is_some());
}

// ---------------------------------------------------------------------------
// Concurrent fetches of the same URL
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_fetches_of_one_url_agree_and_cache_stays_stable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/freshmart/same"))
        .respond_with(ResponseTemplate::new(200).set_body_string(plain_page("same page")))
        .mount(&server)
        .await;

    let fetcher = quick_fetcher();
    let url = format!("{}/freshmart/same", server.uri());

    let a = {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        tokio::spawn(async move { fetcher.fetch(&url, "freshmart").await })
    };
    let b = {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        tokio::spawn(async move { fetcher.fetch(&url, "freshmart").await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(a.body, b.body, "both callers must observe the same body");

    // The cache holds exactly one stable entry for the URL.
    assert_eq!(
        fetcher.cache().get(&url),
        Some(a.body),
        "cache entry must match the delivered body"
    );
}

// ---------------------------------------------------------------------------
// Undersized bodies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undersized_body_falls_back_to_url_inference_where_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health-beauty/cough-cold-flu/p/93919"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>tiny</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/morrisons-page/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>tiny</html>"))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(quick_fetcher(), None);

    // Boots URLs carry the taxonomy: the trail comes from the path.
    let product = row(
        "P7",
        &[(
            "boots",
            format!("{}/health-beauty/cough-cold-flu/p/93919", server.uri()),
        )],
    );
    let outcome = dispatcher.process_row(&product).await;
    let boots = outcome.per_retailer.get("boots").expect("processed");
    assert_eq!(boots.status, OutcomeStatus::Success);
    assert_eq!(boots.method, "url_path");
    assert_eq!(boots.breadcrumbs, vec!["Health & Beauty", "Cough, Cold & Flu"]);

    // Morrisons URLs carry no taxonomy: the undersized body is just a
    // failure.
    let product = row(
        "P8",
        &[("morrisons", format!("{}/morrisons-page/1", server.uri()))],
    );
    let outcome = dispatcher.process_row(&product).await;
    let morrisons = outcome.per_retailer.get("morrisons").expect("processed");
    assert_eq!(morrisons.status, OutcomeStatus::FetchFailed);
}

// ---------------------------------------------------------------------------
// Invalid links
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_http_links_error_without_network_and_still_emit_records() {
    let dispatcher = Dispatcher::new(quick_fetcher(), None);
    let product = row("P6", &[("tesco", "ftp://example.com/catalogue".to_string())]);

    let outcome = dispatcher.process_row(&product).await;
    let tesco = outcome.per_retailer.get("tesco").expect("recorded");
    assert_eq!(tesco.status, OutcomeStatus::Error);

    let records = Dispatcher::to_records(&product, &outcome);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].aisle, "FAILED");
}
