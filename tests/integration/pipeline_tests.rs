//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to serve a small LandWatch-shaped result set
//! and run the full pipeline end-to-end into a temporary directory.

use chrono::NaiveDate;
use landwatch_harvest::config::{parse_config, FetcherConfig};
use landwatch_harvest::crawler::{harvest, Harvester};
use landwatch_harvest::output::{DirectorySink, ListingSink};
use landwatch_harvest::{Config, HarvestError};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/Oklahoma_land_for_sale/Osage_County/Land";

fn listing(pid: u64, title: &str, acres: &str) -> String {
    format!(
        r#"<div class="result">
            <div class="propName"><a href="/Osage-County-Oklahoma-Land-for-sale/pid/{pid}">{title}</a></div>
            <div class="propSize">{acres}</div>
            <div class="description">  Listing {pid} </div>
            <a class="officename" href="/default.aspx?ct=r&amp;type=146,{pid}">Osage Realty</a>
            <div class="propertyAgent">
                Listed by
                Signature Partner
            </div>
        </div>"#
    )
}

fn listings(pids: std::ops::Range<u64>) -> String {
    pids.map(|pid| listing(pid, "Pawhuska, OK $120,000", "40 Acres"))
        .collect()
}

fn landing_page(base: &str, count: u64) -> String {
    format!(
        r#"<html><head><link rel="next" href="{base}{SEARCH_PATH}/page-2"></head><body>
            <h1>Osage County, OK Land for sale :</h1>
            <h2>
Land for sale

Oklahoma

Osage County
</h2>
            <span class="resultscount">1&nbsp;-&nbsp;15&nbsp;of&nbsp;{count}&nbsp;results</span>
            {}
        </body></html>"#,
        listings(1..16)
    )
}

fn results_page(body: String) -> String {
    format!("<html><body>{}</body></html>", body)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn test_config(max_attempts: u32) -> Config {
    Config {
        fetcher: FetcherConfig {
            timeout_secs: 5,
            max_parallel: 2,
            max_attempts,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 10, 26).unwrap()
}

#[tokio::test]
async fn test_full_harvest_to_directory() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(html(landing_page(&base, 37)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/page-2", SEARCH_PATH)))
        .respond_with(html(results_page(listings(16..31))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/page-3", SEARCH_PATH)))
        .respond_with(html(results_page(listings(31..38))))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let sink: Arc<dyn ListingSink> = Arc::new(DirectorySink::new(out.path()));
    let harvester = Harvester::from_config(&test_config(3), sink).unwrap();

    let summary = harvester
        .run_at(&format!("{}{}", base, SEARCH_PATH), date())
        .await
        .unwrap();

    assert_eq!(summary.location, "Osage_County-OK");
    assert_eq!(summary.expected_results, 37);
    assert_eq!(summary.pages_requested, 3);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.records, 37);
    assert_eq!(summary.error_records, 0);

    let file = out.path().join("2019-10-26-Osage_County-OK.csv");
    assert_eq!(summary.output, file.display().to_string());

    let mut reader = csv::Reader::from_path(&file).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("pid"));
    assert_eq!(headers.get(5), Some("price_per_acre"));
    assert_eq!(headers.get(11), Some("date_first_seen"));

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 37);

    let first = &rows[0];
    assert_eq!(first.get(0), Some("1"));
    assert_eq!(
        first.get(1),
        Some("https://www.landwatch.com/Osage-County-Oklahoma-Land-for-sale/pid/1")
    );
    assert_eq!(first.get(2), Some("Pawhuska"));
    assert_eq!(first.get(3), Some("120000"));
    assert_eq!(first.get(4), Some("40.0"));
    assert_eq!(first.get(5), Some("3000.0"));
    assert_eq!(first.get(6), Some("Listing 1"));
    assert_eq!(first.get(7), Some("Osage_County-OK"));
    assert_eq!(first.get(8), Some("Osage Realty"));
    assert_eq!(
        first.get(9),
        Some("https://www.landwatch.com/default.aspx?ct=r&type=146,1")
    );
    assert_eq!(first.get(10), Some("Signature Partner"));
    assert_eq!(first.get(11), Some("2019-10-26"));

    // page order is preserved
    let pids: Vec<u64> = rows.iter().map(|r| r[0].parse().unwrap()).collect();
    assert_eq!(pids, (1..38).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_block_page_yields_no_listings_without_aborting() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(html(landing_page(&base, 37)))
        .mount(&server)
        .await;
    // Always a CAPTCHA page: every attempt is spent on it
    Mock::given(method("GET"))
        .and(path(format!("{}/page-2", SEARCH_PATH)))
        .respond_with(html(
            "<html><body><h1>Please verify you are a human</h1></body></html>".to_string(),
        ))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/page-3", SEARCH_PATH)))
        .respond_with(html(results_page(listings(31..38))))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let sink: Arc<dyn ListingSink> = Arc::new(DirectorySink::new(out.path()));
    let summary = Harvester::from_config(&test_config(4), sink)
        .unwrap()
        .run_at(&format!("{}{}", base, SEARCH_PATH), date())
        .await
        .unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.records, 22);

    let content = std::fs::read_to_string(out.path().join("2019-10-26-Osage_County-OK.csv")).unwrap();
    assert_eq!(content.lines().count(), 23);
}

#[tokio::test]
async fn test_error_state_records_are_kept() {
    let server = MockServer::start().await;
    let base = server.uri();

    let page = format!(
        r#"<html><body>
            <h1>Osage County, OK Land for sale :</h1>
            <h2>Land for sale</h2>
            {}
            {}
        </body></html>"#,
        listing(1, "Pawhuska, OK $120,000", "40 Acres"),
        listing(2, "Pawhuska, OK Call for price", "12 Acres"),
    );
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(html(page))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let sink: Arc<dyn ListingSink> = Arc::new(DirectorySink::new(out.path()));
    let summary = Harvester::from_config(&test_config(1), sink)
        .unwrap()
        .run_at(&format!("{}{}", base, SEARCH_PATH), date())
        .await
        .unwrap();

    assert_eq!(summary.expected_results, 1);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.error_records, 1);

    let mut reader =
        csv::Reader::from_path(out.path().join("2019-10-26-Osage_County-OK.csv")).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows[1].get(0), Some("2"));
    assert_eq!(rows[1].get(4), Some("Error"));
    assert_eq!(rows[1].get(5), Some("Error"));
}

#[tokio::test]
async fn test_empty_search_writes_header_only_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(html(
            r#"<html><body>
                <h1>Osage County, OK Land for sale :</h1>
                <h2>Land for sale</h2>
                <span class="resultscount">0&nbsp;-&nbsp;0&nbsp;of&nbsp;0&nbsp;results</span>
            </body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let sink: Arc<dyn ListingSink> = Arc::new(DirectorySink::new(out.path()));
    let summary = Harvester::from_config(&test_config(10), sink)
        .unwrap()
        .run_at(&format!("{}{}", server.uri(), SEARCH_PATH), date())
        .await
        .unwrap();

    assert_eq!(summary.records, 0);
    let content = std::fs::read_to_string(out.path().join("2019-10-26-Osage_County-OK.csv")).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("pid,listing_url,"));
}

#[tokio::test]
async fn test_unreachable_landing_page_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let sink: Arc<dyn ListingSink> = Arc::new(DirectorySink::new(out.path().join("csv")));
    let result = Harvester::from_config(&test_config(2), sink)
        .unwrap()
        .run(&format!("{}{}", server.uri(), SEARCH_PATH))
        .await;

    assert!(matches!(result, Err(HarvestError::LandingUnavailable { .. })));
    assert!(!out.path().join("csv").exists());
}

#[tokio::test]
async fn test_harvest_from_toml_config() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(html(landing_page(&base, 15)))
        .mount(&server)
        .await;

    let config = parse_config(
        r#"
        [fetcher]
        timeout-secs = 5
        max-parallel = 4
        max-attempts = 2

        [proxy]
        strategy = "direct"

        [output]
        kind = "directory"
        "#,
    )
    .unwrap();

    let out = TempDir::new().unwrap();
    let summary = harvest(
        &config,
        &format!("{}{}", base, SEARCH_PATH),
        Arc::new(DirectorySink::new(out.path())),
    )
    .await
    .unwrap();

    assert_eq!(summary.pages_requested, 1);
    assert_eq!(summary.records, 15);
    assert!(std::path::Path::new(&summary.output).exists());
}
