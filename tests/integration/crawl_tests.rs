//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and detail pages and run the
//! full two-phase crawl end-to-end.

use baku_dine::config::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use baku_dine::crawler::{build_http_client, crawl_to_csv, Coordinator, Fetcher};
use baku_dine::output::{compute_insights, read_table, write_records, OutputError};
use baku_dine::{CrawlPhase, MergedRecord, ScrapeError, COLUMNS};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/az/1-yemek-icmek/13-restoranlar-p";
const DETAIL_PREFIX: &str = "/az/1-yemek-icmek/13-restoranlar/";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, total_pages: u32, concurrency: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            total_pages,
            max_concurrent_requests: concurrency,
            request_timeout: 5,
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        output: OutputConfig {
            csv_path: "unused.csv".to_string(),
        },
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn card(id: u32, rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="row"><div class="col-lg-3">{label}:</div><div class="col-lg-9">{value}</div></div>"#
            )
        })
        .collect();
    format!(
        r#"<article class="card"><a href="{DETAIL_PREFIX}{id}"><h3>{id}</h3></a>{rows}</article>"#
    )
}

fn listing_page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.join("\n"))
}

fn detail_page(name: &str, extra: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="page_title">{name}</h1>
            <div class="info_icon_text"><h4>Kateqoriya</h4><p>Restoran</p></div>
            {extra}
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("{LISTING_PATH}{page}")))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("{DETAIL_PREFIX}{id}")))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Starts a bare HTTP server that answers every request with an empty
/// listing page after `delay`, recording the most requests it ever held at
/// once
async fn start_counting_server(delay: Duration) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let server_peak = Arc::clone(&peak);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&server_peak);

            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }

                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                // Released before replying
                active.fetch_sub(1, Ordering::SeqCst);

                let body = "<html><body></body></html>";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", address), peak)
}

fn find<'a>(records: &'a [MergedRecord], name: &str) -> &'a MergedRecord {
    records
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no record named {name}"))
}

/// Two listing pages: A and B on page 1, C and a second A card on page 2
async fn mount_two_page_site(server: &MockServer) {
    mount_listing(
        server,
        1,
        listing_page(&[
            card(101, &[("Telefon", "+994 50 111 11 11"), ("2 nəfərə orta xərc", "25 M")]),
            card(102, &[("Ünvan", "Füzuli küç. 5")]),
        ]),
    )
    .await;

    mount_listing(
        server,
        2,
        listing_page(&[
            card(103, &[("İş saatları", "24/7")]),
            card(
                101,
                &[
                    ("Telefon", "+994 50 999 99 99"),
                    ("Xüsusiyyətləri", r#"<a href="/f/1">WiFi</a><a href="/f/2">Terras</a>"#),
                ],
            ),
        ]),
    )
    .await;

    mount_detail(
        server,
        101,
        detail_page(
            "A",
            r#"<div class="info_icon_text"><h4>Ünvan</h4><p>Nizami küç. 10</p></div>
               <iframe src="https://www.google.com/maps/embed/v1/place?q=x&amp;center=40.4093,49.8671"></iframe>"#,
        ),
    )
    .await;
    mount_detail(server, 102, detail_page("B", "")).await;
    mount_detail(
        server,
        103,
        detail_page(
            "C",
            r#"<div class="phone_numbers"><a href="tel:1">+994 12 333</a></div>"#,
        ),
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_two_listing_pages() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 2, 4);
    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let outcome = coordinator.run().await.expect("Crawl failed");

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.report.listing_pages_fetched, 2);
    assert_eq!(outcome.report.restaurants_discovered, 3);
    assert_eq!(outcome.report.details_fetched, 3);
    assert_eq!(outcome.report.records, 3);

    let a = find(&outcome.records, "A");
    assert_eq!(
        a.url,
        format!("{}{}101", mock_server.uri(), DETAIL_PREFIX)
    );
    // Page 1 phone wins; features only appear on page 2
    assert_eq!(a.phones, "+994 50 111 11 11");
    assert_eq!(a.features, "WiFi; Terras");
    assert_eq!(a.avg_cost_2_people, "25");
    // Detail address wins over the (absent) listing one
    assert_eq!(a.address, "Nizami küç. 10");
    assert_eq!(a.latitude, "40.4093");
    assert_eq!(a.longitude, "49.8671");
    assert_eq!(a.category, "Restoran");

    let b = find(&outcome.records, "B");
    assert_eq!(b.address, "Füzuli küç. 5");

    let c = find(&outcome.records, "C");
    assert_eq!(c.working_hours, "24/7");
    assert_eq!(c.phones, "+994 12 333");
}

#[tokio::test]
async fn test_failed_detail_page_drops_restaurant() {
    let mock_server = MockServer::start().await;

    mount_listing(
        &mock_server,
        1,
        listing_page(&[card(201, &[("Telefon", "+994 1")]), card(202, &[])]),
    )
    .await;
    mount_detail(&mock_server, 201, detail_page("Kept", "")).await;
    Mock::given(method("GET"))
        .and(path(format!("{DETAIL_PREFIX}202")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1, 2);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].name, "Kept");
    assert_eq!(outcome.records[0].phones, "+994 1");
    assert_eq!(outcome.report.details_fetched, 1);
    assert_eq!(outcome.report.details_failed, 1);
}

#[tokio::test]
async fn test_missing_listing_page_is_skipped() {
    let mock_server = MockServer::start().await;

    // Page 1 is not mounted, so the server answers 404
    mount_listing(&mock_server, 2, listing_page(&[card(301, &[])])).await;
    mount_detail(&mock_server, 301, detail_page("Only", "")).await;

    let config = create_test_config(&mock_server.uri(), 2, 2);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert_eq!(outcome.report.listing_pages_failed, 1);
    assert_eq!(outcome.report.listing_pages_fetched, 1);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_slow_listing_page_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{LISTING_PATH}1")))
        .respond_with(html(listing_page(&[card(401, &[])])).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1, 1);
    let client = build_http_client(&config.user_agent, Duration::from_millis(300)).unwrap();
    let fetcher = Fetcher::new(client, 1);

    let mut coordinator = Coordinator::with_fetcher(config, fetcher).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert_eq!(outcome.report.listing_pages_failed, 1);
    assert_eq!(outcome.report.restaurants_discovered, 0);
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn test_concurrency_cap_is_never_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(listing_page(&[])).set_delay(Duration::from_millis(150)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 8, 3);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert_eq!(outcome.report.listing_pages_fetched, 8);
    let peak = coordinator.fetcher().peak_in_flight();
    assert!(peak >= 1);
    assert!(peak <= 3, "peak in-flight {} exceeded cap 3", peak);
}

#[tokio::test]
async fn test_server_never_sees_more_than_cap() {
    let (base_url, server_peak) = start_counting_server(Duration::from_millis(100)).await;

    let config = create_test_config(&base_url, 10, 3);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert_eq!(outcome.report.listing_pages_fetched, 10);
    let peak = server_peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= 3, "server saw {} concurrent requests with cap 3", peak);
}

#[tokio::test]
async fn test_unreachable_site_yields_no_records() {
    // Nothing listens on the discard port
    let config = create_test_config("http://127.0.0.1:9", 2, 2);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.report.listing_pages_failed, 2);
}

#[tokio::test]
async fn test_crawl_to_csv_and_insights() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 2, 2);
    let mut coordinator = Coordinator::new(config).unwrap();
    let outcome = coordinator.run().await.unwrap();

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("restaurants.csv");
    write_records(&csv_path, &outcome.records).unwrap();

    let text = std::fs::read_to_string(&csv_path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header.split(',').count(), COLUMNS.len());
    assert_eq!(header, COLUMNS.join(","));

    let rows = read_table(&csv_path).unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.len(), COLUMNS.len());
    }

    let insights = compute_insights(&rows).unwrap();
    assert_eq!(insights.summary.total_restaurants, 3);
    assert_eq!(insights.geographic.restaurants_with_gps, 1);
    assert_eq!(insights.hours.around_the_clock, 1);
    assert_eq!(insights.pricing.restaurants_with_pricing, 1);
    assert_eq!(insights.features.max_features, 2);
}

#[tokio::test]
async fn test_crawl_to_csv_writes_table() {
    let mock_server = MockServer::start().await;
    mount_two_page_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("restaurants.csv");
    let mut config = create_test_config(&mock_server.uri(), 2, 2);
    config.output.csv_path = csv_path.display().to_string();

    let outcome = crawl_to_csv(config).await.unwrap();
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(read_table(&csv_path).unwrap().len(), 3);
}

#[tokio::test]
async fn test_unwritable_table_is_output_error() {
    let mock_server = MockServer::start().await;
    mount_listing(&mock_server, 1, listing_page(&[])).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), 1, 1);
    config.output.csv_path = dir
        .path()
        .join("missing")
        .join("restaurants.csv")
        .display()
        .to_string();

    let result = crawl_to_csv(config).await;
    assert!(matches!(
        result,
        Err(ScrapeError::Output(OutputError::Io(_)))
    ));
}
