use chrono::{NaiveDate, NaiveDateTime};
use cta_walk_advisor::advisory::Urgency;
use cta_walk_advisor::arrivals::Line;
use cta_walk_advisor::config::{AdvisorConfig, FeedConfig, StoreConfig};
use cta_walk_advisor::error::{Error, FeedError, FetchError};
use cta_walk_advisor::fetch::{BasicClient, auth::UrlParam};
use cta_walk_advisor::pipeline::{advise, ingest_positions};
use reqwest::Url;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const API_KEY: &str = "test-key";

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Serves a single HTTP response and returns the request line it received.
async fn serve_once(status: &'static str, body: String) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (Url::parse(&format!("http://{addr}/api/1.0/feed.aspx")).unwrap(), handle)
}

fn feed_config(url: Url) -> FeedConfig {
    FeedConfig {
        api_key: API_KEY.to_string(),
        arrivals_url: url.clone(),
        positions_url: url,
        station_id: "40530".to_string(),
        route_list: vec!["Red".into(), "Brn".into(), "Y".into(), "P".into()],
        timeout: Duration::from_secs(5),
    }
}

fn client() -> UrlParam<BasicClient> {
    UrlParam::api_key(BasicClient::new(Duration::from_secs(5)).unwrap(), API_KEY)
}

fn single_eta(arr_t: &str) -> String {
    format!(
        r#"{{"ctatt":{{"tmst":"2026-10-14T12:00:00","errCd":"0","errNm":null,"eta":[{{"rt":"Brn","trDr":"5","arrT":"{arr_t}","destNm":"Loop","isApp":"0","isDly":"0"}}]}}}}"#
    )
}

#[tokio::test]
async fn test_advise_pipeline_from_fixture() {
    let body = include_str!("fixtures/arrivals.json").to_string();
    let (url, server) = serve_once("200 OK", body).await;

    let board = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .expect("advisory");

    let request_line = server.await.unwrap();
    assert!(request_line.starts_with("GET /api/1.0/feed.aspx?"));
    assert!(request_line.contains("mapid=40530"));
    assert!(request_line.contains("outputType=JSON"));
    assert!(request_line.contains("key=test-key"));

    let minutes: Vec<_> = board.arrivals().iter().map(|a| a.minutes_away()).collect();
    assert_eq!(minutes, vec![6, 10, 21]);
    assert!(board.arrivals().iter().all(|a| a.destination() == "Loop"));
    assert!(!board.arrivals()[0].catchable());
    assert!(board.arrivals()[1].delayed());

    let advisory = board.advisory().unwrap();
    let next = advisory.next_catchable().unwrap();
    assert_eq!(next.route(), Line::Purple);
    assert_eq!(advisory.urgency(), Urgency::Soon);
    assert_eq!(advisory.message(), "Leave in ~2 min");
}

#[tokio::test]
async fn test_advise_single_train_ten_minutes_out() {
    let (url, _server) = serve_once("200 OK", single_eta("2026-10-14T12:10:00")).await;
    let board = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap();

    let arrival = &board.arrivals()[0];
    assert_eq!(arrival.route(), Line::Brown);
    assert_eq!(arrival.minutes_away(), 10);
    assert!(arrival.catchable());

    // 10 min is within walk + 3, so it falls in the "soon" band.
    let advisory = board.advisory().unwrap();
    assert_eq!(advisory.urgency(), Urgency::Soon);
    assert_eq!(advisory.message(), "Leave in ~2 min");
}

#[tokio::test]
async fn test_advise_single_train_too_soon() {
    let (url, _server) = serve_once("200 OK", single_eta("2026-10-14T12:06:00")).await;
    let board = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap();

    assert_eq!(board.arrivals()[0].minutes_away(), 6);
    assert!(!board.arrivals()[0].catchable());
    assert_eq!(board.advisory().unwrap().urgency(), Urgency::None);
}

#[tokio::test]
async fn test_advise_single_train_at_walk_time() {
    let (url, _server) = serve_once("200 OK", single_eta("2026-10-14T12:08:00")).await;
    let board = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap();

    assert_eq!(board.arrivals()[0].minutes_away(), 8);
    assert!(board.arrivals()[0].catchable());
    assert_eq!(board.advisory().unwrap().urgency(), Urgency::LeaveNow);
}

#[tokio::test]
async fn test_advise_http_error_status() {
    let (url, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
    let err = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap_err();

    match err {
        Error::Fetch(fetch) => assert_eq!(fetch.status_code(), Some(503)),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_advise_non_json_body() {
    let (url, _server) = serve_once("200 OK", "<html>maintenance</html>".to_string()).await;
    let err = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::BodyNotJson(_))));
}

#[tokio::test]
async fn test_advise_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/api/1.0/ttarrivals.aspx")).unwrap();
    let err = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::Network(_))));
}

#[tokio::test]
async fn test_advise_feed_error_payload_is_malformed() {
    let body = r#"{"ctatt":{"tmst":"2026-10-14T12:00:00","errCd":"101","errNm":"Invalid API key."}}"#;
    let (url, _server) = serve_once("200 OK", body.to_string()).await;
    let err = advise(&client(), &feed_config(url), &AdvisorConfig::default(), noon())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Feed(FeedError::MalformedPayload(_))));
    assert!(err.to_string().contains("Invalid API key."));
}

#[tokio::test]
async fn test_ingest_positions_pipeline_from_fixture() {
    let body = include_str!("fixtures/positions.json").to_string();
    let (url, server) = serve_once("200 OK", body).await;

    let path = std::env::temp_dir().join("cta_walk_advisor_ingest_test.db");
    let _ = std::fs::remove_file(&path);
    let store = StoreConfig::from_path(&path);

    let written = ingest_positions(&client(), &feed_config(url), &store, noon())
        .await
        .expect("ingest");
    assert_eq!(written, 4);

    let request_line = server.await.unwrap();
    assert!(request_line.contains("rt=Red%2CBrn%2CY%2CP"));
    assert!(request_line.contains("outputType=JSON"));
    assert!(request_line.contains("key=test-key"));

    let mut conn = SqliteConnectOptions::new()
        .filename(&store.path)
        .connect()
        .await
        .unwrap();
    let rows: Vec<(String, String, f64, f64, i64, i64, String)> = sqlx::query_as(
        "SELECT run_number, route, lat, lon, heading, is_delayed, fetched_at \
         FROM train_positions ORDER BY id",
    )
    .fetch_all(&mut conn)
    .await
    .unwrap();
    conn.close().await.unwrap();

    let runs: Vec<_> = rows.iter().map(|r| r.0.as_str()).collect();
    assert_eq!(runs, vec!["801", "802", "415", "513"]);
    let routes: Vec<_> = rows.iter().map(|r| r.1.as_str()).collect();
    assert_eq!(routes, vec!["red", "red", "brn", "p"]);

    // The Brown line train was reported without coordinates.
    assert_eq!((rows[2].2, rows[2].3, rows[2].4), (0.0, 0.0, 0));
    assert_eq!(rows[2].5, 1);
    assert!(rows.iter().all(|r| r.6 == "2026-10-14T12:00:00.000000"));

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_ingest_positions_fetch_failure_leaves_store_untouched() {
    let (url, _server) = serve_once("500 Internal Server Error", "{}".to_string()).await;

    let path = std::env::temp_dir().join("cta_walk_advisor_ingest_fail_test.db");
    let _ = std::fs::remove_file(&path);
    let store = StoreConfig::from_path(&path);

    let err = ingest_positions(&client(), &feed_config(url), &store, noon())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::HttpStatus(_))));
    assert!(!path.exists());
}
