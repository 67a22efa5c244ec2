//! HTTP client against a one-shot local server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use ef_app::{
    AppError, CatalogConfig, CatalogSource, HttpCatalogClient, generate_summary, submit_draft,
};
use ef_core::{SimulationRecord, Status};

const RECORDS: &str = r#"[
  {"id": "a", "name": "Run A", "status": "complete", "campaignId": "C1"},
  {"id": "b", "name": "Run B", "status": "failed", "campaignId": "C1"}
]"#;

fn header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(end) = header_end(&data) {
            let head = String::from_utf8_lossy(&data[..end]).to_string();
            if data.len() >= end + 4 + content_length(&head) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

/// Serve one request with `status` and `body`; the join handle yields the raw request.
fn serve_once(status: &'static str, body: &'static str) -> (HttpCatalogClient, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });

    let config = CatalogConfig {
        api_url: format!("http://{addr}/api/"),
        timeout_ms: 5_000,
        ..Default::default()
    };
    (HttpCatalogClient::new(&config), handle)
}

#[test]
fn list_fetch_sends_no_cache_and_parses() {
    let (client, server) = serve_once("200 OK", RECORDS);
    let records = client.fetch_simulations().expect("fetch succeeds");
    let request = server.join().unwrap().to_lowercase();

    assert!(request.starts_with("get /api/simulations "));
    assert!(request.contains("cache-control: no-cache"));
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn missing_record_is_not_found() {
    let (client, server) = serve_once("404 Not Found", r#"{"detail":"Not found"}"#);
    let err = client.fetch_simulation("zzz").unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, AppError::NotFound(ref id) if id == "zzz"));
    assert!(!err.is_retryable());
}

#[test]
fn server_error_is_retryable_fetch_failure() {
    let (client, server) = serve_once("500 Internal Server Error", "{}");
    let err = client.fetch_simulations().unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, AppError::Fetch(_)));
    assert!(err.is_retryable());
}

#[test]
fn analyze_posts_simulations() {
    let (client, server) = serve_once("200 OK", r#"{"summary":"Both runs share C1."}"#);
    let sims = vec![SimulationRecord {
        id: "a".to_string(),
        name: "Run A".to_string(),
        ..Default::default()
    }];
    let summary = client.analyze_simulations(&sims).unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /api/ai/analyze-simulations "));
    assert!(request.contains(r#"{"simulations":[{"id":"a""#));
    assert_eq!(summary, "Both runs share C1.");
}

#[test]
fn record_id_is_one_path_segment() {
    let (client, server) = serve_once("404 Not Found", "{}");
    let err = client.fetch_simulation("a/b?c#d").unwrap_err();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/simulations/a%2Fb%3Fc%23d "));
    assert!(matches!(err, AppError::NotFound(ref id) if id == "a/b?c#d"));
}

#[test]
fn submit_posts_draft_and_returns_created_record() {
    let (client, server) = serve_once(
        "201 Created",
        r#"{"id": "new-1", "name": "Run C", "status": "running", "campaignId": "C1"}"#,
    );
    let draft = SimulationRecord {
        name: "Run C".to_string(),
        status: Status::Running,
        campaign_id: Some("C1".to_string()),
        experiment_type_id: Some("historical".to_string()),
        machine_id: Some("chrysalis".to_string()),
        compiler: Some("intel".to_string()),
        branch: Some("master".to_string()),
        git_hash: Some("0f1e2d3".to_string()),
        ..Default::default()
    };
    let (created, report) = submit_draft(&client, &draft).expect("submit succeeds");
    let request = server.join().unwrap();

    assert!(request.starts_with("POST /api/simulations "));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.contains(r#"{"name":"Run C","#), "draft goes out without an id");
    assert_eq!(created.id, "new-1");
    assert!(report.is_ready());
}

#[test]
fn submit_requires_created_status() {
    let (client, server) = serve_once("200 OK", r#"{"id": "x", "name": "Run C"}"#);
    let err = client
        .create_simulation(&SimulationRecord::default())
        .unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, AppError::Fetch(ref msg) if msg.contains("201")));
}

#[test]
fn failed_analysis_shows_error_text() {
    let (client, server) = serve_once("503 Service Unavailable", "{}");
    let text = generate_summary(&client, &[]);
    server.join().unwrap();
    assert_eq!(text, ef_app::SUMMARY_ERROR_TEXT);
}

#[test]
fn unreachable_server_is_fetch_failure() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = CatalogConfig {
        api_url: format!("http://{addr}"),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let err = HttpCatalogClient::new(&config)
        .fetch_simulations()
        .unwrap_err();
    assert!(matches!(err, AppError::Fetch(_)));
}
