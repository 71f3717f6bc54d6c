// tests/fetch_http.rs
//! HttpFetcher against a loopback stub server.

use std::time::{Duration, Instant};

use deal_scout::error::FetchFailureReason;
use deal_scout::scrape::fetch::{Fetcher, HttpFetcher};
use deal_scout::FetchSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn stub_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = sock.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let req = String::from_utf8_lossy(&buf[..read]).to_string();
                let target = req
                    .lines()
                    .next()
                    .and_then(|l| l.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let path = target.split('?').next().unwrap_or("/").to_string();

                let (status, extra, body) = match path.as_str() {
                    "/ok" => ("200 OK", "", "<html>ok</html>".to_string()),
                    "/echo" => ("200 OK", "", req.clone()),
                    "/missing" => ("404 Not Found", "", "nope".to_string()),
                    "/moved" => ("302 Found", "Location: /ok\r\n", String::new()),
                    "/slow" => {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        ("200 OK", "", "late".to_string())
                    }
                    _ => ("500 Internal Server Error", "", String::new()),
                };
                let resp = format!(
                    "HTTP/1.1 {status}\r\n{extra}Content-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

fn settings() -> FetchSettings {
    FetchSettings {
        user_agent: "deal-scout-test/1.0".into(),
        accept_language: "en-GB".into(),
        timeout: Duration::from_millis(500),
        delay: Duration::ZERO,
        ebay_app_id: None,
    }
}

#[tokio::test]
async fn success_returns_body_and_final_url() {
    let base = stub_server().await;
    let f = HttpFetcher::new(settings()).unwrap();
    let page = f.fetch(&format!("{base}/ok"), &[]).await.unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.body, "<html>ok</html>");
    assert_eq!(page.final_url, format!("{base}/ok"));
}

#[tokio::test]
async fn sends_configured_headers_and_query() {
    let base = stub_server().await;
    let f = HttpFetcher::new(settings()).unwrap();
    let page = f
        .fetch(&format!("{base}/echo"), &[("q", "rtx 3080")])
        .await
        .unwrap();
    let req = page.body.to_ascii_lowercase();
    assert!(req.starts_with("get /echo?q=rtx+3080 "), "request was {req}");
    assert!(req.contains("user-agent: deal-scout-test/1.0"));
    assert!(req.contains("accept-language: en-gb"));
    assert!(req.contains("accept: text/html"));
}

#[tokio::test]
async fn redirects_are_followed() {
    let base = stub_server().await;
    let f = HttpFetcher::new(settings()).unwrap();
    let page = f.fetch(&format!("{base}/moved"), &[]).await.unwrap();
    assert_eq!(page.final_url, format!("{base}/ok"));
    assert_eq!(page.body, "<html>ok</html>");
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let base = stub_server().await;
    let f = HttpFetcher::new(settings()).unwrap();
    let err = f.fetch(&format!("{base}/missing"), &[]).await.unwrap_err();
    assert_eq!(err.reason, FetchFailureReason::Status(404));
}

#[tokio::test]
async fn slow_server_times_out() {
    let base = stub_server().await;
    let f = HttpFetcher::new(settings()).unwrap();
    let err = f.fetch(&format!("{base}/slow"), &[]).await.unwrap_err();
    assert_eq!(err.reason, FetchFailureReason::Timeout);
}

#[tokio::test]
async fn refused_connection_is_a_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let f = HttpFetcher::new(settings()).unwrap();
    let err = f.fetch(&format!("http://{addr}/ok"), &[]).await.unwrap_err();
    assert_eq!(err.reason, FetchFailureReason::Connect);
}

#[tokio::test]
async fn politeness_delay_precedes_every_request() {
    let base = stub_server().await;
    let f = HttpFetcher::new(FetchSettings {
        delay: Duration::from_millis(150),
        ..settings()
    })
    .unwrap();

    let started = Instant::now();
    f.fetch(&format!("{base}/ok"), &[]).await.unwrap();
    f.fetch(&format!("{base}/ok"), &[]).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(300));
}
