//! Portals client retry behavior against a scripted local HTTP server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use yieldlord::adapter::outbound::portals::PortalsClient;
use yieldlord::adapter::outbound::token::TokenRegistry;
use yieldlord::error::FeedError;
use yieldlord::infrastructure::retry::RetryPolicy;
use yieldlord::port::outbound::feed::{AccountBalances, FeedQuery, OpportunityFeed};

const TOKENS: &str = r#"{"tokens":[{"symbol":"fUSDC","platform":"fluid","address":"0x1A996cb54bb95462040408C06122D45D6Cdb6096","liquidity":"1000000","metrics":{"apy":"5"}}]}"#;
const ACCOUNT: &str = r#"{"balances":[{"symbol":"fUSDC","platform":"fluid","network":"arbitrum","balance":"250"}]}"#;

enum Reply {
    Status(u16, &'static str),
    Hangup,
}

/// Serve one scripted reply per connection, then stop accepting.
async fn serve(script: Vec<Reply>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let mut script: VecDeque<Reply> = script.into();

    tokio::spawn(async move {
        while let Some(reply) = script.pop_front() {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let mut request = Vec::new();
            let mut buf = [0u8; 2048];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            match reply {
                Reply::Hangup => drop(socket),
                Reply::Status(code, body) => {
                    let response = format!(
                        "HTTP/1.1 {code} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            }
        }
    });

    (format!("http://{addr}"), hits)
}

fn client(base_url: &str, attempts: usize) -> PortalsClient {
    PortalsClient::new(base_url, "arbitrum", Arc::new(TokenRegistry::arbitrum()))
        .with_retry(RetryPolicy::new(attempts, Duration::from_millis(1)))
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn rate_limit_is_retried_until_success() {
    let (url, hits) = serve(vec![Reply::Status(429, "{}"), Reply::Status(200, TOKENS)]).await;

    let opportunities = client(&url, 3)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].apy(), dec!(0.05));
}

#[tokio::test]
async fn persistent_rate_limit_surfaces_as_rate_limited() {
    let (url, hits) = serve(vec![
        Reply::Status(429, "{}"),
        Reply::Status(429, "{}"),
        Reply::Status(429, "{}"),
    ])
    .await;

    let result = client(&url, 3)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await;

    assert!(matches!(result, Err(FeedError::RateLimited { attempts: 3 })));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let (url, hits) = serve(vec![
        Reply::Status(503, "unavailable"),
        Reply::Status(502, "bad gateway"),
        Reply::Status(200, ACCOUNT),
    ])
    .await;

    let balances = client(&url, 3)
        .fetch_balances("0x0000000000000000000000000000000000000001", &[])
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].balance, dec!(250));
}

#[tokio::test]
async fn exhausted_server_errors_keep_the_status() {
    let (url, hits) = serve(vec![Reply::Status(500, "boom"), Reply::Status(500, "boom")]).await;

    let result = client(&url, 2)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await;

    assert!(matches!(
        result,
        Err(FeedError::Status { status: 500, ref body }) if body == "boom"
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_errors_fail_without_retry() {
    let (url, hits) = serve(vec![
        Reply::Status(400, "bad request"),
        Reply::Status(200, TOKENS),
    ])
    .await;

    let result = client(&url, 3)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await;

    assert!(matches!(result, Err(FeedError::Status { status: 400, .. })));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_connection_is_retried() {
    let (url, hits) = serve(vec![Reply::Hangup, Reply::Status(200, TOKENS)]).await;

    let opportunities = client(&url, 3)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(opportunities.len(), 1);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = client(&url, 2)
        .fetch_opportunities(&FeedQuery::new("arbitrum"))
        .await;

    assert!(matches!(result, Err(FeedError::Network(_))));
}
