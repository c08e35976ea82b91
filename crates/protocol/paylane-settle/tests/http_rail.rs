//! HttpRail against a minimal in-process gateway.

use paylane_settle::{HttpRail, PaymentRail, RailConfig, RailError, TransferInstruction};
use paylane_types::{Fingerprint, Identity, TrackingTag};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned response and return the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        // Read headers, then exactly content-length bytes of body.
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });

    (format!("http://{}", addr), handle)
}

fn instruction() -> TransferInstruction {
    let fp = Fingerprint::of(b"doc");
    TransferInstruction::new(Identity::new("0xowner"), 50_000, "USDC")
        .with_memo(TrackingTag::derive(&fp, 1_700_000_000, 0))
        .with_fee_sponsored(true)
}

#[tokio::test]
async fn test_transfer_success() {
    let (url, server) = serve_once("200 OK", r#"{"transfer_ref":"0xabc","confirmed":true}"#).await;
    let rail = HttpRail::new(&RailConfig::new(url, "0xagent").with_api_key("secret")).unwrap();

    let receipt = rail.transfer(&instruction()).await.unwrap();
    assert_eq!(receipt.transfer_ref.as_str(), "0xabc");
    assert!(receipt.confirmed);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /transfers"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
    assert!(request.contains("\"from\":\"0xagent\""));
    assert!(request.contains("\"memo\""));
}

#[tokio::test]
async fn test_transfer_insufficient_balance() {
    let (url, _server) = serve_once(
        "402 Payment Required",
        r#"{"code":"insufficient_balance","message":"low","have":10,"need":50000}"#,
    )
    .await;
    let rail = HttpRail::new(&RailConfig::new(url, "0xagent")).unwrap();

    let err = rail.transfer(&instruction()).await.unwrap_err();
    assert!(matches!(
        err,
        RailError::InsufficientBalance { have: 10, need: 50_000 }
    ));
}

#[tokio::test]
async fn test_batch_fills_item_refs() {
    let (url, server) = serve_once("200 OK", r#"{"transfer_ref":"0xbatch","all_confirmed":true}"#).await;
    let rail = HttpRail::new(&RailConfig::new(url, "0xagent")).unwrap();

    let receipt = rail
        .submit_batch(&[instruction(), instruction()], true)
        .await
        .unwrap();
    assert!(receipt.all_confirmed);
    assert_eq!(receipt.item_refs.len(), 2);
    assert_eq!(receipt.item_ref(1).as_str(), "0xbatch#1");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /batches"));
}

#[tokio::test]
async fn test_empty_batch_never_hits_network() {
    let rail = HttpRail::new(&RailConfig::new("http://127.0.0.1:9", "0xagent")).unwrap();
    assert!(matches!(
        rail.submit_batch(&[], false).await,
        Err(RailError::EmptyBatch)
    ));
}

#[tokio::test]
async fn test_balance() {
    let (url, server) = serve_once("200 OK", r#"{"balance":123456}"#).await;
    let rail = HttpRail::new(&RailConfig::new(url, "0xagent")).unwrap();

    assert_eq!(rail.balance("USDC").await.unwrap(), 123_456);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /balances/USDC?account=0xagent"));
}
