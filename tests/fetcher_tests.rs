use link_preview_card::{Fetcher, FetcherConfig, LoadStatus, MetadataCard, PreviewError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// One-shot HTTP server answering every connection with `status` and
/// `body`. Request lines are forwarded on the returned channel.
async fn serve(
    status: &'static str,
    body: &'static str,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                if let Some(line) = request.lines().next() {
                    let _ = tx.send(line.to_string());
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}/api/services/website/metadata"), rx)
}

fn fetcher_for(endpoint: String) -> Fetcher {
    Fetcher::new_with_config(FetcherConfig {
        endpoint,
        timeout: Duration::from_secs(5),
        ..FetcherConfig::default()
    })
}

#[tokio::test]
async fn test_fetch_metadata_success() {
    let (endpoint, mut requests) = serve(
        "200 OK",
        r#"{"data":{"og:title":"Hax","og:image":"https://hax.psu.edu/og.png","og:description":"Web components","og:url":"https://hax.psu.edu/"}}"#,
    )
    .await;
    let fetcher = fetcher_for(endpoint);

    let meta = fetcher
        .fetch_metadata("https://hax.psu.edu/?a=1&b=2")
        .await
        .unwrap();

    assert_eq!(meta.title.as_deref(), Some("Hax"));
    assert_eq!(meta.image.as_deref(), Some("https://hax.psu.edu/og.png"));
    assert_eq!(meta.description.as_deref(), Some("Web components"));
    assert_eq!(meta.canonical_url.as_deref(), Some("https://hax.psu.edu/"));

    let request_line = requests.recv().await.unwrap();
    assert_eq!(
        request_line,
        "GET /api/services/website/metadata?q=https%3A%2F%2Fhax.psu.edu%2F%3Fa%3D1%26b%3D2 HTTP/1.1"
    );
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let (endpoint, _requests) = serve("503 Service Unavailable", "{}").await;
    let fetcher = fetcher_for(endpoint);

    let result = fetcher.fetch_metadata("https://example.com").await;
    match result {
        Err(PreviewError::HttpStatus { status }) => assert_eq!(status, 503),
        other => panic!("Expected HttpStatus, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_a_parse_error() {
    let (endpoint, _requests) = serve("200 OK", "<html>not json</html>").await;
    let fetcher = fetcher_for(endpoint);

    let result = fetcher.fetch_metadata("https://example.com").await;
    assert!(matches!(result, Err(PreviewError::ParseError(_))));
}

#[tokio::test]
async fn test_non_object_json_is_a_parse_error() {
    let (endpoint, _requests) = serve("200 OK", "[1, 2, 3]").await;
    let fetcher = fetcher_for(endpoint);

    let result = fetcher.fetch_metadata("https://example.com").await;
    assert!(matches!(result, Err(PreviewError::ParseError(_))));
}

#[tokio::test]
async fn test_unreachable_service_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = fetcher_for(format!("http://{addr}/metadata"));
    let result = fetcher.fetch_metadata("https://example.com").await;

    let err = result.unwrap_err();
    assert!(err.is_fetch_failure(), "unexpected error: {err:?}");
    assert!(matches!(
        err,
        PreviewError::NetworkFailure(_) | PreviewError::Timeout(_)
    ));
}

#[tokio::test]
async fn test_card_over_http_settles_on_both_paths() {
    let (bad_endpoint, _bad) = serve("404 Not Found", "{}").await;
    let card = MetadataCard::with_fetcher(fetcher_for(bad_endpoint));

    card.set_url("https://example.com").unwrap().await.unwrap();
    assert_eq!(card.status(), LoadStatus::Failed);
    assert!(!card.loading());
    assert_eq!(card.title(), "");

    let (good_endpoint, _good) = serve("200 OK", r#"{"og:title":"Back"}"#).await;
    let card = MetadataCard::with_fetcher(fetcher_for(good_endpoint));
    card.set_url("https://example.com").unwrap().await.unwrap();
    assert_eq!(card.status(), LoadStatus::Loaded);
    assert_eq!(card.title(), "Back");
}

#[tokio::test]
async fn test_silent_service_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let fetcher = Fetcher::new_with_config(FetcherConfig {
        endpoint: format!("http://{addr}/metadata"),
        timeout: Duration::from_millis(100),
        ..FetcherConfig::default()
    });
    let result = fetcher.fetch_metadata("https://example.com").await;

    assert!(
        matches!(result, Err(PreviewError::Timeout(_))),
        "Expected Timeout, got: {:?}",
        result
    );
}

#[test]
fn test_invalid_user_agent_fails_client_build() {
    let config = || FetcherConfig {
        endpoint: "http://127.0.0.1:9/metadata".to_string(),
        user_agent: "bad\nagent".to_string(),
        ..FetcherConfig::default()
    };

    assert!(matches!(
        Fetcher::try_new_with_config(config()),
        Err(PreviewError::ClientBuild(_))
    ));

    let fallback = Fetcher::new_with_config(config());
    assert_eq!(fallback.endpoint(), "http://127.0.0.1:9/metadata");
}

#[cfg(feature = "logging")]
mod error_logging {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_is_logged_once() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let (endpoint, _requests) = serve("500 Internal Server Error", "{}").await;
        let card = MetadataCard::with_fetcher(fetcher_for(endpoint));
        card.set_url("https://example.com").unwrap().await.unwrap();

        assert_eq!(card.status(), LoadStatus::Failed);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
