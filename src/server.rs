//! Metrics Server
//!
//! Serves `/metrics` in the Prometheus text format and `/healthz` for
//! liveness probes. Stops accepting connections once its token is cancelled.

use std::convert::Infallible;
use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::metrics::MonitorMetrics;

/// Route a request against the metrics registry.
pub fn respond(path: &str, metrics: &MonitorMetrics) -> Response<Full<Bytes>> {
    match path {
        "/metrics" => match metrics.render() {
            Ok(body) => {
                let mut response = Response::new(Full::new(Bytes::from(body)));
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(prometheus::TEXT_FORMAT),
                );
                response
            }
            Err(e) => {
                error!("Failed to render metrics: {}", e);
                with_status(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable")
            }
        },
        "/healthz" | "/livez" => with_status(StatusCode::OK, "ok"),
        _ => with_status(StatusCode::NOT_FOUND, "not found"),
    }
}

fn with_status(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Bind `addr` and serve until `token` is cancelled.
pub async fn run_metrics_server(
    addr: SocketAddr,
    metrics: MonitorMetrics,
    token: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", listener.local_addr()?);

    serve(listener, metrics, token).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    metrics: MonitorMetrics,
    token: CancellationToken,
) -> Result<()> {
    loop {
        let (stream, peer) = tokio::select! {
            _ = token.cancelled() => {
                debug!("Metrics server stopping");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };

        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let response = respond(req.uri().path(), &metrics);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, "Metrics server connection error: {}", e);
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_routes() {
        let metrics = MonitorMetrics::new().unwrap();

        let response = respond("/metrics", &metrics);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            prometheus::TEXT_FORMAT
        );
        assert!(body_text(response).await.contains("healthwatch_sample_failures_total"));

        let response = respond("/healthz", &metrics);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");

        assert_eq!(respond("/nope", &metrics).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_stops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let server = tokio::spawn(serve(listener, MonitorMetrics::new().unwrap(), token.clone()));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.ends_with("ok"));

        token.cancel();
        server.await.unwrap().unwrap();
    }
}
