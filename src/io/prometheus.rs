//! Scrape endpoint for the metrics registry
//!
//! Renders every family in the text exposition format (HELP, TYPE, one line
//! per label tuple). Families with no series yet still get their HELP/TYPE
//! header so dashboards can discover them before the first trip completes.

use crate::infra::metrics::{MetricId, Metrics};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Escape a label value per the text exposition format
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Write one metric family: HELP, TYPE and a line per label tuple
fn write_family(output: &mut String, metrics: &Metrics, id: MetricId) {
    let name = id.name();
    let _ = writeln!(output, "# HELP {name} {}", id.help());
    let _ = writeln!(output, "# TYPE {name} {}", id.metric_type().as_str());

    for (values, val) in metrics.series(id) {
        let labels = id
            .label_names()
            .iter()
            .zip(values.iter())
            .map(|(label, value)| format!("{label}=\"{}\"", escape_label_value(value)))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(output, "{name}{{{labels}}} {val}");
    }
}

/// Render the whole registry
pub fn format_prometheus_metrics(metrics: &Metrics) -> String {
    let mut output = String::with_capacity(4096);
    for id in MetricId::ALL {
        write_family(&mut output, metrics, id);
    }
    output
}

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
    response
}

/// Route a scrape request
async fn route(
    req: Request<hyper::body::Incoming>,
    metrics: Arc<Metrics>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            text_response(StatusCode::OK, format_prometheus_metrics(&metrics))
        }
        (&Method::GET, "/health") => text_response(StatusCode::OK, "ok"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}

/// Serve one scraper connection until it closes
async fn serve_scraper(stream: TcpStream, peer: SocketAddr, metrics: Arc<Metrics>) {
    let service = service_fn(move |req| route(req, metrics.clone()));

    if let Err(e) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
        debug!(peer = %peer, error = %e, "metrics_connection_error");
    }
}

/// Serve `/metrics` and `/health` until the shutdown flag flips
pub async fn start_metrics_server(
    bind_address: &str,
    port: u16,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = format!("{bind_address}:{port}").parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %listener.local_addr()?, "metrics_server_listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(serve_scraper(stream, peer, metrics.clone()));
                }
                Err(e) => error!(error = %e, "metrics_accept_failed"),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("metrics_server_stopped");
                    return Ok(());
                }
            }
        }
    }
}
