//! Shared helpers: a minimal HTTP/1.1 responder and a recording reporter

#![allow(dead_code)]

use prewarm::provision::{BatchReport, Reporter, ResourceSpec, RunResult};
use prewarm::LoadError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve `routes` (path -> status, body) on an ephemeral local port
    pub async fn start(routes: Vec<(&str, u16, Vec<u8>)>) -> Self {
        let raw = routes
            .into_iter()
            .map(|(path, status, body)| (path, http_response(status, &body)))
            .collect();
        Self::start_raw(raw).await
    }

    /// Serve `routes` (path -> complete response bytes) as written
    pub async fn start_raw(routes: Vec<(&str, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local address");

        let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, response)| (path.to_string(), response))
                .collect(),
        );
        let hits = Arc::new(AtomicUsize::new(0));

        let server_hits = Arc::clone(&hits);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                server_hits.fetch_add(1, Ordering::SeqCst);
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    respond(stream, &routes).await.ok();
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests accepted so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A complete response with a matching `Content-Length`
pub fn http_response(status: u16, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        if status == 200 { "OK" } else { "Error" },
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

async fn respond(mut stream: TcpStream, routes: &HashMap<String, Vec<u8>>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    match routes.get(path) {
        Some(response) => stream.write_all(response).await?,
        None => stream.write_all(&http_response(404, b"not found")).await?,
    }
    stream.shutdown().await
}

/// HTTP client with no proxy and default TLS settings
pub fn client() -> reqwest::Client {
    prewarm::network::NetworkConfig::default()
        .build_client()
        .expect("Failed to build client")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BatchStarted(usize),
    Started(usize, usize, String),
    Succeeded(usize, usize, String),
    Failed(usize, usize, String),
    Finished(usize),
}

/// Reporter that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn batch_started(&self, total: usize) {
        self.push(Event::BatchStarted(total));
    }

    fn item_started(&self, index: usize, total: usize, resource: &ResourceSpec) {
        self.push(Event::Started(index, total, resource.name.to_string()));
    }

    fn item_succeeded(&self, index: usize, total: usize, result: &RunResult) {
        self.push(Event::Succeeded(index, total, result.name.clone()));
    }

    fn item_failed(&self, index: usize, total: usize, resource: &ResourceSpec, _error: &LoadError) {
        self.push(Event::Failed(index, total, resource.name.to_string()));
    }

    fn batch_finished(&self, report: &BatchReport) {
        self.push(Event::Finished(report.total()));
    }
}
