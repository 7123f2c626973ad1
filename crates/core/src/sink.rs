//! Report delivery.
//!
//! A sink is chosen once from configuration. The HTTP sink hands the POST to
//! a spawned task and returns immediately; its completion is only logged. The
//! file sink overwrites the tick artifact synchronously. Neither reports
//! failures back to the scheduler.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, RequestBuilder, Url,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    config::{SinkMode, WatcherConfig},
    report::ReportContainer,
};

/// Path of the collector endpoint below the configured host.
pub const REPORT_ENDPOINT: &str = "ingamereport";

/// Errors raised while setting up a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The collector address does not form a valid URL.
    #[error("invalid collector url {url:?}: {reason}")]
    Url {
        /// Address that failed to parse.
        url: String,
        /// Parser complaint.
        reason: String,
    },
}

/// How one POST ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The collector accepted the report.
    Delivered {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The collector answered with a non-success status.
    Rejected {
        /// HTTP status code.
        status: u16,
    },
    /// Connection or protocol failure.
    Failed(String),
    /// The client-side timeout elapsed.
    TimedOut,
}

impl SendOutcome {
    fn log(&self) {
        match self {
            SendOutcome::Delivered { status, body } => {
                debug!(status, body = %body, "report delivered")
            }
            SendOutcome::Rejected { status } => debug!(status, "report rejected by collector"),
            SendOutcome::Failed(reason) => debug!(%reason, "report POST failed"),
            SendOutcome::TimedOut => debug!("report POST timed out"),
        }
    }
}

/// What `send` did with a report.
#[derive(Debug)]
pub enum Delivery {
    /// The tick artifact was overwritten.
    Written,
    /// The POST was handed off; the handle resolves when it completes.
    Posted(JoinHandle<SendOutcome>),
    /// Nothing left the process; the failure has been logged.
    Failed,
}

/// POSTs reports to `<host>/ingamereport?key=<key>`.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: Url,
}

impl HttpSink {
    /// Build the persistent client context for `host`. Without a `timeout`
    /// a POST waits as long as the connection stays up.
    pub fn new(host: &str, key: &str, timeout: Option<Duration>) -> Result<Self, SinkError> {
        let raw = format!("{}/{REPORT_ENDPOINT}", host.trim().trim_end_matches('/'));
        let mut url = Url::parse(&raw).map_err(|err| SinkError::Url {
            url: raw.clone(),
            reason: err.to_string(),
        })?;
        url.query_pairs_mut().append_pair("key", key);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, url })
    }

    /// Full endpoint including the key query.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Spawn the POST and return without waiting for it.
    pub fn send(&self, container: &ReportContainer) -> Delivery {
        let body = match container.to_json() {
            Ok(body) => body,
            Err(err) => {
                warn!(?err, "failed to serialize report");
                return Delivery::Failed;
            }
        };
        let request = self.client.post(self.url.clone()).body(body);
        Delivery::Posted(tokio::spawn(async move {
            let outcome = complete(request).await;
            outcome.log();
            outcome
        }))
    }
}

async fn complete(request: RequestBuilder) -> SendOutcome {
    match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                let body = response.text().await.unwrap_or_default();
                SendOutcome::Delivered {
                    status: status.as_u16(),
                    body,
                }
            } else {
                SendOutcome::Rejected {
                    status: status.as_u16(),
                }
            }
        }
        Err(err) if err.is_timeout() => SendOutcome::TimedOut,
        Err(err) => SendOutcome::Failed(err.to_string()),
    }
}

/// Overwrites the tick artifact on every send.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Write reports to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Artifact location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the artifact; failures are logged and superseded by the next tick.
    pub fn send(&self, container: &ReportContainer) -> Delivery {
        match self.write(container) {
            Ok(()) => Delivery::Written,
            Err(err) => {
                warn!(?err, "failed to write tick artifact");
                Delivery::Failed
            }
        }
    }

    fn write(&self, container: &ReportContainer) -> anyhow::Result<()> {
        let body = container.to_json().context("failed to serialize report")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// The sink selected for this process.
#[derive(Debug, Clone)]
pub enum ReportSink {
    /// Remote collector.
    Http(HttpSink),
    /// Local tick artifact.
    File(FileSink),
}

impl ReportSink {
    /// Build the sink selected by `config`.
    pub fn from_config(config: &WatcherConfig) -> Result<Self, SinkError> {
        match config.sink_mode() {
            SinkMode::Http => Ok(ReportSink::Http(HttpSink::new(
                &config.host,
                &config.key,
                config.request_timeout(),
            )?)),
            SinkMode::File => Ok(ReportSink::File(FileSink::new(config.tick_artifact_path()))),
        }
    }

    /// Deliver one report.
    pub fn send(&self, container: &ReportContainer) -> Delivery {
        match self {
            ReportSink::Http(sink) => sink.send(container),
            ReportSink::File(sink) => sink.send(container),
        }
    }

    /// Mode of this sink.
    pub fn mode(&self) -> SinkMode {
        match self {
            ReportSink::Http(_) => SinkMode::Http,
            ReportSink::File(_) => SinkMode::File,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Category, EntryType, LiveEntry};
    use crate::world::Vector3;
    use std::{io::Read, net::TcpListener, thread};
    use tempfile::tempdir;
    use tiny_http::{Response, Server};

    fn vehicle(id: i64, category: Category) -> LiveEntry {
        LiveEntry {
            entry_type: EntryType::Vehicle,
            type_name: "OffroadHatchback".into(),
            category,
            name: format!("vehicle-{id}"),
            id,
            position: Vector3::new(1.0, 2.0, 3.0),
            speed: Vector3::default(),
            damage: 0.0,
        }
    }

    /// Serve one request and hand back its url and body.
    fn collector(status: u16) -> anyhow::Result<(String, thread::JoinHandle<(String, String)>)> {
        let server = Server::http("127.0.0.1:0").map_err(|err| anyhow::anyhow!(err))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| anyhow::anyhow!("collector not bound to an ip address"))?;
        let handle = thread::spawn(move || {
            let mut req = server.recv().expect("collector request");
            let url = req.url().to_string();
            let mut body = String::new();
            req.as_reader()
                .read_to_string(&mut body)
                .expect("collector body");
            let _ = req.respond(Response::from_string("ok").with_status_code(status));
            (url, body)
        });
        Ok((format!("http://127.0.0.1:{port}"), handle))
    }

    #[tokio::test]
    async fn http_sink_posts_report() -> anyhow::Result<()> {
        let (host, server) = collector(200)?;
        let sink = HttpSink::new(
            &format!("{host}/"),
            "secret key&1",
            Some(Duration::from_secs(5)),
        )?;

        let container = ReportContainer {
            players: Vec::new(),
            vehicles: vec![vehicle(1, Category::Air), vehicle(2, Category::Ground)],
        };
        let Delivery::Posted(handle) = sink.send(&container) else {
            anyhow::bail!("http sink did not post");
        };
        let outcome = handle.await?;
        assert_eq!(
            outcome,
            SendOutcome::Delivered {
                status: 200,
                body: "ok".into()
            }
        );

        let (url, body) = server.join().map_err(|_| anyhow::anyhow!("collector panicked"))?;
        assert_eq!(url, "/ingamereport?key=secret+key%261");
        let value: serde_json::Value = serde_json::from_str(&body)?;
        assert_eq!(value["players"], serde_json::json!([]));
        assert_eq!(value["vehicles"][0]["category"], "AIR");
        assert_eq!(value["vehicles"][1]["category"], "GROUND");
        Ok(())
    }

    #[tokio::test]
    async fn http_error_status_is_only_reported() -> anyhow::Result<()> {
        let (host, server) = collector(503)?;
        let sink = HttpSink::new(&host, "k", Some(Duration::from_secs(5)))?;

        let Delivery::Posted(handle) = sink.send(&ReportContainer::default()) else {
            anyhow::bail!("http sink did not post");
        };
        assert_eq!(handle.await?, SendOutcome::Rejected { status: 503 });
        server.join().map_err(|_| anyhow::anyhow!("collector panicked"))?;
        Ok(())
    }

    #[tokio::test]
    async fn zero_timeout_config_still_delivers() -> anyhow::Result<()> {
        let (host, server) = collector(200)?;
        let config = WatcherConfig {
            use_api_for_report: true,
            host,
            key: "k".into(),
            request_timeout_secs: 0.0,
            ..Default::default()
        };
        config.validate()?;
        let sink = ReportSink::from_config(&config)?;

        let Delivery::Posted(handle) = sink.send(&ReportContainer::default()) else {
            anyhow::bail!("http sink did not post");
        };
        assert!(matches!(handle.await?, SendOutcome::Delivered { status: 200, .. }));
        server.join().map_err(|_| anyhow::anyhow!("collector panicked"))?;
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_collector_fails_quietly() -> anyhow::Result<()> {
        let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
        let sink = HttpSink::new(
            &format!("http://127.0.0.1:{port}"),
            "k",
            Some(Duration::from_secs(5)),
        )?;

        let Delivery::Posted(handle) = sink.send(&ReportContainer::default()) else {
            anyhow::bail!("http sink did not post");
        };
        assert!(matches!(
            handle.await?,
            SendOutcome::Failed(_) | SendOutcome::TimedOut
        ));
        Ok(())
    }

    #[test]
    fn invalid_host_is_rejected() {
        assert!(matches!(
            HttpSink::new("not a url", "k", None),
            Err(SinkError::Url { .. })
        ));
    }

    #[test]
    fn file_sink_keeps_only_the_latest_tick() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let sink = FileSink::new(dir.path().join("profiles").join("DZSM-TICK.json"));

        let first = ReportContainer {
            players: Vec::new(),
            vehicles: vec![vehicle(1, Category::Ground), vehicle(2, Category::Sea)],
        };
        let second = ReportContainer {
            players: Vec::new(),
            vehicles: vec![vehicle(3, Category::Air)],
        };
        assert!(matches!(sink.send(&first), Delivery::Written));
        assert!(matches!(sink.send(&second), Delivery::Written));

        let written: ReportContainer = serde_json::from_slice(&fs::read(sink.path())?)?;
        assert_eq!(written, second);
        Ok(())
    }

    #[test]
    fn file_sink_failure_is_swallowed() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("profiles");
        fs::write(&blocker, "file where a directory should be")?;
        let sink = FileSink::new(blocker.join("DZSM-TICK.json"));

        assert!(matches!(sink.send(&ReportContainer::default()), Delivery::Failed));
        Ok(())
    }

    #[test]
    fn config_selects_sink() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut config = WatcherConfig {
            profile_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let file = ReportSink::from_config(&config)?;
        assert_eq!(file.mode(), SinkMode::File);
        let ReportSink::File(sink) = file else {
            anyhow::bail!("expected file sink");
        };
        assert_eq!(sink.path(), dir.path().join("DZSM-TICK.json"));

        config.use_api_for_report = true;
        config.host = "http://collector.local:8080".into();
        config.key = "abc".into();
        let ReportSink::Http(sink) = ReportSink::from_config(&config)? else {
            anyhow::bail!("expected http sink");
        };
        assert_eq!(
            sink.url().as_str(),
            "http://collector.local:8080/ingamereport?key=abc"
        );
        Ok(())
    }
}
