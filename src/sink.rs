//! External logging sink
//!
//! Every reported error is forwarded as a `LogRecord` to the backend's
//! logging endpoint. Delivery is best-effort: callers spawn the send and
//! only log failures locally.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::config::{SinkConfig, SinkKind};
use crate::context::{ErrorContext, ErrorSource, Severity};
use crate::error::{NotifierError, SinkError};

/// Structured record handed to the logging backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Severity,
    pub source: ErrorSource,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&ErrorContext> for LogRecord {
    fn from(context: &ErrorContext) -> Self {
        Self {
            level: context.severity,
            source: context.source,
            message: context.message.clone(),
            timestamp: context.timestamp,
        }
    }
}

impl LogRecord {
    /// `[timestamp] [LEVEL] [source] message`, timestamp in local time
    pub fn to_line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            self.timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level.as_str().to_uppercase(),
            self.source,
            self.message
        )
    }
}

/// Logging sink trait
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Short name used in local log lines
    fn name(&self) -> &'static str;

    async fn send(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Posts records as JSON to an HTTP endpoint
pub struct HttpLogSink {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpLogSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, url, timeout))
    }

    /// Sink over a caller-built client (proxy or TLS settings)
    pub fn with_client(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LogSink for HttpLogSink {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout
                } else {
                    SinkError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SinkError::HttpError(format!("Failed to read response body: {}", e)))?;
        Err(SinkError::Rejected(status.as_u16(), body))
    }
}

/// Appends records to `guestbook-YYYY-MM-DD.log`, one file per local day
pub struct FileLogSink {
    dir: PathBuf,
}

impl FileLogSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let date = timestamp.with_timezone(&Local).format("%Y-%m-%d");
        self.dir.join(format!("guestbook-{}.log", date))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(record.timestamp))
            .await?;

        let mut line = record.to_line();
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Drops every record
pub struct NullSink;

#[async_trait]
impl LogSink for NullSink {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn send(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Build the configured sink
pub fn build_sink(config: &SinkConfig) -> Result<Box<dyn LogSink>, NotifierError> {
    match config.kind {
        SinkKind::Http => {
            let url = config.url.as_deref().ok_or_else(|| {
                SinkError::InvalidConfig("http sink requires a url".to_string())
            })?;
            let sink = HttpLogSink::new(url, Duration::from_millis(config.timeout_ms))?;
            Ok(Box::new(sink))
        }
        SinkKind::File => {
            let dir = config.dir.clone().ok_or_else(|| {
                SinkError::InvalidConfig("file sink requires a dir".to_string())
            })?;
            let dir = shellexpand::full(&dir.to_string_lossy())
                .map_err(|e| SinkError::InvalidConfig(e.to_string()))?
                .into_owned();
            Ok(Box::new(FileLogSink::new(dir)))
        }
        SinkKind::None => Ok(Box::new(NullSink)),
    }
}
