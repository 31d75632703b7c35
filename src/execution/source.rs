//! Transports that deliver execution status messages.
//!
//! `StatusSource` is asked for the whole status on every poll tick,
//! `StatusStream` keeps one connection open and yields a status message per
//! frame. The http implementations talk to the dashboard api.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use reqwest::Url;
use tracing::trace;

use crate::{AgentflowError, Result, StatusConfig, execution::ExecutionStatus};

/// Stream of status frames from a push channel.
pub type StatusFrames = BoxStream<'static, Result<ExecutionStatus>>;

/// Interval based status transport.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of an execution.
    ///
    /// Transport failures are reported as `AgentflowError::Connection`.
    async fn fetch(
        &self,
        execution_id: &str,
    ) -> Result<ExecutionStatus>;
}

/// Push based status transport.
#[async_trait]
pub trait StatusStream: Send + Sync {
    /// Open a push channel for an execution.
    async fn open(
        &self,
        execution_id: &str,
    ) -> Result<StatusFrames>;
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).map_err(|e| AgentflowError::Config(format!("invalid status endpoint '{}': {}", endpoint, e)))?;
    if url.cannot_be_a_base() {
        return Err(AgentflowError::Config(format!("invalid status endpoint '{}'", endpoint)));
    }
    Ok(url)
}

/// `{endpoint}/executions/{id}/{leaf}` with the execution id encoded as one path segment.
fn execution_url(
    endpoint: &Url,
    execution_id: &str,
    leaf: &str,
) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| AgentflowError::Config(format!("invalid status endpoint '{}'", endpoint)))?
        .pop_if_empty()
        .extend(["executions", execution_id, leaf]);
    Ok(url)
}

/// `GET {endpoint}/executions/{id}/status`
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpStatusSource {
    pub fn new(config: &StatusConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.request_timeout()).build().map_err(|e| AgentflowError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: parse_endpoint(&config.endpoint)?,
        })
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(
        &self,
        execution_id: &str,
    ) -> Result<ExecutionStatus> {
        let url = execution_url(&self.endpoint, execution_id, "status")?;
        trace!("status::fetch({})", url);

        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.json::<ExecutionStatus>().await?)
    }
}

/// `GET {endpoint}/executions/{id}/stream`, one JSON document per line.
#[derive(Debug, Clone)]
pub struct HttpStatusStream {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpStatusStream {
    pub fn new(config: &StatusConfig) -> Result<Self> {
        // no overall timeout, the response body stays open for the whole run
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentflowError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: parse_endpoint(&config.endpoint)?,
        })
    }
}

#[async_trait]
impl StatusStream for HttpStatusStream {
    async fn open(
        &self,
        execution_id: &str,
    ) -> Result<StatusFrames> {
        let url = execution_url(&self.endpoint, execution_id, "stream")?;
        trace!("status::open({})", url);

        let res = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .send()
            .await?
            .error_for_status()?;

        let chunks = res.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()).map_err(AgentflowError::from)).boxed();
        Ok(decode_ndjson(chunks))
    }
}

/// Split a byte stream into newline delimited status frames.
///
/// Blank lines are skipped; a trailing frame without newline is decoded when
/// the byte stream ends.
pub(crate) fn decode_ndjson(chunks: BoxStream<'static, Result<Vec<u8>>>) -> StatusFrames {
    futures::stream::unfold((chunks, Vec::<u8>::new(), false), |(mut chunks, mut buf, mut eof)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(frame) = parse_frame(&line) {
                    return Some((frame, (chunks, buf, eof)));
                }
                continue;
            }

            if eof {
                let rest = std::mem::take(&mut buf);
                return parse_frame(&rest).map(|frame| (frame, (chunks, buf, eof)));
            }

            match chunks.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(err)) => return Some((Err(err), (chunks, buf, eof))),
                None => eof = true,
            }
        }
    })
    .boxed()
}

fn parse_frame(line: &[u8]) -> Option<Result<ExecutionStatus>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str::<ExecutionStatus>(text).map_err(|e| AgentflowError::Connection(format!("invalid status frame: {}", e))))
}
