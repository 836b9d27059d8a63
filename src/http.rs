//! `Backend` over HTTP/JSON.
//!
//! Every operation is `POST {base}/api/<op>`. Search answers with
//! newline-delimited JSON: progress frames, then exactly one result frame.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::backend::Backend;
use crate::constants::constants;
use crate::model::{Credentials, FilterConfig, LoadReply, ProgressEvent, Reply, SearchReply, Session};
use crate::progress::ProgressSender;

pub struct HttpBackend {
  client: Client,
  base: String,
}

impl HttpBackend {
  pub fn new(base_url: &str) -> Result<Self> {
    let client = Client::builder()
      .connect_timeout(Duration::from_secs(constants().connect_timeout_secs))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { client, base: base_url.trim_end_matches('/').to_string() })
  }

  fn url(&self, op: &str) -> String {
    format!("{}/api/{}", self.base, op)
  }

  async fn post<T: Serialize + Sync + ?Sized>(&self, op: &str, body: &T) -> Result<Response> {
    let url = self.url(op);
    debug!(%url, "backend call");
    let response = self.client.post(&url).json(body).send().await.with_context(|| format!("Failed to reach {}", url))?;
    let status = response.status();
    if !status.is_success() {
      return Err(anyhow!("{} returned HTTP {}", url, status));
    }
    Ok(response)
  }

  async fn call<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(&self, op: &str, body: &B) -> Result<T> {
    let response = self.post(op, body).await?;
    response.json::<T>().await.with_context(|| format!("Invalid reply to {}", op))
  }
}

impl Backend for HttpBackend {
  async fn check_status(&self) -> Result<Session> {
    self.call("check_status", &json!({})).await
  }

  async fn get_current_config(&self) -> Result<Credentials> {
    self.call("get_current_config", &json!({})).await
  }

  async fn save_config(&self, credentials: Credentials) -> Result<Reply> {
    self.call("save_config", &credentials).await
  }

  async fn login(&self) -> Result<Reply> {
    self.call("login", &json!({})).await
  }

  async fn logout(&self) -> Result<()> {
    self.post("logout", &json!({})).await?;
    Ok(())
  }

  async fn load_subscriptions(&self, force_refresh: bool) -> Result<LoadReply> {
    self.call("load_subscriptions", &json!({ "forceRefresh": force_refresh })).await
  }

  async fn unsubscribe(&self, channel_id: String) -> Result<Reply> {
    self.call("unsubscribe", &json!({ "channelId": channel_id })).await
  }

  async fn search(&self, filter: FilterConfig, progress: ProgressSender) -> Result<SearchReply> {
    let response = self.post("search", &filter).await?;
    let mut stream = response.bytes_stream();
    let mut frames = FrameBuffer::default();

    while let Some(chunk) = stream.next().await {
      let chunk = chunk.context("Error reading search stream")?;
      for line in frames.push(&chunk) {
        if let Some(reply) = apply_frame(&line, &progress)? {
          return Ok(reply);
        }
      }
    }
    if let Some(line) = frames.finish()
      && let Some(reply) = apply_frame(&line, &progress)?
    {
      return Ok(reply);
    }
    Err(anyhow!("Search stream ended without a result"))
  }
}

// --- Search stream ---

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SearchFrame {
  Progress { text: String, percent: f64 },
  Result(SearchReply),
}

/// Forward a progress frame, or hand back the final reply.
fn apply_frame(line: &str, progress: &ProgressSender) -> Result<Option<SearchReply>> {
  let frame: SearchFrame = serde_json::from_str(line).with_context(|| format!("Malformed search frame: {}", line))?;
  match frame {
    SearchFrame::Progress { text, percent } => {
      // The receiver is gone once the search resolved locally.
      let _ = progress.send(ProgressEvent { text, percent });
      Ok(None)
    }
    SearchFrame::Result(reply) => Ok(Some(reply)),
  }
}

/// Splits a byte stream into lines. Works on bytes so a chunk boundary inside
/// a multi-byte character is harmless.
#[derive(Debug, Default)]
struct FrameBuffer {
  buf: Vec<u8>,
}

impl FrameBuffer {
  fn push(&mut self, chunk: &[u8]) -> Vec<String> {
    self.buf.extend_from_slice(chunk);
    let mut lines = Vec::new();
    while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
      let raw: Vec<u8> = self.buf.drain(..=pos).collect();
      let line = String::from_utf8_lossy(&raw).trim().to_string();
      if !line.is_empty() {
        lines.push(line);
      }
    }
    lines
  }

  /// Whatever is left after the stream closed without a trailing newline.
  fn finish(&mut self) -> Option<String> {
    let rest = std::mem::take(&mut self.buf);
    let line = String::from_utf8_lossy(&rest).trim().to_string();
    (!line.is_empty()).then_some(line)
  }
}
