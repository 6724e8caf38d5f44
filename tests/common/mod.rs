//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;
use video_catalog::{CatalogError, Result, Transport, TransportResponse};

/// One scripted answer, optionally held until the gate is opened
pub struct Step {
    pub outcome: Result<TransportResponse>,
    pub gate: Option<Arc<Notify>>,
}

impl Step {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(TransportResponse::new(200, body.into().into_bytes())),
            gate: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            outcome: Ok(TransportResponse::new(status, b"{\"detail\":\"boom\"}".to_vec())),
            gate: None,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            outcome: Err(CatalogError::TransportFailure("connection refused".to_string())),
            gate: None,
        }
    }

    pub fn held(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }
}

/// Answers requests in order and records every URL it was asked for
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::status(599));

        if let Some(gate) = step.gate {
            gate.notified().await;
        }
        step.outcome
    }
}

/// JSON body for a page with one record per id, every record tagged with `tags`
pub fn page_body(ids: &[&str], tags: &[&str], total: u64, page: u32) -> String {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "summary": format!("Video {}", id),
                "tags": tags,
                "signedUrl": format!("https://cdn.example.com/{}.mp4", id),
            })
        })
        .collect();

    serde_json::json!({
        "items": items,
        "total": total,
        "page": page,
        "pageSize": 20,
    })
    .to_string()
}
