//! Tests for the quorum module.
//!
//! - `engine_tests`: `QuorumExecutor` routing, voting and freshness against
//!   scripted in-memory nodes
//! - Unit tests for canonicalization, tallying and freshness tracking are in
//!   their respective modules


use crate::node::{NodeCaller, NodeError, NodeReply};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// What a scripted node does when called.
#[derive(Debug, Clone)]
pub(super) enum Script {
    Reply(u16, String),
    Fail(NodeError),
    Hang,
}

/// In-memory node returning a fixed answer and counting its calls.
#[derive(Debug)]
pub(super) struct MockNodeCaller {
    endpoint: String,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_body: Mutex<Option<Bytes>>,
}

impl MockNodeCaller {
    pub(super) fn new(endpoint: &str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            last_body: Mutex::new(None),
        })
    }

    pub(super) fn ok(endpoint: &str, body: &str) -> Arc<Self> {
        Self::new(endpoint, Script::Reply(200, body.to_string()))
    }

    pub(super) fn delayed(endpoint: &str, body: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            script: Script::Reply(200, body.to_string()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            last_body: Mutex::new(None),
        })
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_body(&self) -> Option<serde_json::Value> {
        self.last_body.lock().as_ref().map(|body| serde_json::from_slice(body).unwrap())
    }
}

#[async_trait]
impl NodeCaller for MockNodeCaller {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, body: Bytes) -> Result<NodeReply, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_body.lock() = Some(body);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Reply(status, body) => Ok(NodeReply::new(*status, body.clone())),
            Script::Fail(error) => Err(error.clone()),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Node endpoint `i` used across the tests.
pub(super) fn endpoint(i: usize) -> String {
    format!("http://node-{i}:14265")
}

/// One scripted node per body, all answering 200.
pub(super) fn nodes_answering<S: AsRef<str>>(bodies: &[S]) -> Vec<Arc<MockNodeCaller>> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| MockNodeCaller::ok(&endpoint(i), body.as_ref()))
        .collect()
}

pub(super) fn as_callers(nodes: &[Arc<MockNodeCaller>]) -> Vec<Arc<dyn NodeCaller>> {
    nodes.iter().map(|node| Arc::clone(node) as Arc<dyn NodeCaller>).collect()
}
