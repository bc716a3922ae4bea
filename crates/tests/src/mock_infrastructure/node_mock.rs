//! Node Mock Builder
//!
//! Wraps mockito with helpers for the node command API.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// Builder for a mocked node.
///
/// Every mock requires the `X-IOTA-API-Version: 1` header and matches on the
/// `command` field of the posted body. Unmatched requests get mockito's 501.
pub struct NodeMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl NodeMockBuilder {
    /// Creates a new node mock with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the URL of the mock server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn command_mock(&mut self, command: &str) -> Mock {
        self.server
            .mock("POST", "/")
            .match_header("x-iota-api-version", "1")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Regex(format!(r#""command"\s*:\s*"{command}""#)))
    }

    /// Answers `command` with `status` and a JSON `body`.
    pub fn mock_command(&mut self, command: &str, status: usize, body: &Value) -> &mut Self {
        let mock = self
            .command_mock(command)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create();

        self.mocks.push(mock);
        self
    }

    /// Answers `command` and expects exactly `hits` calls.
    pub fn mock_command_expect(
        &mut self,
        command: &str,
        body: &Value,
        hits: usize,
    ) -> &mut Self {
        let mock = self
            .command_mock(command)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Answers `getNodeInfo` with the given solid subtangle milestone.
    pub fn mock_node_info(&mut self, hash: &str, index: u64) -> &mut Self {
        let body = json!({
            "appName": "IRI",
            "appVersion": "1.8.6",
            "latestMilestone": hash,
            "latestMilestoneIndex": index,
            "latestSolidSubtangleMilestone": hash,
            "latestSolidSubtangleMilestoneIndex": index,
            "neighbors": 5,
            "tips": 120,
            "duration": 0
        });
        self.mock_command("getNodeInfo", 200, &body)
    }

    /// Answers `command` with an application error.
    pub fn mock_error(&mut self, command: &str, status: usize, message: &str) -> &mut Self {
        self.mock_command(command, status, &json!({ "error": message, "duration": 0 }))
    }

    /// Asserts the hit expectations of every mock.
    pub fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}
