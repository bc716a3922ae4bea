//! Quorum executor orchestrating fan-out, voting and freshness checks.
//!
//! The decision logic lives in [`super::canonical`], [`super::tally`] and
//! [`super::freshness`]; this module routes a command, collects every node's
//! answer and applies the tolerance, threshold and delta rules.

use super::{
    canonical::ResponseCanonicalizer,
    config::QuorumConfig,
    errors::QuorumError,
    freshness::{
        FreshnessObservation, FreshnessTracker, MilestoneExtractor, MilestoneScanError,
        ScanningExtractor,
    },
    tally::ContentVoteTally,
    types::{QuorumMetadata, QuorumResult, ResultSource, Strategy},
};
use crate::{
    metrics,
    node::{
        HttpClientConfig, HttpNodeCaller, NodeCaller, NodeError, NodeReply, NodeSelector,
        RandomSelector, SharedHttpClient,
    },
    types::{
        CheckConsistencyResponse, Command, CommandKind, FindTransactionsQuery,
        FindTransactionsResponse, GetBalancesResponse, GetInclusionStatesResponse,
        GetNodeInfoResponse, LatestSolidSubtangleMilestone, RequestError,
        WereAddressesSpentFromResponse,
    },
};
use bytes::Bytes;
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Sends commands to a fixed set of nodes and returns one trusted answer.
///
/// Configuration is validated once at construction and never changes
/// afterwards; concurrent calls share nothing but the node transports.
pub struct QuorumExecutor {
    config: QuorumConfig,
    nodes: Vec<Arc<dyn NodeCaller>>,
    primary: Option<Arc<dyn NodeCaller>>,
    selector: Arc<dyn NodeSelector>,
    extractor: Arc<dyn MilestoneExtractor>,
    node_timeout: Option<Duration>,
}

impl QuorumExecutor {
    /// Creates an executor talking HTTP to the configured nodes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid, or
    /// [`QuorumError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: QuorumConfig) -> Result<Self, QuorumError> {
        Self::with_http_config(config, HttpClientConfig::default())
    }

    /// Creates an executor talking HTTP with explicit client settings.
    ///
    /// # Errors
    ///
    /// Same as [`QuorumExecutor::new`].
    pub fn with_http_config(
        config: QuorumConfig,
        http: HttpClientConfig,
    ) -> Result<Self, QuorumError> {
        config.validate()?;

        let client = Arc::new(SharedHttpClient::with_config(http).map_err(QuorumError::Transport)?);
        let nodes = config
            .nodes
            .iter()
            .map(|endpoint| {
                Arc::new(HttpNodeCaller::new(endpoint.clone(), Arc::clone(&client)))
                    as Arc<dyn NodeCaller>
            })
            .collect();
        let primary = config.primary_node.as_ref().map(|endpoint| {
            Arc::new(HttpNodeCaller::new(endpoint.clone(), Arc::clone(&client))) as Arc<dyn NodeCaller>
        });

        Ok(Self::assemble(config, nodes, primary))
    }

    /// Creates an executor over caller-provided node transports.
    ///
    /// The endpoints of `nodes` and `primary` replace `config.nodes` and
    /// `config.primary_node` before validation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the resulting configuration is invalid.
    pub fn with_callers(
        mut config: QuorumConfig,
        nodes: Vec<Arc<dyn NodeCaller>>,
        primary: Option<Arc<dyn NodeCaller>>,
    ) -> Result<Self, QuorumError> {
        config.nodes = nodes.iter().map(|node| node.endpoint().to_string()).collect();
        config.primary_node = primary.as_ref().map(|node| node.endpoint().to_string());
        config.validate()?;

        Ok(Self::assemble(config, nodes, primary))
    }

    fn assemble(
        config: QuorumConfig,
        nodes: Vec<Arc<dyn NodeCaller>>,
        primary: Option<Arc<dyn NodeCaller>>,
    ) -> Self {
        info!(
            nodes = nodes.len(),
            threshold = config.threshold,
            no_response_tolerance = config.no_response_tolerance,
            max_freshness_delta = config.max_freshness_delta,
            primary = config.primary_node.as_deref().unwrap_or("none"),
            "quorum executor initialized"
        );

        Self {
            node_timeout: config.node_timeout_seconds.map(Duration::from_secs),
            config,
            nodes,
            primary,
            selector: Arc::new(RandomSelector),
            extractor: Arc::new(ScanningExtractor),
        }
    }

    /// Replaces the strategy picking the node for exempt commands when no
    /// primary node is configured.
    #[must_use]
    pub fn with_selector(mut self, selector: impl NodeSelector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    /// Replaces the milestone extractor used by the freshness vote.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl MilestoneExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    #[must_use]
    pub fn config(&self) -> &QuorumConfig {
        &self.config
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Routing decision for `kind`.
    #[must_use]
    pub fn strategy_for(&self, kind: &CommandKind) -> Strategy {
        if *kind == CommandKind::LatestSolidSubtangleMilestone {
            Strategy::FreshnessVote
        } else if kind.is_quorum_exempt() && !self.config.is_forced(kind) {
            Strategy::NonQuorumDirect
        } else {
            Strategy::MajorityVote
        }
    }

    /// Executes `command` and decodes the trusted answer into `T`.
    ///
    /// # Errors
    ///
    /// Any [`QuorumError`] of [`execute_detailed`](Self::execute_detailed), or
    /// [`QuorumError::Decode`] if the answer does not match `T`.
    pub async fn execute<T: DeserializeOwned>(&self, command: &Command) -> Result<T, QuorumError> {
        self.execute_detailed(command).await?.decode()
    }

    /// Executes `command` and returns the raw trusted answer with metadata.
    ///
    /// # Errors
    ///
    /// - [`QuorumError::ExceededNoResponseTolerance`] if too many nodes failed
    /// - [`QuorumError::QuorumNotReached`] below threshold without a default
    /// - [`QuorumError::RequestError`] if the answer is an application error
    /// - [`QuorumError::ExceededMaxFreshnessDelta`] or
    ///   [`QuorumError::NoLatestSubtangleInfo`] for the milestone query
    /// - [`QuorumError::Node`] if the single node of a direct call failed
    pub async fn execute_detailed(&self, command: &Command) -> Result<QuorumResult, QuorumError> {
        let start = Instant::now();
        let kind = command.kind();
        let strategy = self.strategy_for(kind);

        debug!(kind = %kind, strategy = strategy.as_str(), nodes = self.nodes.len(), "executing command");

        let result = self.dispatch(command, strategy).await.map(|result| result.finish(start));
        metrics::record_execution(kind, strategy, result.as_ref().map(|_| ()), start.elapsed());
        result
    }

    /// Latest solid subtangle milestone all nodes can vouch for.
    ///
    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn latest_solid_subtangle_milestone(
        &self,
    ) -> Result<LatestSolidSubtangleMilestone, QuorumError> {
        self.execute(&Command::latest_solid_subtangle_milestone()).await
    }

    /// Node info of the primary or a selected node.
    ///
    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn get_node_info(&self) -> Result<GetNodeInfoResponse, QuorumError> {
        self.execute(&Command::get_node_info()).await
    }

    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn were_addresses_spent_from<S: Into<String>>(
        &self,
        addresses: impl IntoIterator<Item = S>,
    ) -> Result<Vec<bool>, QuorumError> {
        let response: WereAddressesSpentFromResponse =
            self.execute(&Command::were_addresses_spent_from(addresses)).await?;
        Ok(response.states)
    }

    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn get_inclusion_states<S: Into<String>, T: Into<String>>(
        &self,
        transactions: impl IntoIterator<Item = S>,
        tips: impl IntoIterator<Item = T>,
    ) -> Result<Vec<bool>, QuorumError> {
        let response: GetInclusionStatesResponse =
            self.execute(&Command::get_inclusion_states(transactions, tips)).await?;
        Ok(response.states)
    }

    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn get_balances<S: Into<String>>(
        &self,
        addresses: impl IntoIterator<Item = S>,
        threshold: u64,
    ) -> Result<GetBalancesResponse, QuorumError> {
        self.execute(&Command::get_balances(addresses, threshold)).await
    }

    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn check_consistency<S: Into<String>>(
        &self,
        tails: impl IntoIterator<Item = S>,
    ) -> Result<CheckConsistencyResponse, QuorumError> {
        self.execute(&Command::check_consistency(tails)).await
    }

    /// # Errors
    ///
    /// See [`execute_detailed`](Self::execute_detailed).
    pub async fn find_transactions(
        &self,
        query: &FindTransactionsQuery,
    ) -> Result<Vec<String>, QuorumError> {
        let response: FindTransactionsResponse =
            self.execute(&Command::find_transactions(query)).await?;
        Ok(response.hashes)
    }

    async fn dispatch(
        &self,
        command: &Command,
        strategy: Strategy,
    ) -> Result<QuorumResult, QuorumError> {
        let body = command.to_body().map_err(QuorumError::Serialization)?;
        match strategy {
            Strategy::NonQuorumDirect => self.execute_direct(&body).await,
            Strategy::MajorityVote => self.execute_majority(command, &body).await,
            Strategy::FreshnessVote => self.execute_freshness(&body).await,
        }
    }

    async fn execute_direct(&self, body: &Bytes) -> Result<QuorumResult, QuorumError> {
        let node = self.direct_node();
        let endpoint = node.endpoint().to_string();

        let reply = self.call_node(node.as_ref(), body.clone()).await.map_err(|source| {
            warn!(node = %endpoint, error = %source, "direct node call failed");
            metrics::record_node_failure(&endpoint, &source);
            QuorumError::Node { endpoint: endpoint.clone(), source }
        })?;

        if !reply.is_ok() {
            return Err(RequestError::from_body(reply.status, &reply.body).into());
        }

        let mut metadata = QuorumMetadata::new(Strategy::NonQuorumDirect, ResultSource::SingleNode, 1);
        metadata.votes = 1;
        metadata.responded = 1;
        metadata.served_by = Some(endpoint);
        Ok(QuorumResult { body: reply.body, metadata })
    }

    fn direct_node(&self) -> &Arc<dyn NodeCaller> {
        if let Some(primary) = &self.primary {
            return primary;
        }
        let index = self.selector.select(self.nodes.len()) % self.nodes.len();
        &self.nodes[index]
    }

    #[allow(clippy::cast_precision_loss)]
    async fn execute_majority(
        &self,
        command: &Command,
        body: &Bytes,
    ) -> Result<QuorumResult, QuorumError> {
        let kind = command.kind();
        let total = self.nodes.len();
        let tally = ContentVoteTally::with_capacity(total);

        let failures = self
            .fan_out(body, |index, reply| {
                let key = ResponseCanonicalizer::key_for(kind, &reply.body);
                tally.record(key, index, reply.body, reply.status);
                Ok(())
            })
            .await;
        let failed = self.check_no_response_tolerance(failures)?;

        let responded = total - failed;
        let winner = tally.into_winner();
        let votes = winner.as_ref().map_or(0, |entry| entry.votes);
        let agreement = if responded == 0 { 0.0 } else { votes as f64 / responded as f64 };
        metrics::record_agreement(kind, agreement);

        let mut metadata = QuorumMetadata::new(Strategy::MajorityVote, ResultSource::Agreement, total);
        metadata.agreement = Some(agreement);
        metadata.votes = votes;
        metadata.responded = responded;

        let winner = match winner {
            Some(entry) if agreement >= self.config.threshold => entry,
            _ => return self.fall_back_to_default(command, agreement, metadata),
        };

        debug!(
            kind = %kind,
            agreement = agreement,
            votes = votes,
            responded = responded,
            status = winner.status,
            "quorum reached"
        );

        if winner.status != crate::node::STATUS_OK {
            return Err(RequestError::from_body(winner.status, &winner.body).into());
        }

        Ok(QuorumResult { body: winner.body, metadata })
    }

    fn fall_back_to_default(
        &self,
        command: &Command,
        agreement: f64,
        mut metadata: QuorumMetadata,
    ) -> Result<QuorumResult, QuorumError> {
        let kind = command.kind();
        let threshold = self.config.threshold;

        let Some(default) = self.config.defaults.response_for(command) else {
            warn!(kind = %kind, agreement = agreement, threshold = threshold, "quorum not reached");
            return Err(QuorumError::QuorumNotReached { agreement, threshold, kind: kind.clone() });
        };

        warn!(
            kind = %kind,
            agreement = agreement,
            threshold = threshold,
            "quorum not reached, returning configured default"
        );
        metrics::record_default_used(kind);

        let body = serde_json::to_vec(&default).map_err(QuorumError::Serialization)?;
        metadata.source = ResultSource::ConfiguredDefault;
        Ok(QuorumResult { body: Bytes::from(body), metadata })
    }

    async fn execute_freshness(&self, body: &Bytes) -> Result<QuorumResult, QuorumError> {
        let total = self.nodes.len();
        let tracker = FreshnessTracker::default();
        let scan_errors = Mutex::new(Vec::new());

        let failures = self
            .fan_out(body, |index, reply| {
                if !reply.is_ok() {
                    return Err(NodeError::NonOkStatus(reply.status));
                }
                match self.extractor.extract(&reply.body) {
                    Ok((milestone_index, hash)) => tracker.observe(FreshnessObservation {
                        node: index,
                        index: milestone_index,
                        hash,
                    }),
                    Err(error) => scan_errors.lock().push((index, error)),
                }
                Ok(())
            })
            .await;
        let failed = self.check_no_response_tolerance(failures)?;

        if let Some((node, error)) =
            scan_errors.into_inner().into_iter().min_by_key(|(node, _)| *node)
        {
            warn!(node = %self.endpoint(node), error = %error, "node info without usable subtangle milestone");
            return Err(error.into());
        }

        let bounds = tracker.into_bounds().ok_or(MilestoneScanError::NoObservations)?;
        let delta = bounds.delta();
        metrics::record_milestone_delta(delta);

        if delta > self.config.max_freshness_delta {
            warn!(
                lowest_node = %self.endpoint(bounds.lowest_node),
                lowest_index = bounds.lowest_index,
                highest_node = %self.endpoint(bounds.highest_node),
                highest_index = bounds.highest_index,
                max_delta = self.config.max_freshness_delta,
                "subtangle milestone delta exceeded"
            );
            return Err(QuorumError::ExceededMaxFreshnessDelta {
                lowest_node: self.endpoint(bounds.lowest_node).to_string(),
                lowest_index: bounds.lowest_index,
                highest_node: self.endpoint(bounds.highest_node).to_string(),
                highest_index: bounds.highest_index,
                max_delta: self.config.max_freshness_delta,
            });
        }

        debug!(index = bounds.lowest_index, delta = delta, "subtangle milestone agreed");

        let milestone =
            LatestSolidSubtangleMilestone { hash: bounds.lowest_hash, index: bounds.lowest_index };
        let body = serde_json::to_vec(&milestone).map_err(QuorumError::Serialization)?;

        let mut metadata =
            QuorumMetadata::new(Strategy::FreshnessVote, ResultSource::LowestMilestone, total);
        metadata.responded = total - failed;
        metadata.votes = metadata.responded;
        metadata.served_by = Some(self.endpoint(bounds.lowest_node).to_string());
        Ok(QuorumResult { body: Bytes::from(body), metadata })
    }

    /// Sends `body` to every node concurrently and waits for all of them.
    ///
    /// `on_reply` runs as each reply arrives; an error it returns counts as a
    /// failure of that node. Failures come back ordered by node index.
    async fn fan_out<F>(&self, body: &Bytes, on_reply: F) -> Vec<(usize, NodeError)>
    where
        F: Fn(usize, NodeReply) -> Result<(), NodeError> + Sync,
    {
        let failures = Mutex::new(Vec::new());

        let calls = self.nodes.iter().enumerate().map(|(index, node)| {
            let failures = &failures;
            let on_reply = &on_reply;
            let body = body.clone();
            async move {
                let outcome = self
                    .call_node(node.as_ref(), body)
                    .await
                    .and_then(|reply| on_reply(index, reply));
                if let Err(error) = outcome {
                    debug!(node = node.endpoint(), error = %error, "node gave no usable response");
                    metrics::record_node_failure(node.endpoint(), &error);
                    failures.lock().push((index, error));
                }
            }
        });
        join_all(calls).await;

        let mut failures = failures.into_inner();
        failures.sort_by_key(|(index, _)| *index);
        failures
    }

    async fn call_node(&self, node: &dyn NodeCaller, body: Bytes) -> Result<NodeReply, NodeError> {
        match self.node_timeout {
            Some(limit) => {
                tokio::time::timeout(limit, node.call(body)).await.unwrap_or(Err(NodeError::Timeout))
            }
            None => node.call(body).await,
        }
    }

    /// Returns the number of failed nodes if it stays within tolerance.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn check_no_response_tolerance(
        &self,
        failures: Vec<(usize, NodeError)>,
    ) -> Result<usize, QuorumError> {
        let failed = failures.len();
        let total = self.nodes.len();
        let failed_fraction = failed as f64 / total as f64;

        if failed_fraction <= self.config.no_response_tolerance {
            return Ok(failed);
        }
        let Some((node, first_error)) = failures.into_iter().next() else {
            return Ok(failed);
        };

        let failed_percent = (failed_fraction * 100.0).round() as u32;
        warn!(
            failed = failed,
            total = total,
            tolerance = self.config.no_response_tolerance,
            first_node = %self.endpoint(node),
            first_error = %first_error,
            "exceeded no-response tolerance"
        );
        Err(QuorumError::ExceededNoResponseTolerance { failed_percent, first_error })
    }

    fn endpoint(&self, node: usize) -> &str {
        self.nodes.get(node).map_or("unknown", |caller| caller.endpoint())
    }
}
