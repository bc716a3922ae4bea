//! Milestone extraction and the freshness tracker.
//!
//! A node's milestone is located by scanning its node info body for two field
//! markers rather than decoding the whole document. [`StructuredExtractor`] is
//! the serde-based alternative for callers that prefer full parsing.

use crate::{
    types::GetNodeInfoResponse,
    utils::{find, value_end},
};
use parking_lot::Mutex;
use thiserror::Error;

const MILESTONE_HASH_MARKER: &[u8] = br#""latestSolidSubtangleMilestone":"#;
const MILESTONE_INDEX_MARKER: &[u8] = br#""latestSolidSubtangleMilestoneIndex":"#;

/// Reasons a node info body yielded no milestone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MilestoneScanError {
    #[error("subtangle milestone hash field not found")]
    MissingHashField,

    #[error("malformed subtangle milestone hash value")]
    MalformedHash,

    #[error("subtangle milestone index field not found")]
    MissingIndexField,

    #[error("ending delimiter after subtangle milestone index not found")]
    MissingIndexDelimiter,

    #[error("invalid subtangle milestone index '{0}'")]
    InvalidIndex(String),

    #[error("node info could not be decoded: {0}")]
    Decode(String),

    #[error("no node reported a subtangle milestone")]
    NoObservations,
}

/// Pulls `(index, hash)` out of a node info body.
pub trait MilestoneExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`MilestoneScanError`] when the body does not carry a
    /// well-formed milestone.
    fn extract(&self, body: &[u8]) -> Result<(u64, String), MilestoneScanError>;
}

/// Marker-scanning extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanningExtractor;

impl MilestoneExtractor for ScanningExtractor {
    fn extract(&self, body: &[u8]) -> Result<(u64, String), MilestoneScanError> {
        let hash = scan_hash(body)?;
        let index = scan_index(body)?;
        Ok((index, hash))
    }
}

fn scan_hash(body: &[u8]) -> Result<String, MilestoneScanError> {
    let marker = find(body, MILESTONE_HASH_MARKER).ok_or(MilestoneScanError::MissingHashField)?;
    let start = skip_whitespace(body, marker + MILESTONE_HASH_MARKER.len());
    if body.get(start) != Some(&b'"') {
        return Err(MilestoneScanError::MalformedHash);
    }
    let end = value_end(body, start).ok_or(MilestoneScanError::MalformedHash)?;
    std::str::from_utf8(&body[start + 1..end - 1])
        .map(str::to_string)
        .map_err(|_| MilestoneScanError::MalformedHash)
}

fn scan_index(body: &[u8]) -> Result<u64, MilestoneScanError> {
    let marker = find(body, MILESTONE_INDEX_MARKER).ok_or(MilestoneScanError::MissingIndexField)?;
    let start = skip_whitespace(body, marker + MILESTONE_INDEX_MARKER.len());
    let end = value_end(body, start).ok_or(MilestoneScanError::MissingIndexDelimiter)?;

    let delimiter = skip_whitespace(body, end);
    if !matches!(body.get(delimiter), Some(b',' | b'}')) {
        return Err(MilestoneScanError::MissingIndexDelimiter);
    }

    let raw = String::from_utf8_lossy(&body[start..end]);
    raw.parse().map_err(|_| MilestoneScanError::InvalidIndex(raw.into_owned()))
}

fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while data.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

/// Extractor that decodes the full node info document.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredExtractor;

impl MilestoneExtractor for StructuredExtractor {
    fn extract(&self, body: &[u8]) -> Result<(u64, String), MilestoneScanError> {
        let info: GetNodeInfoResponse = serde_json::from_slice(body)
            .map_err(|e| MilestoneScanError::Decode(e.to_string()))?;
        if info.latest_solid_subtangle_milestone.is_empty() {
            return Err(MilestoneScanError::MissingHashField);
        }
        Ok((info.latest_solid_subtangle_milestone_index, info.latest_solid_subtangle_milestone))
    }
}

/// One node's milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessObservation {
    pub node: usize,
    pub index: u64,
    pub hash: String,
}

/// Lowest and highest milestone seen during one freshness vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessBounds {
    pub lowest_index: u64,
    pub lowest_hash: String,
    pub lowest_node: usize,
    pub highest_index: u64,
    pub highest_node: usize,
}

impl FreshnessBounds {
    #[must_use]
    pub fn delta(&self) -> u64 {
        self.highest_index - self.lowest_index
    }
}

/// Running min/max over concurrently arriving observations.
///
/// Equal indices keep the observation of the lowest node index, so the
/// reported hash does not depend on arrival order.
#[derive(Debug, Default)]
pub struct FreshnessTracker {
    bounds: Mutex<Option<FreshnessBounds>>,
}

impl FreshnessTracker {
    pub fn observe(&self, observation: FreshnessObservation) {
        let mut bounds = self.bounds.lock();
        let Some(current) = bounds.as_mut() else {
            *bounds = Some(FreshnessBounds {
                lowest_index: observation.index,
                lowest_node: observation.node,
                highest_index: observation.index,
                highest_node: observation.node,
                lowest_hash: observation.hash,
            });
            return;
        };

        if observation.index > current.highest_index ||
            (observation.index == current.highest_index && observation.node < current.highest_node)
        {
            current.highest_index = observation.index;
            current.highest_node = observation.node;
        }

        if observation.index < current.lowest_index ||
            (observation.index == current.lowest_index && observation.node < current.lowest_node)
        {
            current.lowest_index = observation.index;
            current.lowest_node = observation.node;
            current.lowest_hash = observation.hash;
        }
    }

    /// Consumes the tracker; `None` if nothing was observed.
    #[must_use]
    pub fn into_bounds(self) -> Option<FreshnessBounds> {
        self.bounds.into_inner()
    }
}
