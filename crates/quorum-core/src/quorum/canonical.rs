//! Response canonicalization.
//!
//! Honest nodes legitimately disagree on a few fields: the request duration
//! everywhere, the milestone index of a balance query, the free-text `info` of
//! a consistency check. Those are stripped before hashing so the vote only
//! compares what the nodes actually agree or disagree on.
//!
//! The original body, not the canonical form, is what the winning group
//! returns to the caller.

use crate::{
    types::CommandKind,
    utils::{content_hash, find, strip_field, unordered_content_key},
};
use std::borrow::Cow;

const DURATION_MARKER: &[u8] = br#""duration":"#;
const MILESTONE_INDEX_MARKER: &[u8] = br#""milestoneIndex":"#;
const INFO_MARKER: &[u8] = br#""info":"#;
const EMPTY_INFO: &[u8] = br#""info":"""#;

/// Stateless mapping from `(kind, raw body)` to a vote key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCanonicalizer;

impl ResponseCanonicalizer {
    /// Removes the volatile fields of a `kind` response. Borrows when nothing
    /// was removed.
    #[must_use]
    pub fn canonicalize<'a>(kind: &CommandKind, body: &'a [u8]) -> Cow<'a, [u8]> {
        let canonical = strip_field(body, DURATION_MARKER);
        match kind {
            CommandKind::GetBalances => strip_again(canonical, MILESTONE_INDEX_MARKER),
            CommandKind::CheckConsistency if find(&canonical, EMPTY_INFO).is_none() => {
                strip_again(canonical, INFO_MARKER)
            }
            _ => canonical,
        }
    }

    /// Hashes an already canonical body.
    ///
    /// Transaction search results come back in node-specific order, so they use
    /// an order-insensitive key; everything else uses a content hash.
    #[must_use]
    pub fn vote_key(kind: &CommandKind, canonical: &[u8]) -> u64 {
        match kind {
            CommandKind::FindTransactions => unordered_content_key(canonical),
            _ => content_hash(canonical),
        }
    }

    /// Canonicalizes and hashes a raw body.
    #[must_use]
    pub fn key_for(kind: &CommandKind, body: &[u8]) -> u64 {
        Self::vote_key(kind, &Self::canonicalize(kind, body))
    }
}

fn strip_again<'a>(data: Cow<'a, [u8]>, marker: &[u8]) -> Cow<'a, [u8]> {
    match data {
        Cow::Borrowed(borrowed) => strip_field(borrowed, marker),
        Cow::Owned(owned) => {
            let stripped = match strip_field(&owned, marker) {
                Cow::Owned(stripped) => Some(stripped),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(stripped.unwrap_or(owned))
        }
    }
}
