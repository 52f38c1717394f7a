//! Query shape for similarity searches
//!
//! Filtering by schema fingerprint happens after the index has ranked
//! candidates, so a filtered search has to ask the index for more than it
//! will return. [`CandidatePolicy`] decides how much more.

use super::{CacheEntry, SemanticSearchResult};
use crate::domain::DomainError;

/// Multipliers used to widen a search when a fingerprint filter applies.
///
/// Invariant: `candidate_multiplier > prefilter_multiplier > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePolicy {
    candidate_multiplier: usize,
    prefilter_multiplier: usize,
}

impl CandidatePolicy {
    pub fn new(candidate_multiplier: usize, prefilter_multiplier: usize) -> Result<Self, DomainError> {
        if prefilter_multiplier <= 1 || candidate_multiplier <= prefilter_multiplier {
            return Err(DomainError::configuration(format!(
                "Candidate multipliers must satisfy candidate > prefilter > 1, got {} and {}",
                candidate_multiplier, prefilter_multiplier
            )));
        }

        Ok(Self {
            candidate_multiplier,
            prefilter_multiplier,
        })
    }

    pub fn candidate_multiplier(&self) -> usize {
        self.candidate_multiplier
    }

    pub fn prefilter_multiplier(&self) -> usize {
        self.prefilter_multiplier
    }

    /// Build the plan for a search returning at most `limit` results
    pub fn plan(&self, limit: usize, fingerprint: Option<&str>) -> SearchPlan {
        let prefilter_limit = match fingerprint {
            Some(_) => limit.saturating_mul(self.prefilter_multiplier),
            None => limit,
        };

        SearchPlan {
            limit,
            num_candidates: limit.saturating_mul(self.candidate_multiplier),
            prefilter_limit,
            fingerprint: fingerprint.map(str::to_string),
        }
    }
}

impl Default for CandidatePolicy {
    fn default() -> Self {
        Self {
            candidate_multiplier: 10,
            prefilter_multiplier: 5,
        }
    }
}

/// A concrete search request for an index backend
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    /// Results the caller asked for
    pub limit: usize,
    /// Candidates the ANN stage should explore
    pub num_candidates: usize,
    /// Ranked results to fetch before fingerprint filtering
    pub prefilter_limit: usize,
    /// Fingerprint filter, if any
    pub fingerprint: Option<String>,
}

impl SearchPlan {
    pub fn is_filtered(&self) -> bool {
        self.fingerprint.is_some()
    }

    /// Apply the fingerprint filter to ranked candidates and cut to `limit`.
    ///
    /// `ranked` must already be ordered by descending score.
    pub fn finalize(&self, ranked: Vec<SemanticSearchResult>) -> Vec<SemanticSearchResult> {
        let filter = self.fingerprint.as_deref();

        ranked
            .into_iter()
            .filter(|result| result.entry.matches_fingerprint(filter))
            .take(self.limit)
            .collect()
    }

    /// Whether a single entry passes the fingerprint filter
    pub fn accepts(&self, entry: &CacheEntry) -> bool {
        entry.matches_fingerprint(self.fingerprint.as_deref())
    }
}
