use crate::query::{AddressQuery, Candidate, CandidateQuery, Resolution};
use crate::range::matches;
use crate::select::select_best;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Similarity a street name must exceed to be considered a candidate
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Default bound on a single catalog lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Read access to the segment catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Segments in the query's city/state whose street name has trigram
    /// similarity above the query threshold, joined with team and unit.
    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>>;
}

/// Resolves an address to the team responsible for it.
///
/// `Ok(None)` means no registered segment covers the address.
#[async_trait]
pub trait TeamResolver: Send + Sync {
    async fn resolve_address(&self, query: &AddressQuery) -> Result<Option<Resolution>>;
}

/// Configuration for address resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    pub similarity_threshold: f32,
    pub lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// In-process resolution pipeline over a catalog source
pub struct CatalogResolver<C: ?Sized> {
    catalog: Arc<C>,
    config: ResolverConfig,
}

impl<C: CatalogSource + ?Sized> CatalogResolver<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self::with_config(catalog, ResolverConfig::default())
    }

    pub fn with_config(catalog: Arc<C>, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }
}

#[async_trait]
impl<C: CatalogSource + ?Sized> TeamResolver for CatalogResolver<C> {
    async fn resolve_address(&self, query: &AddressQuery) -> Result<Option<Resolution>> {
        let lookup = query.candidate_query(self.config.similarity_threshold);

        let candidates = tokio::time::timeout(
            self.config.lookup_timeout,
            self.catalog.find_candidates(&lookup),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.lookup_timeout))??;

        let retrieved = candidates.len();
        let eligible: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| matches(&c.segment, query.house_number))
            .collect();

        debug!(
            street = %lookup.street_name,
            number = query.house_number,
            retrieved,
            eligible = eligible.len(),
            "resolved candidates"
        );

        Ok(select_best(eligible, &lookup.street_name))
    }
}
