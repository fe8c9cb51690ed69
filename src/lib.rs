//! # teamroute
//!
//! Resolves a street address to the primary-care team responsible for it,
//! together with the basic health unit (UBS) that team works out of.
//!
//! Addresses are matched against a catalog of street segments: a street name,
//! a house-number range and a parity rule (even, odd or all), each assigned
//! to one team. Street names are compared by trigram similarity after
//! normalization, so "Rua das Flôres" finds "RUA DAS FLORES".
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! teamroute --http-port 8083 --data-dir ./data
//! curl 'http://localhost:8083/streets/search?street=Rua%20das%20Flores&number=42&city=Sao%20Paulo&state=SP'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use teamroute::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let storage = Arc::new(StorageManager::new("./data")?);
//! let resolver = CatalogResolver::new(storage.clone());
//!
//! let query = AddressQuery::new("Rua das Flores", 42, "São Paulo", "SP")?;
//! match resolver.resolve_address(&query).await? {
//!     Some(found) => println!("{} at {}", found.team.name, found.ubs.name),
//!     None => println!("no team covers this address"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `teamroute-core` - Data model, normalization, trigram index and the resolution pipeline
//! - `teamroute-storage` - Record management, LMDB persistence and catalog snapshots
//! - `teamroute-api` - REST server and HTTP client resolver

// Re-export core types
pub use teamroute_core::{
    AddressQuery, AdministrativeUnit, CatalogResolver, CatalogSource, Error, ParityRule,
    Resolution, ResolverConfig, Result, SegmentCatalog, SegmentDraft, StreetSegment, Team,
    TeamDraft, TeamResolver, UnitDraft,
};

// Re-export storage
pub use teamroute_storage::{SegmentView, SnapshotDescription, StorageManager, TeamView};

// Re-export API
pub use teamroute_api::{HttpTeamResolver, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AddressQuery, AdministrativeUnit, CatalogResolver, Error, HttpTeamResolver, ParityRule,
        Resolution, ResolverConfig, RestApi, Result, SegmentDraft, StorageManager, StreetSegment,
        Team, TeamDraft, TeamResolver, UnitDraft,
    };
}

/// Address normalization helpers
pub mod normalize {
    pub use teamroute_core::normalize::{
        normalize_digits, normalize_locality, normalize_street_name, normalize_street_type,
        postal_prefix,
    };
}
