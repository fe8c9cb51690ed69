//! # teamroute Core
//!
//! Core library for the teamroute address resolver.
//!
//! This crate provides the data model and the resolution pipeline:
//!
//! - [`normalize`] - Canonical forms for street names, street types, localities and postal codes
//! - [`SegmentCatalog`] - In-memory catalog indexed by locality and street-name trigrams
//! - [`range::matches`] - House-number range and parity evaluation
//! - [`select::select_best`] - Best-match selection by trigram similarity
//! - [`CatalogResolver`] - The full pipeline behind the [`TeamResolver`] trait
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use teamroute_core::{
//!     AddressQuery, CatalogResolver, SegmentCatalog, SegmentDraft, TeamDraft, TeamResolver,
//!     UnitDraft,
//! };
//!
//! # tokio_test_block(async {
//! let catalog = SegmentCatalog::new();
//! let now = Utc::now();
//! catalog.upsert_unit(UnitDraft {
//!     name: "UBS Centro".into(),
//!     address: "Praça da Sé, 1".into(),
//!     city: "São Paulo".into(),
//!     state: "SP".into(),
//!     cep: "01001-000".into(),
//! }.into_unit(1, now).unwrap());
//! catalog.upsert_team(TeamDraft {
//!     name: "T1".into(),
//!     ubs_id: 1,
//! }.into_team(1, now).unwrap());
//! catalog.upsert_segment(SegmentDraft {
//!     street_name: "Rua das Flores".into(),
//!     street_type: "R.".into(),
//!     neighborhood: "Sé".into(),
//!     city: "São Paulo".into(),
//!     state: "SP".into(),
//!     start_number: 1,
//!     end_number: 999,
//!     cep_prefix: String::new(),
//!     even_odd: "all".into(),
//!     team_id: 1,
//! }.into_segment(1, now).unwrap());
//!
//! let resolver = CatalogResolver::new(Arc::new(catalog));
//! let query = AddressQuery::new("Rua das Flôres", 42, "São Paulo", "SP").unwrap();
//! let found = resolver.resolve_address(&query).await.unwrap().unwrap();
//! assert_eq!(found.team.name, "T1");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod model;
pub mod normalize;
pub mod query;
pub mod range;
pub mod resolver;
pub mod select;
pub mod trigram;

pub use catalog::SegmentCatalog;
pub use error::{Error, Result};
pub use model::{
    AdministrativeUnit, ParityRule, SegmentDraft, SegmentId, StreetSegment, Team, TeamDraft,
    TeamId, UnitDraft, UnitId,
};
pub use query::{AddressQuery, Candidate, CandidateQuery, Resolution};
pub use resolver::{CatalogResolver, CatalogSource, ResolverConfig, TeamResolver};
pub use trigram::TrigramIndex;
