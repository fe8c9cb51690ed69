use crate::model::{AdministrativeUnit, SegmentId, StreetSegment, Team, TeamId, UnitId};
use crate::query::{Candidate, CandidateQuery};
use crate::resolver::CatalogSource;
use crate::trigram::TrigramIndex;
use crate::Result;
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

type LocalityKey = (String, String);

#[derive(Debug, Default)]
struct CatalogState {
    units: BTreeMap<UnitId, AdministrativeUnit>,
    teams: BTreeMap<TeamId, Team>,
    segments: BTreeMap<SegmentId, StreetSegment>,
    by_locality: AHashMap<LocalityKey, TrigramIndex>,
}

impl CatalogState {
    fn unindex_segment(&mut self, segment: &StreetSegment) {
        let key = (segment.city.clone(), segment.state.clone());
        if let Some(index) = self.by_locality.get_mut(&key) {
            index.remove(segment.id);
            if index.is_empty() {
                self.by_locality.remove(&key);
            }
        }
    }

    fn index_segment(&mut self, segment: &StreetSegment) {
        self.by_locality
            .entry((segment.city.clone(), segment.state.clone()))
            .or_default()
            .insert(segment.id, &segment.street_name);
    }

    fn join(&self, segment: &StreetSegment) -> Option<Candidate> {
        let team = self.teams.get(&segment.team_id)?;
        let unit = self.units.get(&team.unit_id)?;
        Some(Candidate {
            segment: segment.clone(),
            team: team.clone(),
            unit: unit.clone(),
        })
    }
}

/// In-memory catalog of units, teams and street segments.
///
/// Each `(city, state)` pair owns a trigram index over the normalized street
/// names of its segments, so a lookup only scores streets of one locality.
/// The catalog stores what it is given; referential checks belong to the
/// caller that manages the records.
#[derive(Debug, Default)]
pub struct SegmentCatalog {
    state: RwLock<CatalogState>,
}

impl SegmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_unit(&self, unit: AdministrativeUnit) {
        self.state.write().units.insert(unit.id, unit);
    }

    pub fn remove_unit(&self, id: UnitId) -> Option<AdministrativeUnit> {
        self.state.write().units.remove(&id)
    }

    pub fn get_unit(&self, id: UnitId) -> Option<AdministrativeUnit> {
        self.state.read().units.get(&id).cloned()
    }

    pub fn units(&self) -> Vec<AdministrativeUnit> {
        self.state.read().units.values().cloned().collect()
    }

    pub fn upsert_team(&self, team: Team) {
        self.state.write().teams.insert(team.id, team);
    }

    pub fn remove_team(&self, id: TeamId) -> Option<Team> {
        self.state.write().teams.remove(&id)
    }

    pub fn get_team(&self, id: TeamId) -> Option<Team> {
        self.state.read().teams.get(&id).cloned()
    }

    pub fn teams(&self) -> Vec<Team> {
        self.state.read().teams.values().cloned().collect()
    }

    /// Teams owned by a unit
    pub fn teams_of_unit(&self, unit_id: UnitId) -> Vec<Team> {
        self.state
            .read()
            .teams
            .values()
            .filter(|t| t.unit_id == unit_id)
            .cloned()
            .collect()
    }

    /// Insert or replace a segment, keeping both indexes in sync
    pub fn upsert_segment(&self, segment: StreetSegment) {
        let mut state = self.state.write();
        if let Some(old) = state.segments.remove(&segment.id) {
            state.unindex_segment(&old);
        }
        state.index_segment(&segment);
        state.segments.insert(segment.id, segment);
    }

    pub fn remove_segment(&self, id: SegmentId) -> Option<StreetSegment> {
        let mut state = self.state.write();
        let segment = state.segments.remove(&id)?;
        state.unindex_segment(&segment);
        Some(segment)
    }

    pub fn get_segment(&self, id: SegmentId) -> Option<StreetSegment> {
        self.state.read().segments.get(&id).cloned()
    }

    pub fn segments(&self) -> Vec<StreetSegment> {
        self.state.read().segments.values().cloned().collect()
    }

    /// Number of segments assigned to a team
    pub fn segment_count_for_team(&self, team_id: TeamId) -> usize {
        self.state
            .read()
            .segments
            .values()
            .filter(|s| s.team_id == team_id)
            .count()
    }

    pub fn segment_count(&self) -> usize {
        self.state.read().segments.len()
    }

    /// Number of distinct (city, state) pairs with at least one segment
    pub fn locality_count(&self) -> usize {
        self.state.read().by_locality.len()
    }

    /// Highest ids in use, as (unit, team, segment)
    pub fn max_ids(&self) -> (u64, u64, u64) {
        let state = self.state.read();
        (
            state.units.keys().next_back().copied().unwrap_or(0),
            state.teams.keys().next_back().copied().unwrap_or(0),
            state.segments.keys().next_back().copied().unwrap_or(0),
        )
    }

    /// Replace the whole content of the catalog
    pub fn replace_all(
        &self,
        units: Vec<AdministrativeUnit>,
        teams: Vec<Team>,
        segments: Vec<StreetSegment>,
    ) {
        let mut fresh = CatalogState::default();
        for unit in units {
            fresh.units.insert(unit.id, unit);
        }
        for team in teams {
            fresh.teams.insert(team.id, team);
        }
        for segment in segments {
            fresh.index_segment(&segment);
            fresh.segments.insert(segment.id, segment);
        }
        *self.state.write() = fresh;
    }

    /// Segments in the query's city and state whose street name is similar
    /// enough to the query's, joined with their owners, in id order.
    ///
    /// Segments whose team or unit is missing are skipped.
    pub fn candidates(&self, query: &CandidateQuery) -> Vec<Candidate> {
        let state = self.state.read();
        let key = (query.city.clone(), query.state.clone());
        let Some(index) = state.by_locality.get(&key) else {
            debug!(city = %query.city, state = %query.state, "no segments registered for locality");
            return Vec::new();
        };

        let hits = index.search(&query.street_name, query.threshold);

        hits.into_iter()
            .filter_map(|(id, _)| {
                let segment = state.segments.get(&id)?;
                let joined = state.join(segment);
                if joined.is_none() {
                    debug!(segment_id = id, "skipping segment with unresolved owner");
                }
                joined
            })
            .collect()
    }
}

#[async_trait]
impl CatalogSource for SegmentCatalog {
    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
        Ok(self.candidates(query))
    }
}
