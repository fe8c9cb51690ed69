use crate::lmdb_storage::LmdbStorage;
use crate::snapshot::{CatalogSnapshotData, SnapshotDescription, SnapshotManager};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use teamroute_core::{
    AdministrativeUnit, Candidate, CandidateQuery, CatalogSource, Error, Result, SegmentCatalog,
    SegmentDraft, SegmentId, StreetSegment, Team, TeamDraft, TeamId, UnitDraft, UnitId,
};
use tracing::{info, warn};

/// A team with its unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamView {
    #[serde(flatten)]
    pub team: Team,
    pub ubs: Option<AdministrativeUnit>,
}

/// A street segment with its team and the team's unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentView {
    #[serde(flatten)]
    pub segment: StreetSegment,
    pub team: Option<TeamView>,
}

#[derive(Debug, Default)]
struct IdSequence {
    unit: UnitId,
    team: TeamId,
    segment: SegmentId,
}

fn storage_err(e: anyhow::Error) -> Error {
    Error::Storage(e.to_string())
}

/// Manages units, teams and street segments and keeps them persisted.
///
/// Every write is committed to LMDB before the in-memory catalog changes.
/// Writes are serialized; reads go straight to the catalog.
pub struct StorageManager {
    catalog: Arc<SegmentCatalog>,
    lmdb: LmdbStorage,
    snapshots: SnapshotManager,
    writes: Mutex<IdSequence>,
}

impl StorageManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let lmdb = LmdbStorage::new(data_dir.join("lmdb")).map_err(storage_err)?;
        let snapshots = SnapshotManager::new(data_dir.join("snapshots"))
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let units = lmdb.load_units().map_err(storage_err)?;
        let teams = lmdb.load_teams().map_err(storage_err)?;
        let segments = lmdb.load_segments().map_err(storage_err)?;
        info!(
            units = units.len(),
            teams = teams.len(),
            segments = segments.len(),
            "Catalog loaded from {:?}",
            data_dir
        );

        let catalog = Arc::new(SegmentCatalog::new());
        catalog.replace_all(units, teams, segments);
        let (unit, team, segment) = catalog.max_ids();

        Ok(Self {
            catalog,
            lmdb,
            snapshots,
            writes: Mutex::new(IdSequence { unit, team, segment }),
        })
    }

    /// Shared handle to the in-memory catalog
    pub fn catalog(&self) -> Arc<SegmentCatalog> {
        self.catalog.clone()
    }

    // ==================== Units ====================

    pub fn create_unit(&self, draft: UnitDraft) -> Result<AdministrativeUnit> {
        let mut seq = self.writes.lock();
        let unit = draft.into_unit(seq.unit + 1, Utc::now())?;

        self.lmdb.save_unit(&unit).map_err(storage_err)?;
        seq.unit = unit.id;
        self.catalog.upsert_unit(unit.clone());
        info!(unit_id = unit.id, name = %unit.name, "Unit created");
        Ok(unit)
    }

    pub fn get_unit(&self, id: UnitId) -> Result<AdministrativeUnit> {
        self.catalog.get_unit(id).ok_or(Error::UnitNotFound(id))
    }

    pub fn list_units(&self) -> Vec<AdministrativeUnit> {
        self.catalog.units()
    }

    pub fn update_unit(&self, id: UnitId, draft: UnitDraft) -> Result<AdministrativeUnit> {
        let _seq = self.writes.lock();
        let existing = self.get_unit(id)?;

        let mut unit = draft.into_unit(id, Utc::now())?;
        unit.created_at = existing.created_at;

        self.lmdb.save_unit(&unit).map_err(storage_err)?;
        self.catalog.upsert_unit(unit.clone());
        info!(unit_id = id, "Unit updated");
        Ok(unit)
    }

    pub fn delete_unit(&self, id: UnitId) -> Result<()> {
        let _seq = self.writes.lock();
        self.get_unit(id)?;
        if !self.catalog.teams_of_unit(id).is_empty() {
            return Err(Error::UnitHasTeams(id));
        }

        self.lmdb.delete_unit(id).map_err(storage_err)?;
        self.catalog.remove_unit(id);
        info!(unit_id = id, "Unit deleted");
        Ok(())
    }

    // ==================== Teams ====================

    fn team_view(&self, team: Team) -> TeamView {
        let ubs = self.catalog.get_unit(team.unit_id);
        TeamView { team, ubs }
    }

    fn require_unit(&self, id: UnitId) -> Result<()> {
        match self.catalog.get_unit(id) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidInput(format!("Invalid UBS ID: {}", id))),
        }
    }

    pub fn create_team(&self, draft: TeamDraft) -> Result<TeamView> {
        let mut seq = self.writes.lock();
        self.require_unit(draft.ubs_id)?;
        let team = draft.into_team(seq.team + 1, Utc::now())?;

        self.lmdb.save_team(&team).map_err(storage_err)?;
        seq.team = team.id;
        self.catalog.upsert_team(team.clone());
        info!(team_id = team.id, unit_id = team.unit_id, "Team created");
        Ok(self.team_view(team))
    }

    pub fn get_team(&self, id: TeamId) -> Result<TeamView> {
        let team = self.catalog.get_team(id).ok_or(Error::TeamNotFound(id))?;
        Ok(self.team_view(team))
    }

    pub fn list_teams(&self) -> Vec<TeamView> {
        self.catalog
            .teams()
            .into_iter()
            .map(|t| self.team_view(t))
            .collect()
    }

    pub fn update_team(&self, id: TeamId, draft: TeamDraft) -> Result<TeamView> {
        let _seq = self.writes.lock();
        let existing = self.catalog.get_team(id).ok_or(Error::TeamNotFound(id))?;
        self.require_unit(draft.ubs_id)?;

        let mut team = draft.into_team(id, Utc::now())?;
        team.created_at = existing.created_at;

        self.lmdb.save_team(&team).map_err(storage_err)?;
        self.catalog.upsert_team(team.clone());
        info!(team_id = id, "Team updated");
        Ok(self.team_view(team))
    }

    /// Delete a team. Teams that still own street segments are kept.
    pub fn delete_team(&self, id: TeamId) -> Result<()> {
        let _seq = self.writes.lock();
        self.catalog.get_team(id).ok_or(Error::TeamNotFound(id))?;
        if self.catalog.segment_count_for_team(id) > 0 {
            return Err(Error::TeamHasSegments(id));
        }

        self.lmdb.delete_team(id).map_err(storage_err)?;
        self.catalog.remove_team(id);
        info!(team_id = id, "Team deleted");
        Ok(())
    }

    // ==================== Street segments ====================

    fn segment_view(&self, segment: StreetSegment) -> SegmentView {
        let team = self.catalog.get_team(segment.team_id).map(|t| self.team_view(t));
        SegmentView { segment, team }
    }

    fn require_team(&self, id: TeamId) -> Result<()> {
        match self.catalog.get_team(id) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidInput(format!("Invalid team ID: {}", id))),
        }
    }

    pub fn create_segment(&self, draft: SegmentDraft) -> Result<SegmentView> {
        let mut seq = self.writes.lock();
        self.require_team(draft.team_id)?;
        let segment = draft.into_segment(seq.segment + 1, Utc::now())?;

        self.lmdb.save_segment(&segment).map_err(storage_err)?;
        seq.segment = segment.id;
        self.catalog.upsert_segment(segment.clone());
        info!(
            segment_id = segment.id,
            street = %segment.street_name,
            range = %format!("{}..={}", segment.start_number, segment.end_number),
            parity = %segment.parity,
            "Street segment created"
        );
        Ok(self.segment_view(segment))
    }

    pub fn get_segment(&self, id: SegmentId) -> Result<SegmentView> {
        let segment = self.catalog.get_segment(id).ok_or(Error::SegmentNotFound(id))?;
        Ok(self.segment_view(segment))
    }

    pub fn list_segments(&self) -> Vec<SegmentView> {
        self.catalog
            .segments()
            .into_iter()
            .map(|s| self.segment_view(s))
            .collect()
    }

    pub fn update_segment(&self, id: SegmentId, draft: SegmentDraft) -> Result<SegmentView> {
        let _seq = self.writes.lock();
        let existing = self.catalog.get_segment(id).ok_or(Error::SegmentNotFound(id))?;
        self.require_team(draft.team_id)?;

        let mut segment = draft.into_segment(id, Utc::now())?;
        segment.created_at = existing.created_at;

        self.lmdb.save_segment(&segment).map_err(storage_err)?;
        self.catalog.upsert_segment(segment.clone());
        info!(segment_id = id, "Street segment updated");
        Ok(self.segment_view(segment))
    }

    pub fn delete_segment(&self, id: SegmentId) -> Result<()> {
        let _seq = self.writes.lock();
        self.catalog.get_segment(id).ok_or(Error::SegmentNotFound(id))?;

        self.lmdb.delete_segment(id).map_err(storage_err)?;
        self.catalog.remove_segment(id);
        info!(segment_id = id, "Street segment deleted");
        Ok(())
    }

    // ==================== Snapshot Methods ====================

    /// Write the current catalog to a new snapshot
    pub fn create_snapshot(&self) -> Result<SnapshotDescription> {
        let _seq = self.writes.lock();
        let data = CatalogSnapshotData {
            units: self.catalog.units(),
            teams: self.catalog.teams(),
            segments: self.catalog.segments(),
            created_at: Utc::now().timestamp().max(0) as u64,
        };

        let description = self
            .snapshots
            .create_snapshot(&data)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        info!(snapshot = %description.name, segments = data.segments.len(), "Snapshot created");
        Ok(description)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotDescription>> {
        self.snapshots
            .list_snapshots()
            .map_err(|e| Error::Persistence(e.to_string()))
    }

    pub fn delete_snapshot(&self, snapshot_name: &str) -> Result<()> {
        if !self.snapshots.exists(snapshot_name) {
            return Err(Error::SnapshotNotFound(snapshot_name.to_string()));
        }
        let deleted = self
            .snapshots
            .delete_snapshot(snapshot_name)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        if !deleted {
            return Err(Error::SnapshotNotFound(snapshot_name.to_string()));
        }
        info!(snapshot = snapshot_name, "Snapshot deleted");
        Ok(())
    }

    /// Replace the whole catalog with the content of a snapshot
    pub fn restore_snapshot(&self, snapshot_name: &str, checksum: Option<&str>) -> Result<()> {
        if !self.snapshots.exists(snapshot_name) {
            return Err(Error::SnapshotNotFound(snapshot_name.to_string()));
        }
        let data = self
            .snapshots
            .load_snapshot(snapshot_name, checksum)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let orphans = data
            .segments
            .iter()
            .filter(|s| !data.teams.iter().any(|t| t.id == s.team_id))
            .count();
        if orphans > 0 {
            warn!(snapshot = snapshot_name, orphans, "Snapshot contains segments without a team");
        }

        let mut seq = self.writes.lock();
        self.lmdb
            .replace_all(&data.units, &data.teams, &data.segments)
            .map_err(storage_err)?;
        self.catalog.replace_all(data.units, data.teams, data.segments);

        let (unit, team, segment) = self.catalog.max_ids();
        *seq = IdSequence { unit, team, segment };
        info!(snapshot = snapshot_name, "Catalog restored from snapshot");
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for StorageManager {
    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
        Ok(self.catalog.candidates(query))
    }
}
