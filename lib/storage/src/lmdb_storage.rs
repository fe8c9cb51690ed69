// LMDB-backed record store for units, teams and street segments
use anyhow::Result;
use heed::byteorder::BE;
use heed::types::{Bytes, U64};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use teamroute_core::{AdministrativeUnit, StreetSegment, Team};

const DB_UNITS: &str = "units";
const DB_TEAMS: &str = "teams";
const DB_SEGMENTS: &str = "segments";

type RecordDb = Database<U64<BE>, Bytes>;

pub struct LmdbStorage {
    env: Arc<Env>,
    units_db: RecordDb,
    teams_db: RecordDb,
    segments_db: RecordDb,
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(1024 * 1024 * 1024) // 1GB
                .max_dbs(4)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let units_db = env.create_database(&mut wtxn, Some(DB_UNITS))?;
        let teams_db = env.create_database(&mut wtxn, Some(DB_TEAMS))?;
        let segments_db = env.create_database(&mut wtxn, Some(DB_SEGMENTS))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            units_db,
            teams_db,
            segments_db,
        })
    }

    fn put<T: Serialize>(&self, db: RecordDb, id: u64, record: &T) -> Result<()> {
        let data = bincode::serialize(record)?;
        let mut wtxn = self.env.write_txn()?;
        db.put(&mut wtxn, &id, data.as_slice())?;
        wtxn.commit()?;
        Ok(())
    }

    fn delete(&self, db: RecordDb, id: u64) -> Result<bool> {
        let mut wtxn = self.env.write_txn()?;
        let existed = db.delete(&mut wtxn, &id)?;
        wtxn.commit()?;
        Ok(existed)
    }

    fn load_all<T: DeserializeOwned>(&self, db: RecordDb) -> Result<Vec<T>> {
        let rtxn = self.env.read_txn()?;
        let mut records = Vec::new();
        for entry in db.iter(&rtxn)? {
            let (_, data) = entry?;
            records.push(bincode::deserialize(data)?);
        }
        Ok(records)
    }

    fn put_in<T: Serialize>(wtxn: &mut RwTxn, db: RecordDb, id: u64, record: &T) -> Result<()> {
        let data = bincode::serialize(record)?;
        db.put(wtxn, &id, data.as_slice())?;
        Ok(())
    }

    pub fn save_unit(&self, unit: &AdministrativeUnit) -> Result<()> {
        self.put(self.units_db, unit.id, unit)
    }

    pub fn delete_unit(&self, id: u64) -> Result<bool> {
        self.delete(self.units_db, id)
    }

    pub fn load_units(&self) -> Result<Vec<AdministrativeUnit>> {
        self.load_all(self.units_db)
    }

    pub fn save_team(&self, team: &Team) -> Result<()> {
        self.put(self.teams_db, team.id, team)
    }

    pub fn delete_team(&self, id: u64) -> Result<bool> {
        self.delete(self.teams_db, id)
    }

    pub fn load_teams(&self) -> Result<Vec<Team>> {
        self.load_all(self.teams_db)
    }

    pub fn save_segment(&self, segment: &StreetSegment) -> Result<()> {
        self.put(self.segments_db, segment.id, segment)
    }

    pub fn delete_segment(&self, id: u64) -> Result<bool> {
        self.delete(self.segments_db, id)
    }

    pub fn load_segments(&self) -> Result<Vec<StreetSegment>> {
        self.load_all(self.segments_db)
    }

    /// Replace every record in one transaction
    pub fn replace_all(
        &self,
        units: &[AdministrativeUnit],
        teams: &[Team],
        segments: &[StreetSegment],
    ) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.units_db.clear(&mut wtxn)?;
        self.teams_db.clear(&mut wtxn)?;
        self.segments_db.clear(&mut wtxn)?;

        for unit in units {
            Self::put_in(&mut wtxn, self.units_db, unit.id, unit)?;
        }
        for team in teams {
            Self::put_in(&mut wtxn, self.teams_db, team.id, team)?;
        }
        for segment in segments {
            Self::put_in(&mut wtxn, self.segments_db, segment.id, segment)?;
        }

        wtxn.commit()?;
        Ok(())
    }
}
