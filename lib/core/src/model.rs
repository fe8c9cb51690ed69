use crate::normalize::{
    normalize_digits, normalize_locality, normalize_parity, normalize_street_name,
    normalize_street_type, postal_prefix,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UnitId = u64;
pub type TeamId = u64;
pub type SegmentId = u64;

/// Which house numbers of a range belong to a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityRule {
    Even,
    Odd,
    All,
}

impl ParityRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParityRule::Even => "even",
            ParityRule::Odd => "odd",
            ParityRule::All => "all",
        }
    }
}

impl fmt::Display for ParityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParityRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "even" => Ok(ParityRule::Even),
            "odd" => Ok(ParityRule::Odd),
            "all" => Ok(ParityRule::All),
            _ => Err(Error::InvalidParity(s.to_string())),
        }
    }
}

/// A basic health unit (UBS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdministrativeUnit {
    pub id: UnitId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A healthcare team working out of one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(rename = "ubs_id")]
    pub unit_id: UnitId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A numbered stretch of a street assigned to one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetSegment {
    pub id: SegmentId,
    /// Canonical form, used for matching
    pub street_name: String,
    /// As typed by the administrator, used for display
    pub original_street_name: String,
    pub street_type: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub start_number: i64,
    pub end_number: i64,
    #[serde(rename = "cep_prefix")]
    pub postal_prefix: String,
    #[serde(rename = "even_odd")]
    pub parity: ParityRule,
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub cep: String,
}

/// Payload for creating or replacing a team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamDraft {
    pub name: String,
    pub ubs_id: UnitId,
}

/// Payload for creating or replacing a street segment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentDraft {
    pub street_name: String,
    pub street_type: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub start_number: i64,
    #[serde(default)]
    pub end_number: i64,
    #[serde(default)]
    pub cep_prefix: String,
    pub even_odd: String,
    pub team_id: TeamId,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

impl UnitDraft {
    pub fn into_unit(self, id: UnitId, now: DateTime<Utc>) -> Result<AdministrativeUnit> {
        require("name", &self.name)?;
        require("address", &self.address)?;
        require("city", &self.city)?;
        require("state", &self.state)?;
        require("cep", &self.cep)?;

        Ok(AdministrativeUnit {
            id,
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: normalize_locality(&self.city),
            state: normalize_locality(&self.state),
            postal_code: normalize_digits(&self.cep),
            created_at: now,
            updated_at: now,
        })
    }
}

impl TeamDraft {
    pub fn into_team(self, id: TeamId, now: DateTime<Utc>) -> Result<Team> {
        require("name", &self.name)?;

        Ok(Team {
            id,
            name: self.name.trim().to_string(),
            unit_id: self.ubs_id,
            created_at: now,
            updated_at: now,
        })
    }
}

impl SegmentDraft {
    /// Normalizes the draft and checks the range and parity invariants.
    pub fn into_segment(self, id: SegmentId, now: DateTime<Utc>) -> Result<StreetSegment> {
        require("street_name", &self.street_name)?;
        require("street_type", &self.street_type)?;
        require("neighborhood", &self.neighborhood)?;
        require("city", &self.city)?;
        require("state", &self.state)?;

        if self.start_number > self.end_number {
            return Err(Error::InvalidRange {
                start: self.start_number,
                end: self.end_number,
            });
        }
        let parity = normalize_parity(&self.even_odd)?;

        Ok(StreetSegment {
            id,
            street_name: normalize_street_name(&self.street_name),
            original_street_name: self.street_name,
            street_type: normalize_street_type(&self.street_type),
            neighborhood: normalize_locality(&self.neighborhood),
            city: normalize_locality(&self.city),
            state: normalize_locality(&self.state),
            start_number: self.start_number,
            end_number: self.end_number,
            postal_prefix: postal_prefix(&self.cep_prefix),
            parity,
            team_id: self.team_id,
            created_at: now,
            updated_at: now,
        })
    }
}
