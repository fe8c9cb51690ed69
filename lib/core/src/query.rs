use crate::model::{AdministrativeUnit, StreetSegment, Team};
use crate::normalize::{normalize_locality, normalize_street_name};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// An address to resolve, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub street_name: String,
    pub house_number: i64,
    pub city: String,
    pub state: String,
}

impl AddressQuery {
    /// Build a query, rejecting blank fields
    pub fn new(
        street_name: impl Into<String>,
        house_number: i64,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Result<Self> {
        let query = Self {
            street_name: street_name.into(),
            house_number,
            city: city.into(),
            state: state.into(),
        };

        if query.street_name.trim().is_empty()
            || query.city.trim().is_empty()
            || query.state.trim().is_empty()
        {
            return Err(Error::InvalidInput(
                "Missing required parameters: street, number, city, state".to_string(),
            ));
        }
        Ok(query)
    }

    /// Build a query from raw text fields, parsing the house number
    pub fn parse(street_name: &str, house_number: &str, city: &str, state: &str) -> Result<Self> {
        if house_number.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Missing required parameters: street, number, city, state".to_string(),
            ));
        }
        let number = house_number
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidInput(format!("Invalid house number: {}", house_number)))?;

        Self::new(street_name, number, city, state)
    }

    /// Normalized lookup for the candidate retriever
    pub fn candidate_query(&self, threshold: f32) -> CandidateQuery {
        CandidateQuery {
            street_name: normalize_street_name(&self.street_name),
            city: normalize_locality(&self.city),
            state: normalize_locality(&self.state),
            threshold,
        }
    }
}

/// Normalized catalog lookup: locality must match exactly, street name by
/// trigram similarity strictly above `threshold`
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub threshold: f32,
}

/// A street segment joined with its owning team and unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub segment: StreetSegment,
    pub team: Team,
    pub unit: AdministrativeUnit,
}

/// The team responsible for an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub street_segment: StreetSegment,
    pub team: Team,
    pub ubs: AdministrativeUnit,
    /// Trigram similarity between the query street and the segment street
    pub score: f32,
}

impl Resolution {
    pub fn from_candidate(candidate: Candidate, score: f32) -> Self {
        Self {
            street_segment: candidate.segment,
            team: candidate.team,
            ubs: candidate.unit,
            score,
        }
    }
}
