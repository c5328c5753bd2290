use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::geo::GeoPoint;

/// Current location and availability of a technician
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianPresence {
    pub technician_id: Uuid,
    pub location: Option<GeoPoint>,
    pub is_available: bool,
    pub updated_at: DateTime<Utc>,
}

impl TechnicianPresence {
    /// Record created lazily on first touch: available, location unknown
    pub fn initial(technician_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            technician_id,
            location: None,
            is_available: true,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TechnicianPresenceRow {
    pub technician_id: Uuid,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_available: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<TechnicianPresenceRow> for TechnicianPresence {
    fn from(row: TechnicianPresenceRow) -> Self {
        Self {
            technician_id: row.technician_id,
            location: GeoPoint::from_parts(row.lat, row.lon),
            is_available: row.is_available,
            updated_at: row.updated_at,
        }
    }
}

/// Availability as seen by the dispatcher. A missing presence record is
/// `Unknown`, which still counts as available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Availability {
    Available { location: Option<GeoPoint> },
    Unavailable,
    Unknown,
}

impl Availability {
    pub fn from_presence(presence: Option<&TechnicianPresence>) -> Self {
        match presence {
            Some(p) if p.is_available => Availability::Available {
                location: p.location,
            },
            Some(_) => Availability::Unavailable,
            None => Availability::Unknown,
        }
    }

    pub fn accepts_work(&self) -> bool {
        !matches!(self, Availability::Unavailable)
    }

    pub fn location(&self) -> Option<GeoPoint> {
        match self {
            Availability::Available { location } => *location,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_presence_is_unknown_but_accepts_work() {
        let availability = Availability::from_presence(None);
        assert_eq!(availability, Availability::Unknown);
        assert!(availability.accepts_work());
        assert_eq!(availability.location(), None);
    }

    #[test]
    fn test_unavailable_presence_rejects_work() {
        let mut presence = TechnicianPresence::initial(Uuid::new_v4(), Utc::now());
        presence.is_available = false;
        presence.location = Some(GeoPoint::new(14.07, 100.60));
        let availability = Availability::from_presence(Some(&presence));
        assert!(!availability.accepts_work());
        assert_eq!(availability.location(), None);
    }

    #[test]
    fn test_available_presence_carries_location() {
        let mut presence = TechnicianPresence::initial(Uuid::new_v4(), Utc::now());
        presence.location = Some(GeoPoint::new(14.07, 100.60));
        let availability = Availability::from_presence(Some(&presence));
        assert_eq!(availability.location(), Some(GeoPoint::new(14.07, 100.60)));
    }
}
