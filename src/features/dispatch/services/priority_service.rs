use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::core::error::Result;
use crate::features::tickets::models::{Ticket, UrgencyLevel};
use crate::features::tickets::repository::TicketRepository;
use crate::shared::constants::{
    CATEGORY_WEIGHTS, CATEGORY_WEIGHT_DEFAULT, HEAT_LOOKBACK_DAYS, HEAT_RADIUS_METERS,
    HEAT_WEIGHT_CAP, HEAT_WEIGHT_PER_TICKET, URGENCY_WEIGHT_CRITICAL, URGENCY_WEIGHT_DEFAULT,
    URGENCY_WEIGHT_HIGH, URGENCY_WEIGHT_LOW, URGENCY_WEIGHT_MEDIUM,
};

pub fn urgency_weight(urgency: &UrgencyLevel) -> f64 {
    match urgency {
        UrgencyLevel::Low => URGENCY_WEIGHT_LOW,
        UrgencyLevel::Medium => URGENCY_WEIGHT_MEDIUM,
        UrgencyLevel::High => URGENCY_WEIGHT_HIGH,
        UrgencyLevel::Critical => URGENCY_WEIGHT_CRITICAL,
        UrgencyLevel::Other(_) => URGENCY_WEIGHT_DEFAULT,
    }
}

pub fn category_weight(category_name: &str) -> f64 {
    CATEGORY_WEIGHTS
        .iter()
        .find(|(name, _)| *name == category_name)
        .map(|(_, weight)| *weight)
        .unwrap_or(CATEGORY_WEIGHT_DEFAULT)
}

/// 0.1 per nearby recent ticket, capped at 2.0
pub fn heat_weight(nearby_count: i64) -> f64 {
    (nearby_count as f64 * HEAT_WEIGHT_PER_TICKET).min(HEAT_WEIGHT_CAP)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes a ticket's priority from urgency, category and local incident density
pub struct PriorityScorer {
    tickets: Arc<dyn TicketRepository>,
}

impl PriorityScorer {
    pub fn new(tickets: Arc<dyn TicketRepository>) -> Self {
        Self { tickets }
    }

    /// Priority score rounded to 2 decimals. Heat only applies to tickets with a location.
    pub async fn score(&self, ticket: &Ticket, now: DateTime<Utc>) -> Result<f64> {
        let mut score = urgency_weight(&ticket.urgency_level) + category_weight(&ticket.category_name);

        if let Some(location) = ticket.location {
            let since = now - Duration::days(HEAT_LOOKBACK_DAYS);
            let nearby = self
                .tickets
                .count_nearby_since(location, HEAT_RADIUS_METERS, since, ticket.id)
                .await?;

            tracing::debug!("Ticket {} heat: {} nearby tickets", ticket.id, nearby);
            score += heat_weight(nearby);
        }

        Ok(round2(score))
    }
}
