use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::feedback::dtos::SubmitFeedbackDto;
use crate::features::feedback::models::{CreateFeedback, TicketFeedback};
use crate::features::feedback::repository::FeedbackRepository;
use crate::features::tickets::repository::TicketRepository;
use crate::shared::types::Actor;

/// Service for post-completion ratings
pub struct FeedbackService {
    tickets: Arc<dyn TicketRepository>,
    feedback: Arc<dyn FeedbackRepository>,
}

impl FeedbackService {
    pub fn new(tickets: Arc<dyn TicketRepository>, feedback: Arc<dyn FeedbackRepository>) -> Self {
        Self { tickets, feedback }
    }

    /// Rate the technician who did the work. Only the creator may rate, only
    /// once, and only after the ticket is COMPLETED or CLOSED.
    pub async fn submit(
        &self,
        ticket_id: Uuid,
        actor: Actor,
        dto: SubmitFeedbackDto,
    ) -> Result<TicketFeedback> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))?;

        if ticket.created_by != actor.user_id {
            return Err(AppError::Forbidden(
                "Only the ticket creator can leave feedback".to_string(),
            ));
        }

        if !ticket.status.is_finished() {
            return Err(AppError::BadRequest(format!(
                "Feedback is only accepted for finished tickets (status is {})",
                ticket.status
            )));
        }

        let technician_id = ticket.assigned_to.ok_or_else(|| {
            AppError::BadRequest("Ticket has no technician to rate".to_string())
        })?;

        if self.feedback.find_by_ticket(ticket.id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Feedback for ticket '{}' already submitted",
                ticket.id
            )));
        }

        let feedback = self
            .feedback
            .insert(&CreateFeedback {
                ticket_id: ticket.id,
                created_by: actor.user_id,
                technician_id,
                overall_rating: dto.overall_rating,
                response_speed_rating: dto.response_speed_rating,
                work_quality_rating: dto.work_quality_rating,
                politeness_rating: dto.politeness_rating,
                cleanliness_rating: dto.cleanliness_rating,
                comment: dto.comment,
            })
            .await?;

        tracing::info!(
            "Feedback {} for ticket {}: technician={}, overall={}",
            feedback.id,
            ticket.id,
            technician_id,
            feedback.overall_rating
        );

        Ok(feedback)
    }

    pub async fn get(&self, ticket_id: Uuid) -> Result<Option<TicketFeedback>> {
        self.feedback.find_by_ticket(ticket_id).await
    }
}
