use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::dispatch::{AssignmentRuleService, DispatchReport, Dispatcher};
use crate::features::tickets::dtos::{CreateTicketDto, JobListItemDto, UpdateTicketDto};
use crate::features::tickets::models::{
    CreateTicket, NewStatusHistory, Ticket, TicketChange, TicketStatus, TicketStatusHistory,
};
use crate::features::tickets::repository::TicketRepository;

/// A new ticket and what dispatch made of it
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    pub ticket: Ticket,
    /// `None` when dispatch failed; the ticket stays unassigned for the next sweep
    pub dispatch: Option<DispatchReport>,
}

/// Service for ticket operations
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    dispatcher: Arc<Dispatcher>,
    rules: Arc<AssignmentRuleService>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        dispatcher: Arc<Dispatcher>,
        rules: Arc<AssignmentRuleService>,
    ) -> Self {
        Self {
            tickets,
            dispatcher,
            rules,
        }
    }

    /// Report a problem: insert it as PENDING with its creation history row,
    /// then dispatch it under the active rule.
    pub async fn create(&self, created_by: Uuid, dto: CreateTicketDto) -> Result<CreatedTicket> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if dto.latitude.is_some() != dto.longitude.is_some() {
            return Err(AppError::Validation(
                "Latitude and longitude must be given together".to_string(),
            ));
        }

        let data = CreateTicket {
            location: dto.location(),
            title: dto.title.trim().to_string(),
            description: dto.description,
            category_id: dto.category_id,
            created_by,
            address_description: dto.address_description,
            urgency_level: dto.urgency_level,
        };

        let (ticket, _) = self
            .tickets
            .insert(
                &data,
                NewStatusHistory::new(None, TicketStatus::Pending, Some(created_by), "ticket created"),
            )
            .await?;

        tracing::info!(
            "Ticket created: id={}, category={}, urgency={}, by={}",
            ticket.id,
            ticket.category_name,
            ticket.urgency_level,
            created_by
        );

        let dispatch = match self.dispatch(ticket.id).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!("Failed to dispatch new ticket {}: {:?}", ticket.id, e);
                None
            }
        };

        let ticket = match &dispatch {
            Some(report) => report.ticket.clone(),
            None => ticket,
        };

        Ok(CreatedTicket { ticket, dispatch })
    }

    /// Dispatch (or re-dispatch) a PENDING ticket under the active rule
    pub async fn dispatch(&self, ticket_id: Uuid) -> Result<DispatchReport> {
        let rule = self.rules.active_rule().await?;
        self.dispatcher.dispatch(ticket_id, &rule).await
    }

    /// Creator rewrites the descriptive fields of a ticket that is still
    /// PENDING. Status, assignment and priority are left alone; the edit is
    /// recorded as a same-status history row.
    pub async fn update(
        &self,
        ticket_id: Uuid,
        edited_by: Uuid,
        dto: UpdateTicketDto,
    ) -> Result<Ticket> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let details = dto.into_details();
        if details.title.is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }

        let ticket = self.get(ticket_id).await?;

        if ticket.created_by != edited_by {
            return Err(AppError::Forbidden(format!(
                "Only the creator may edit ticket {}",
                ticket.id
            )));
        }

        if ticket.status != TicketStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: ticket.status,
                to: TicketStatus::Pending,
            });
        }

        let mut edited = Vec::new();
        if details.title != ticket.title {
            edited.push("title");
        }
        if details.description != ticket.description {
            edited.push("description");
        }
        if details.category_id != ticket.category_id {
            edited.push("category");
        }
        if details.address_description != ticket.address_description {
            edited.push("location note");
        }
        if details.urgency_level != ticket.urgency_level {
            edited.push("urgency");
        }
        let comment = if edited.is_empty() {
            "edited by creator".to_string()
        } else {
            format!("edited by creator: {}", edited.join(", "))
        };

        let history = NewStatusHistory::new(
            Some(ticket.status),
            ticket.status,
            Some(edited_by),
            comment,
        );
        let mut change = TicketChange::from_ticket(&ticket, history);
        change.details = Some(details);

        let (ticket, entry) = self.tickets.apply_change(change).await?;

        tracing::info!("Ticket {} {}", ticket.id, entry.comment);

        Ok(ticket)
    }

    pub async fn get(&self, ticket_id: Uuid) -> Result<Ticket> {
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))
    }

    /// Full audit trail, oldest first
    pub async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketStatusHistory>> {
        let ticket = self.get(ticket_id).await?;
        self.tickets.history(ticket.id).await
    }

    /// Everything assigned to the technician that is not CLOSED or REJECTED,
    /// newest first, flagged when overdue
    pub async fn job_list(
        &self,
        technician_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobListItemDto>> {
        let tickets = self.tickets.list_assigned_active(technician_id).await?;
        Ok(tickets
            .into_iter()
            .map(|t| JobListItemDto::from_ticket(t, now))
            .collect())
    }
}
