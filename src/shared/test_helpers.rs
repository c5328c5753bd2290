use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fake::faker::internet::en::Username;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use crate::core::config::DispatchConfig;
use crate::core::error::{AppError, Result};
use crate::features::dispatch::repository::AssignmentRuleRepository;
use crate::features::dispatch::models::AssignmentRule;
use crate::features::dispatch::{AssignmentRuleService, Dispatcher};
use crate::features::feedback::repository::FeedbackRepository;
use crate::features::feedback::FeedbackService;
use crate::features::notifications::{NotificationKind, NotificationPayload, Notifier};
use crate::features::photos::PhotoStore;
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::features::tickets::models::{
    CreateTicket, NewStatusHistory, Ticket, TicketStatus, TicketStatusHistory, UrgencyLevel,
};
use crate::features::tickets::{TicketRepository, TicketService, WorkflowService};
use crate::modules::memory::MemoryStore;
use crate::shared::geo::GeoPoint;
use crate::shared::types::UserRole;

/// Notifier that keeps everything it was asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Uuid, NotificationKind, NotificationPayload)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Uuid, NotificationKind, NotificationPayload)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Kinds sent to one user, in delivery order
    pub fn sent_to(&self, user_id: Uuid) -> Vec<NotificationKind> {
        self.sent()
            .into_iter()
            .filter(|(to, _, _)| *to == user_id)
            .map(|(_, kind, _)| kind)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: NotificationPayload,
    ) -> Result<()> {
        self.sent.lock().unwrap().push((user_id, kind, payload));
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: Uuid, _: NotificationKind, _: NotificationPayload) -> Result<()> {
        Err(AppError::ExternalServiceError(
            "notification channel down".to_string(),
        ))
    }
}

/// In-memory store plus services wired the way the binary wires them
pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    delivery: Arc<dyn Notifier>,
    dispatch_config: DispatchConfig,
}

impl TestEngine {
    pub fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self {
            store: Arc::new(MemoryStore::new()),
            delivery: notifier.clone(),
            notifier,
            dispatch_config: DispatchConfig::default(),
        }
    }

    pub fn with_dispatch_config(dispatch_config: DispatchConfig) -> Self {
        Self {
            dispatch_config,
            ..Self::new()
        }
    }

    /// Every delivery fails; `notifier` stays empty
    pub fn with_failing_notifier() -> Self {
        Self {
            delivery: Arc::new(FailingNotifier),
            ..Self::new()
        }
    }

    pub fn add_user(&self) -> Uuid {
        self.store
            .add_account(&Username().fake::<String>(), UserRole::User, true)
    }

    pub fn add_technician(&self) -> Uuid {
        let id = self
            .store
            .add_account(&Username().fake::<String>(), UserRole::Technician, true);
        self.store.set_display_name(id, &Name().fake::<String>());
        id
    }

    pub async fn add_technician_at(&self, location: GeoPoint) -> Uuid {
        let id = self.add_technician();
        self.store
            .set_location(id, Some(location))
            .await
            .unwrap();
        id
    }

    /// A PENDING ticket with its creation history row, not yet dispatched
    pub async fn insert_ticket(
        &self,
        created_by: Uuid,
        category_id: Uuid,
        urgency_level: UrgencyLevel,
        location: Option<GeoPoint>,
    ) -> Ticket {
        let data = CreateTicket {
            title: "Broken light in corridor".to_string(),
            description: String::new(),
            category_id,
            created_by,
            location,
            address_description: String::new(),
            urgency_level,
        };
        let (ticket, _) = TicketRepository::insert(
            self.store.as_ref(),
            &data,
            NewStatusHistory::new(None, TicketStatus::Pending, Some(created_by), "ticket created"),
        )
        .await
        .unwrap();
        ticket
    }

    pub fn tickets(&self) -> Arc<dyn TicketRepository> {
        self.store.clone()
    }

    pub fn roster(&self) -> Arc<dyn TechnicianRoster> {
        self.store.clone()
    }

    pub fn presence(&self) -> Arc<dyn PresenceRepository> {
        self.store.clone()
    }

    pub fn rules(&self) -> Arc<dyn AssignmentRuleRepository> {
        self.store.clone()
    }

    pub fn photos(&self) -> Arc<dyn PhotoStore> {
        self.store.clone()
    }

    fn feedback(&self) -> Arc<dyn FeedbackRepository> {
        self.store.clone()
    }

    pub async fn rule(&self) -> AssignmentRule {
        self.store.ensure_default().await.unwrap()
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.tickets(),
            self.roster(),
            self.presence(),
            self.delivery.clone(),
            self.dispatch_config.clone(),
        )
    }

    pub fn workflow(&self) -> WorkflowService {
        WorkflowService::new(
            self.tickets(),
            self.roster(),
            self.photos(),
            self.delivery.clone(),
            Arc::new(self.dispatcher()),
            Arc::new(AssignmentRuleService::new(self.rules())),
        )
    }

    pub fn ticket_service(&self) -> TicketService {
        TicketService::new(
            self.tickets(),
            Arc::new(self.dispatcher()),
            Arc::new(AssignmentRuleService::new(self.rules())),
        )
    }

    pub fn feedback_service(&self) -> FeedbackService {
        FeedbackService::new(self.tickets(), self.feedback())
    }

    pub async fn ticket(&self, ticket_id: Uuid) -> Ticket {
        TicketRepository::find_by_id(self.store.as_ref(), ticket_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn history(&self, ticket_id: Uuid) -> Vec<TicketStatusHistory> {
        self.store.history(ticket_id).await.unwrap()
    }
}
