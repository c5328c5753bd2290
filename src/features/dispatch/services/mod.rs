mod assignment_rule_service;
pub mod candidate_service;
mod dispatcher;
pub mod priority_service;
pub mod scoring;

pub use assignment_rule_service::AssignmentRuleService;
pub use candidate_service::{CandidateFilter, CandidatePool};
pub use dispatcher::{DispatchReport, Dispatcher, SweepSummary};
pub use priority_service::PriorityScorer;
