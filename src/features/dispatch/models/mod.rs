mod assignment_rule;
mod candidate;

pub use assignment_rule::{AssignmentRule, CreateAssignmentRule};
pub use candidate::{Candidate, DispatchOutcome, ScoredCandidate};
