mod assignment_rule_dto;

pub use assignment_rule_dto::UpdateAssignmentRuleDto;
