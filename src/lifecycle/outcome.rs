use serde::Serialize;

use crate::db::schema::{Question, Quiz};
use crate::lifecycle::visibility::Visibility;

/// What a destructive action would remove, counted inside the transaction
/// that performs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub quiz_name: String,
    pub questions: u64,
    pub attempts: u64,
    pub answers: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
    pub impact: ImpactSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetOutcome {
    pub success: bool,
    pub attempts_removed: u64,
    pub answers_removed: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct QuizOverview {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
    pub impact: ImpactSummary,
    pub visibility: Visibility,
}
