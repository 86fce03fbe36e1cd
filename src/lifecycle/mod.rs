//! Destructive quiz lifecycle operations: delete, reset and the start/stop
//! transitions between them.
//!
//! Every operation runs in one store transaction and either commits all of
//! its changes or none of them. Confirmation evidence travels with each call;
//! nothing is remembered between calls.

mod error;
mod outcome;
mod visibility;


use chrono::Utc;
use evlog::meta;

use crate::db::schema::{Quiz, QuizState};
use crate::db::store::{QuizStore, QuizTx};
use crate::runtime::get_logger;
use crate::support::numbers::count_noun;

pub use error::{Action, ErrorKind, ErrorPayload, LifecycleError};
pub use outcome::{DeleteOutcome, ImpactSummary, QuizOverview, ResetOutcome, TransitionOutcome};
pub use visibility::Visibility;

/// The exact text an organizer must supply to delete a quiz.
pub const DELETE_CONFIRMATION_PHRASE: &str = "DELETE";

pub fn delete_confirmed(phrase: Option<&str>) -> bool {
    phrase == Some(DELETE_CONFIRMATION_PHRASE)
}

async fn impact_of<T: QuizTx>(tx: &mut T, quiz: &Quiz) -> anyhow::Result<ImpactSummary> {
    Ok(ImpactSummary {
        quiz_name: quiz.name.clone(),
        questions: tx.count_questions(quiz.id).await?,
        attempts: tx.count_attempts(quiz.id).await?,
        answers: tx.count_answers(quiz.id).await?,
    })
}

pub struct QuizLifecycle<S> {
    store: S,
}

impl<S: QuizStore> QuizLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reads the quiz, its questions, what deleting it would remove and which
    /// actions to offer. The transaction is rolled back on return.
    pub async fn overview(&self, event_id: i32) -> Result<QuizOverview, LifecycleError> {
        let mut tx = self.store.begin().await?;

        let quiz = match tx.fetch_quiz(event_id).await? {
            None => return Err(LifecycleError::NotFound { event_id }),
            Some(v) => v,
        };

        let questions = tx.list_questions(quiz.id).await?;
        let impact = impact_of(&mut tx, &quiz).await?;
        let visibility = Visibility::for_counts(impact.questions, impact.attempts);

        Ok(QuizOverview {
            quiz,
            questions,
            impact,
            visibility,
        })
    }

    pub async fn delete_quiz(&self, event_id: i32, confirmation: Option<&str>) -> Result<DeleteOutcome, LifecycleError> {
        if !delete_confirmed(confirmation) {
            get_logger().info("Rejected quiz deletion without the confirmation phrase.", meta! {
                "EventID" => event_id,
            });
            return Err(LifecycleError::UnconfirmedAction { action: Action::Delete });
        }

        let mut tx = self.store.begin().await?;

        let quiz = match tx.lock_quiz(event_id).await? {
            None => return Err(LifecycleError::NotFound { event_id }),
            Some(v) => v,
        };

        let impact = impact_of(&mut tx, &quiz).await?;

        // Children before parents, for stores without cascading constraints.
        let answers = tx.delete_answers(quiz.id).await?;
        let attempts = tx.delete_attempts(quiz.id).await?;
        let questions = tx.delete_questions(quiz.id).await?;
        tx.delete_quiz(quiz.id).await?;

        tx.commit().await?;

        get_logger().info("Deleted quiz.", meta! {
            "EventID" => event_id,
            "QuizID" => quiz.id,
            "QuizName" => quiz.name,
            "Questions" => questions,
            "Attempts" => attempts,
            "Answers" => answers,
        });

        Ok(DeleteOutcome {
            success: true,
            message: format!("{} deleted", quiz.name),
            impact,
        })
    }

    /// Removes every attempt and answer, keeping the questions, and returns
    /// the quiz to `inactive`. Resetting a quiz with no attempts succeeds with
    /// zero counts.
    pub async fn reset_quiz(&self, event_id: i32, confirmed: bool) -> Result<ResetOutcome, LifecycleError> {
        if !confirmed {
            get_logger().info("Rejected quiz reset without confirmation.", meta! {
                "EventID" => event_id,
            });
            return Err(LifecycleError::UnconfirmedAction { action: Action::Reset });
        }

        let mut tx = self.store.begin().await?;

        let quiz = match tx.lock_quiz(event_id).await? {
            None => return Err(LifecycleError::NotFound { event_id }),
            Some(v) => v,
        };

        let answers_removed = tx.delete_answers(quiz.id).await?;
        let attempts_removed = tx.delete_attempts(quiz.id).await?;
        tx.set_state(quiz.id, QuizState::Inactive, None, None).await?;

        tx.commit().await?;

        get_logger().info("Reset quiz.", meta! {
            "EventID" => event_id,
            "QuizID" => quiz.id,
            "QuizName" => quiz.name,
            "PreviousState" => quiz.state.as_str(),
            "Attempts" => attempts_removed,
            "Answers" => answers_removed,
        });

        Ok(ResetOutcome {
            success: true,
            attempts_removed,
            answers_removed,
            message: format!("{} reset; {} removed", quiz.name, count_noun(attempts_removed, "attempt")),
        })
    }

    pub async fn start_quiz(&self, event_id: i32) -> Result<TransitionOutcome, LifecycleError> {
        let mut tx = self.store.begin().await?;

        let quiz = match tx.lock_quiz(event_id).await? {
            None => return Err(LifecycleError::NotFound { event_id }),
            Some(v) => v,
        };

        if quiz.state != QuizState::Inactive {
            return Err(LifecycleError::InvalidTransition { action: Action::Start, from: quiz.state });
        }

        if tx.count_questions(quiz.id).await? == 0 {
            return Err(LifecycleError::NoQuestions { event_id });
        }

        tx.set_state(quiz.id, QuizState::Active, Some(Utc::now()), None).await?;
        tx.commit().await?;

        get_logger().info("Started quiz.", meta! {
            "EventID" => event_id,
            "QuizID" => quiz.id,
        });

        Ok(TransitionOutcome {
            success: true,
            message: format!("{} started", quiz.name),
        })
    }

    pub async fn stop_quiz(&self, event_id: i32) -> Result<TransitionOutcome, LifecycleError> {
        let mut tx = self.store.begin().await?;

        let quiz = match tx.lock_quiz(event_id).await? {
            None => return Err(LifecycleError::NotFound { event_id }),
            Some(v) => v,
        };

        if quiz.state != QuizState::Active {
            return Err(LifecycleError::InvalidTransition { action: Action::Stop, from: quiz.state });
        }

        tx.set_state(quiz.id, QuizState::Stopped, quiz.time_started, Some(Utc::now())).await?;
        tx.commit().await?;

        get_logger().info("Stopped quiz.", meta! {
            "EventID" => event_id,
            "QuizID" => quiz.id,
        });

        Ok(TransitionOutcome {
            success: true,
            message: format!("{} stopped", quiz.name),
        })
    }
}
