use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::db::schema::QuizState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Delete,
    Reset,
    Start,
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Delete => "delete",
            Action::Reset => "reset",
            Action::Start => "start",
            Action::Stop => "stop",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UnconfirmedAction,
    PersistenceError,
    InvalidTransition,
    NoQuestions,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("no quiz exists for event {event_id}")]
    NotFound { event_id: i32 },

    #[error("{action} was not confirmed")]
    UnconfirmedAction { action: Action },

    #[error("cannot {action} a quiz that is {from}")]
    InvalidTransition { action: Action, from: QuizState },

    #[error("quiz for event {event_id} has no questions")]
    NoQuestions { event_id: i32 },

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub success: bool,
    pub error: ErrorKind,
    pub message: String,
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotFound { .. } => ErrorKind::NotFound,
            LifecycleError::UnconfirmedAction { .. } => ErrorKind::UnconfirmedAction,
            LifecycleError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            LifecycleError::NoQuestions { .. } => ErrorKind::NoQuestions,
            LifecycleError::Persistence(_) => ErrorKind::PersistenceError,
        }
    }

    /// Message suitable for showing to the organizer who issued the action.
    pub fn friendly_message(&self) -> String {
        match self {
            LifecycleError::NotFound { event_id } => {
                format!("No quiz has been set up for event **{}**.", event_id)
            }
            LifecycleError::UnconfirmedAction { action: Action::Delete } => format!(
                "Deletion was not confirmed. Type `{}` exactly in the `confirm` option to delete the quiz.",
                super::DELETE_CONFIRMATION_PHRASE
            ),
            LifecycleError::UnconfirmedAction { action } => {
                format!("The {} was not confirmed; set `confirm` to true to proceed.", action)
            }
            LifecycleError::InvalidTransition { action, from } => {
                format!("Cannot {} the quiz while it is **{}**.", action, from)
            }
            LifecycleError::NoQuestions { .. } => {
                "The quiz has no questions yet; add questions before starting it.".to_owned()
            }
            LifecycleError::Persistence(_) => {
                "A database error occurred; nothing was changed. Please try again.".to_owned()
            }
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            success: false,
            error: self.kind(),
            message: self.friendly_message(),
        }
    }
}
