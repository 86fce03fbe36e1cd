use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizState {
    Inactive,
    Active,
    Stopped,
}

impl QuizState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizState::Inactive => "inactive",
            QuizState::Active => "active",
            QuizState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(QuizState::Inactive),
            "active" => Ok(QuizState::Active),
            "stopped" => Ok(QuizState::Stopped),
            _ => Err(anyhow::anyhow!("unknown quiz state '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: i32,
    pub id_event: i32,
    pub name: String,
    pub state: QuizState,
    pub participant_limit: i32,
    pub time_limit_seconds: Option<i32>,
    pub time_created: DateTime<Utc>,
    pub time_started: Option<DateTime<Utc>>,
    pub time_ended: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: i32,
    pub id_quiz: i32,
    pub position: i32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: String,
    pub points: i32,
}

#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: i32,
    pub id_quiz: i32,
    pub id_participant: i32,
    pub time_started: DateTime<Utc>,
    pub time_submitted: Option<DateTime<Utc>>,
    pub score: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub id: i32,
    pub id_attempt: i32,
    pub id_question: i32,
    pub answer: String,
    pub correct: bool,
}
