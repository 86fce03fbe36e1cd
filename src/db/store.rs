use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::schema::{Question, Quiz, QuizState};

/// Something that can open quiz transactions.
#[async_trait]
pub trait QuizStore: Send + Sync {
    type Tx: QuizTx;

    async fn begin(&self) -> anyhow::Result<Self::Tx>;
}

/// A single open transaction over the quiz tables.
///
/// Dropping a transaction without calling [`QuizTx::commit`] rolls back every
/// change made through it.
#[async_trait]
pub trait QuizTx: Send {
    async fn fetch_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>>;

    /// Like `fetch_quiz`, but holds the quiz row until the transaction ends so
    /// concurrent writers on the same quiz are serialized.
    async fn lock_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>>;

    async fn list_questions(&mut self, id_quiz: i32) -> anyhow::Result<Vec<Question>>;

    async fn count_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64>;
    async fn count_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64>;
    async fn count_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64>;

    // Each delete returns the number of rows it removed.
    async fn delete_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64>;
    async fn delete_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64>;
    async fn delete_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64>;
    async fn delete_quiz(&mut self, id_quiz: i32) -> anyhow::Result<u64>;

    async fn set_state(
        &mut self,
        id_quiz: i32,
        state: QuizState,
        time_started: Option<DateTime<Utc>>,
        time_ended: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;

    async fn commit(self) -> anyhow::Result<()>;
}
