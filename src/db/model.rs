use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{query, query_scalar, Postgres, Row, Transaction};

use crate::db::dbclient::DBClient;
use crate::db::schema::{Question, Quiz, QuizState};
use crate::db::store::{QuizStore, QuizTx};

const QUIZ_COLUMNS: &str = "id, id_event, name, state, participant_limit, time_limit_seconds, time_created, time_started, time_ended";

fn quiz_from_row(r: &PgRow) -> anyhow::Result<Quiz> {
    let state: String = r.try_get("state")?;

    Ok(Quiz {
        id: r.try_get("id")?,
        id_event: r.try_get("id_event")?,
        name: r.try_get("name")?,
        state: state.parse()?,
        participant_limit: r.try_get("participant_limit")?,
        time_limit_seconds: r.try_get("time_limit_seconds")?,
        time_created: r.try_get("time_created")?,
        time_started: r.try_get("time_started")?,
        time_ended: r.try_get("time_ended")?,
    })
}

fn count(n: i64) -> u64 {
    n.max(0) as u64
}

pub struct PgQuizTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl QuizStore for DBClient {
    type Tx = PgQuizTx;

    async fn begin(&self) -> anyhow::Result<PgQuizTx> {
        let tx = self.conn().begin().await?;
        Ok(PgQuizTx { tx })
    }
}

#[async_trait]
impl QuizTx for PgQuizTx {
    async fn fetch_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>> {
        let sql = format!("SELECT {} FROM quiz WHERE id_event=$1;", QUIZ_COLUMNS);
        let r = query(&sql)
            .bind(id_event)
            .fetch_optional(&mut self.tx)
            .await?;

        match r {
            None => Ok(None),
            Some(r) => Ok(Some(quiz_from_row(&r)?)),
        }
    }

    async fn lock_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>> {
        let sql = format!("SELECT {} FROM quiz WHERE id_event=$1 FOR UPDATE;", QUIZ_COLUMNS);
        let r = query(&sql)
            .bind(id_event)
            .fetch_optional(&mut self.tx)
            .await?;

        match r {
            None => Ok(None),
            Some(r) => Ok(Some(quiz_from_row(&r)?)),
        }
    }

    async fn list_questions(&mut self, id_quiz: i32) -> anyhow::Result<Vec<Question>> {
        let rows = query(
            "SELECT id, id_quiz, position, question, options, correct_option, points
             FROM quiz_question WHERE id_quiz=$1 ORDER BY position;")
            .bind(id_quiz)
            .fetch_all(&mut self.tx)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for r in rows {
            result.push(Question {
                id: r.try_get("id")?,
                id_quiz: r.try_get("id_quiz")?,
                position: r.try_get("position")?,
                question: r.try_get("question")?,
                options: r.try_get("options")?,
                correct_option: r.try_get("correct_option")?,
                points: r.try_get("points")?,
            });
        }

        Ok(result)
    }

    async fn count_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let n: i64 = query_scalar("SELECT COUNT(*) FROM quiz_question WHERE id_quiz=$1;")
            .bind(id_quiz)
            .fetch_one(&mut self.tx)
            .await?;

        Ok(count(n))
    }

    async fn count_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let n: i64 = query_scalar("SELECT COUNT(*) FROM quiz_attempt WHERE id_quiz=$1;")
            .bind(id_quiz)
            .fetch_one(&mut self.tx)
            .await?;

        Ok(count(n))
    }

    async fn count_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let n: i64 = query_scalar(
            "SELECT COUNT(*) FROM quiz_answer a
             JOIN quiz_attempt t ON t.id = a.id_attempt
             WHERE t.id_quiz=$1;")
            .bind(id_quiz)
            .fetch_one(&mut self.tx)
            .await?;

        Ok(count(n))
    }

    async fn delete_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let r = query(
            "DELETE FROM quiz_answer
             WHERE id_attempt IN (SELECT id FROM quiz_attempt WHERE id_quiz=$1);")
            .bind(id_quiz)
            .execute(&mut self.tx)
            .await?;

        Ok(r.rows_affected())
    }

    async fn delete_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let r = query("DELETE FROM quiz_attempt WHERE id_quiz=$1;")
            .bind(id_quiz)
            .execute(&mut self.tx)
            .await?;

        Ok(r.rows_affected())
    }

    async fn delete_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let r = query("DELETE FROM quiz_question WHERE id_quiz=$1;")
            .bind(id_quiz)
            .execute(&mut self.tx)
            .await?;

        Ok(r.rows_affected())
    }

    async fn delete_quiz(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let r = query("DELETE FROM quiz WHERE id=$1;")
            .bind(id_quiz)
            .execute(&mut self.tx)
            .await?;

        Ok(r.rows_affected())
    }

    async fn set_state(
        &mut self,
        id_quiz: i32,
        state: QuizState,
        time_started: Option<DateTime<Utc>>,
        time_ended: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        query("UPDATE quiz SET state=$2, time_started=$3, time_ended=$4 WHERE id=$1;")
            .bind(id_quiz)
            .bind(state.as_str())
            .bind(time_started)
            .bind(time_ended)
            .execute(&mut self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
