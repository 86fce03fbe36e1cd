use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::schema::{Answer, Attempt, Question, Quiz, QuizState};
use crate::db::store::{QuizStore, QuizTx};

/// Steps of a transaction that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    DeleteAnswers,
    DeleteAttempts,
    DeleteQuestions,
    DeleteQuiz,
    SetState,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i32,
    quizzes: BTreeMap<i32, Quiz>,
    questions: Vec<Question>,
    attempts: Vec<Attempt>,
    answers: Vec<Answer>,
}

impl Tables {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn attempt_ids(&self, id_quiz: i32) -> Vec<i32> {
        self.attempts.iter().filter(|a| a.id_quiz == id_quiz).map(|a| a.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub quiz: bool,
    pub questions: usize,
    pub attempts: usize,
    pub answers: usize,
}

/// Whole-table snapshot store. A transaction owns the table lock from
/// `begin` until it is committed or dropped, so transactions are serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_at: Arc<std::sync::Mutex<Option<FailPoint>>>,
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    fail_at: Option<FailPoint>,
}

impl MemoryStore {
    pub fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail_at.lock().unwrap() = point;
    }

    /// Adds a quiz with `questions` questions and `attempts` attempts, each
    /// attempt answering the first `answers_per_attempt` questions.
    pub async fn seed(
        &self,
        id_event: i32,
        name: &str,
        questions: usize,
        attempts: usize,
        answers_per_attempt: usize,
    ) -> i32 {
        let mut t = self.tables.lock().await;

        let id_quiz = t.id();
        let state = if attempts > 0 { QuizState::Active } else { QuizState::Inactive };
        let time_started = if attempts > 0 { Some(Utc::now()) } else { None };
        t.quizzes.insert(id_quiz, Quiz {
            id: id_quiz,
            id_event,
            name: name.to_owned(),
            state,
            participant_limit: 100,
            time_limit_seconds: Some(30),
            time_created: Utc::now(),
            time_started,
            time_ended: None,
        });

        let mut question_ids = Vec::new();
        for i in 0..questions {
            let id = t.id();
            question_ids.push(id);
            t.questions.push(Question {
                id,
                id_quiz,
                position: i as i32 + 1,
                question: format!("Question {}", i + 1),
                options: vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "d".to_owned()],
                correct_option: "a".to_owned(),
                points: 1,
            });
        }

        for p in 0..attempts {
            let id_attempt = t.id();
            t.attempts.push(Attempt {
                id: id_attempt,
                id_quiz,
                id_participant: p as i32 + 1,
                time_started: Utc::now(),
                time_submitted: Some(Utc::now()),
                score: Some(answers_per_attempt as i32),
            });

            for id_question in question_ids.iter().take(answers_per_attempt) {
                let id = t.id();
                t.answers.push(Answer {
                    id,
                    id_attempt,
                    id_question: *id_question,
                    answer: "a".to_owned(),
                    correct: true,
                });
            }
        }

        id_quiz
    }

    pub async fn counts(&self, id_quiz: i32) -> RowCounts {
        let t = self.tables.lock().await;
        let attempt_ids = t.attempt_ids(id_quiz);

        RowCounts {
            quiz: t.quizzes.contains_key(&id_quiz),
            questions: t.questions.iter().filter(|q| q.id_quiz == id_quiz).count(),
            attempts: attempt_ids.len(),
            answers: t.answers.iter().filter(|a| attempt_ids.contains(&a.id_attempt)).count(),
        }
    }

    pub async fn quiz(&self, id_quiz: i32) -> Option<Quiz> {
        self.tables.lock().await.quizzes.get(&id_quiz).cloned()
    }

    /// Rows whose parent no longer exists, across every quiz.
    pub async fn orphans(&self) -> usize {
        let t = self.tables.lock().await;

        let questions = t.questions.iter().filter(|q| !t.quizzes.contains_key(&q.id_quiz)).count();
        let attempts = t.attempts.iter().filter(|a| !t.quizzes.contains_key(&a.id_quiz)).count();
        let answers = t.answers.iter()
            .filter(|a| !t.attempts.iter().any(|parent| parent.id == a.id_attempt))
            .count();

        questions + attempts + answers
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> anyhow::Result<MemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        let fail_at = *self.fail_at.lock().unwrap();

        Ok(MemoryTx { guard, work, fail_at })
    }
}

impl MemoryTx {
    fn check(&self, point: FailPoint) -> anyhow::Result<()> {
        if self.fail_at == Some(point) {
            return Err(anyhow!("injected failure at {:?}", point));
        }
        Ok(())
    }
}

#[async_trait]
impl QuizTx for MemoryTx {
    async fn fetch_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>> {
        Ok(self.work.quizzes.values().find(|q| q.id_event == id_event).cloned())
    }

    async fn lock_quiz(&mut self, id_event: i32) -> anyhow::Result<Option<Quiz>> {
        self.fetch_quiz(id_event).await
    }

    async fn list_questions(&mut self, id_quiz: i32) -> anyhow::Result<Vec<Question>> {
        let mut result = self.work.questions.iter()
            .filter(|q| q.id_quiz == id_quiz)
            .cloned()
            .collect::<Vec<_>>();
        result.sort_by_key(|q| q.position);
        Ok(result)
    }

    async fn count_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        Ok(self.work.questions.iter().filter(|q| q.id_quiz == id_quiz).count() as u64)
    }

    async fn count_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        Ok(self.work.attempt_ids(id_quiz).len() as u64)
    }

    async fn count_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        let attempt_ids = self.work.attempt_ids(id_quiz);
        Ok(self.work.answers.iter().filter(|a| attempt_ids.contains(&a.id_attempt)).count() as u64)
    }

    async fn delete_answers(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        self.check(FailPoint::DeleteAnswers)?;

        let attempt_ids = self.work.attempt_ids(id_quiz);
        let before = self.work.answers.len();
        self.work.answers.retain(|a| !attempt_ids.contains(&a.id_attempt));
        Ok((before - self.work.answers.len()) as u64)
    }

    async fn delete_attempts(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        self.check(FailPoint::DeleteAttempts)?;

        let before = self.work.attempts.len();
        self.work.attempts.retain(|a| a.id_quiz != id_quiz);
        Ok((before - self.work.attempts.len()) as u64)
    }

    async fn delete_questions(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        self.check(FailPoint::DeleteQuestions)?;

        let before = self.work.questions.len();
        self.work.questions.retain(|q| q.id_quiz != id_quiz);
        Ok((before - self.work.questions.len()) as u64)
    }

    async fn delete_quiz(&mut self, id_quiz: i32) -> anyhow::Result<u64> {
        self.check(FailPoint::DeleteQuiz)?;

        Ok(self.work.quizzes.remove(&id_quiz).map_or(0, |_| 1))
    }

    async fn set_state(
        &mut self,
        id_quiz: i32,
        state: QuizState,
        time_started: Option<DateTime<Utc>>,
        time_ended: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        self.check(FailPoint::SetState)?;

        if let Some(quiz) = self.work.quizzes.get_mut(&id_quiz) {
            quiz.state = state;
            quiz.time_started = time_started;
            quiz.time_ended = time_ended;
        }
        Ok(())
    }

    async fn commit(self) -> anyhow::Result<()> {
        self.check(FailPoint::Commit)?;

        let MemoryTx { mut guard, work, .. } = self;
        *guard = work;
        Ok(())
    }
}
