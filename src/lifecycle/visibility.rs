use serde::Serialize;

/// Which destructive actions a dashboard should offer for a quiz.
///
/// Purely advisory; the lifecycle operations never consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub delete: bool,
    pub reset: bool,
}

impl Visibility {
    pub const fn for_counts(_question_count: u64, attempt_count: u64) -> Self {
        Self {
            delete: true,
            reset: attempt_count > 0,
        }
    }
}
