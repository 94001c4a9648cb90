pub(crate) mod attempts;
pub(crate) mod health;
pub(crate) mod quizzes;
pub(crate) mod users;
