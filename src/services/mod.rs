pub(crate) mod exam_snapshot;
pub(crate) mod grading;
