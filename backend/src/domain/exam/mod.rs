//! Timed certification exam.
//!
//! [`ExamSession`] is the owned state machine for one attempt
//! (`intro -> qcm -> open -> result`, with a forced jump to `result` when
//! the deadline passes). [`ExamService`] keeps one live session per learner
//! and course, drives grading and certificate issuance, and expires
//! overdue sessions from a periodic sweep.

mod assembly;
mod service;
mod session;

pub use assembly::{
    MAX_EXAM_OPEN, MAX_EXAM_QCM, OPEN_PER_MODULE, QCM_PER_MODULE, assemble_questions,
};
pub use service::{
    ExamService, ExamServicePorts, FINISHED_RETENTION_SECS, SWEEP_INTERVAL, spawn_exam_sweeper,
};
pub use session::{
    CurrentQuestion, EXAM_DURATION_SECS, ExamAnswer, ExamError, ExamOutcome, ExamPhase,
    ExamSession, ExamStatus, ExamView, SubmittedExam,
};
