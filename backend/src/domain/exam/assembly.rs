//! Builds the certification question bank from module quizzes.

use crate::domain::{ModuleNumber, QuestionSet, Quiz};

/// Multiple-choice questions drawn from each module quiz.
pub const QCM_PER_MODULE: usize = 5;
/// Open questions drawn from each module quiz.
pub const OPEN_PER_MODULE: usize = 1;
/// Overall cap on multiple-choice questions.
pub const MAX_EXAM_QCM: usize = 50;
/// Overall cap on open questions.
pub const MAX_EXAM_OPEN: usize = 10;

/// Take a fixed slice of each module quiz in module order and concatenate
/// the slices, capped at the overall totals.
pub fn assemble_questions(module_quizzes: &[(ModuleNumber, Quiz)]) -> QuestionSet {
    let mut ordered: Vec<&(ModuleNumber, Quiz)> = module_quizzes.iter().collect();
    ordered.sort_by_key(|(number, _)| *number);

    let qcm = ordered
        .iter()
        .flat_map(|(_, quiz)| quiz.questions.qcm.iter().take(QCM_PER_MODULE))
        .take(MAX_EXAM_QCM)
        .cloned()
        .collect();
    let open = ordered
        .iter()
        .flat_map(|(_, quiz)| quiz.questions.open.iter().take(OPEN_PER_MODULE))
        .take(MAX_EXAM_OPEN)
        .cloned()
        .collect();
    QuestionSet { qcm, open }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OpenQuestion, QcmQuestion, QuizId, QuizType};
    use rstest::rstest;

    fn module_quiz(number: i64, qcm: usize, open: usize) -> (ModuleNumber, Quiz) {
        let questions = QuestionSet {
            qcm: (0..qcm)
                .map(|i| {
                    QcmQuestion::new(format!("m{number} q{i}"), vec!["a".into(), "b".into()], 0)
                        .expect("valid")
                })
                .collect(),
            open: (0..open)
                .map(|i| OpenQuestion {
                    question: format!("m{number} open{i}"),
                    expected_answer: "ref".into(),
                })
                .collect(),
        };
        (
            ModuleNumber::new(number).expect("valid number"),
            Quiz {
                id: QuizId::random(),
                module_id: None,
                course_id: None,
                quiz_type: QuizType::Module,
                questions,
            },
        )
    }

    #[rstest]
    fn takes_a_fixed_slice_per_module() {
        let quizzes: Vec<_> = (1..=10).map(|n| module_quiz(n, 20, 4)).collect();
        let set = assemble_questions(&quizzes);
        assert_eq!(set.qcm.len(), 50);
        assert_eq!(set.open.len(), 10);
        assert_eq!(set.qcm[5].question(), "m2 q0");
        assert_eq!(set.open[9].question, "m10 open0");
    }

    #[rstest]
    fn orders_by_module_number() {
        let quizzes = vec![module_quiz(3, 1, 0), module_quiz(1, 1, 0)];
        let set = assemble_questions(&quizzes);
        assert_eq!(set.qcm[0].question(), "m1 q0");
    }

    #[rstest]
    fn short_modules_contribute_what_they_have() {
        let quizzes = vec![module_quiz(1, 2, 0), module_quiz(2, 7, 1)];
        let set = assemble_questions(&quizzes);
        assert_eq!(set.qcm.len(), 7);
        assert_eq!(set.open.len(), 1);
    }

    #[rstest]
    fn empty_bank_yields_empty_set() {
        assert!(assemble_questions(&[]).is_empty());
    }
}
