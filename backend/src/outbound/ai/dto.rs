//! Wire DTOs for the chat-completions API and the JSON documents the model
//! is asked to produce.
//!
//! Model output is decoded into these strict shapes first and only then
//! mapped into domain values, so anything malformed is rejected in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::ports::GeneratedModule;
use crate::domain::{
    ModuleContent, ModuleExample, ModuleExercise, OpenQuestion, QcmQuestion, QuestionSet,
};

#[derive(Debug, Serialize)]
pub(super) struct ChatRequestDto<'a> {
    pub(super) model: &'a str,
    pub(super) messages: [ChatMessageDto<'a>; 2],
    pub(super) temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub(super) role: &'static str,
    pub(super) content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponseDto {
    pub(super) choices: Vec<ChatChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoiceDto {
    pub(super) message: ChatReplyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatReplyDto {
    pub(super) content: Option<String>,
}

impl ChatResponseDto {
    /// Text of the first choice.
    pub(super) fn into_text(self) -> Result<String, String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| "completion contained no text".to_owned())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct GeneratedModuleDto {
    title: String,
    explanation: String,
    #[serde(default)]
    examples: Vec<ExampleDto>,
    exercise: ExerciseDto,
    qcm_questions: Vec<QcmDto>,
    #[serde(default)]
    open_questions: Vec<OpenDto>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExampleDto {
    title: String,
    description: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExerciseDto {
    title: String,
    description: String,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QcmDto {
    question: String,
    options: Vec<String>,
    correct: usize,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpenDto {
    question: String,
    expected_answer: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

impl GeneratedModuleDto {
    pub(super) fn into_domain(self) -> Result<GeneratedModule, String> {
        let qcm = self
            .qcm_questions
            .into_iter()
            .enumerate()
            .map(|(index, dto)| {
                let question = QcmQuestion::new(dto.question, dto.options, dto.correct)
                    .map_err(|err| format!("qcm question {}: {err}", index + 1))?;
                Ok(match non_blank(dto.explanation) {
                    Some(explanation) => question.with_explanation(explanation),
                    None => question,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let open = self
            .open_questions
            .into_iter()
            .map(|dto| OpenQuestion {
                question: dto.question,
                expected_answer: dto.expected_answer,
            })
            .collect();

        Ok(GeneratedModule {
            title: self.title,
            content: ModuleContent {
                explanation: self.explanation,
                examples: self
                    .examples
                    .into_iter()
                    .map(|dto| ModuleExample {
                        title: dto.title,
                        description: dto.description,
                        code: non_blank(dto.code),
                    })
                    .collect(),
                exercise: ModuleExercise {
                    title: self.exercise.title,
                    description: self.exercise.description,
                    hint: non_blank(self.exercise.hint),
                },
            },
            questions: QuestionSet { qcm, open },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct GradingDto {
    pub(super) scores: Vec<u32>,
}
