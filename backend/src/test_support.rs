//! Test utilities for the skillflash crate.
//!
//! Compiled with the `test-support` feature so integration tests in
//! `tests/` can drive the whole HTTP surface without PostgreSQL or an AI
//! provider. [`InMemoryStore`] implements every repository port over one
//! mutex-guarded state; [`ScriptedGenerator`] and [`ScriptedGrader`] stand
//! in for the chat client; [`MutableClock`] lets tests move time forward.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    AiProviderError, AnswerGrader, CertificateRepository, CertificateRepositoryError,
    ContentGenerator, CourseRepository, CourseRepositoryError, GeneratedModule,
    GeneratedModuleRecord, GenerationRequest, GradingItem, ModuleRepository,
    ModuleRepositoryError, ProfileRepository, ProfileRepositoryError, ProgressRepository,
    ProgressRepositoryError, QuizRepository, QuizRepositoryError, ResultRepository,
    ResultRepositoryError,
};
use crate::domain::{
    Badge, Certificate, CompletionWrite, Course, CourseId, DEFAULT_DISPLAY_NAME, Module,
    ModuleCompletion, ModuleContent, ModuleExercise, ModuleId, ModuleNumber, NewAttempt,
    NewCertificate, OpenQuestion, Profile, QcmQuestion, QuestionSet, Quiz, QuizId, QuizType,
    UserId, VerificationCode, VerifiedCertificate,
};
use crate::outbound::notify::TracingCertificateNotifier;
use crate::server::LearningPorts;

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Multiple-choice question with three options; index 1 is correct.
pub fn sample_qcm(label: &str) -> QcmQuestion {
    match QcmQuestion::new(
        format!("{label}?"),
        vec!["no".to_owned(), "yes".to_owned(), "maybe".to_owned()],
        1,
    ) {
        Ok(question) => question.with_explanation(format!("{label}: yes")),
        Err(error) => panic!("sample question is valid: {error}"),
    }
}

pub fn sample_open(label: &str) -> OpenQuestion {
    OpenQuestion {
        question: format!("Explain {label}"),
        expected_answer: format!("{label} explained"),
    }
}

/// Question set with `qcm` multiple-choice and `open` free-text questions.
pub fn sample_questions(prefix: &str, qcm: usize, open: usize) -> QuestionSet {
    QuestionSet {
        qcm: (0..qcm).map(|i| sample_qcm(&format!("{prefix} q{i}"))).collect(),
        open: (0..open).map(|i| sample_open(&format!("{prefix} o{i}"))).collect(),
    }
}

pub fn sample_content(title: &str) -> ModuleContent {
    ModuleContent {
        explanation: format!("{title} in depth."),
        examples: Vec::new(),
        exercise: ModuleExercise {
            title: format!("Practise {title}"),
            description: "Write a short program.".to_owned(),
            hint: None,
        },
    }
}

#[derive(Clone)]
struct StoredQuiz {
    quiz: Quiz,
    module_number: Option<ModuleNumber>,
}

#[derive(Clone)]
struct ProgressRow {
    user_id: UserId,
    module_id: ModuleId,
    course_id: CourseId,
    completed_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreState {
    courses: Vec<Course>,
    modules: Vec<Module>,
    quizzes: Vec<StoredQuiz>,
    results: Vec<NewAttempt>,
    progress: Vec<ProgressRow>,
    profiles: Vec<Profile>,
    certificates: Vec<Certificate>,
}

impl StoreState {
    fn profile_mut(&mut self, user_id: &UserId) -> &mut Profile {
        let index = match self.profiles.iter().position(|p| &p.user_id == user_id) {
            Some(index) => index,
            None => {
                self.profiles.push(Profile::new(user_id.clone()));
                self.profiles.len() - 1
            }
        };
        &mut self.profiles[index]
    }

    fn module_number(&self, module_id: &ModuleId) -> Option<ModuleNumber> {
        self.modules
            .iter()
            .find(|module| &module.id == module_id)
            .map(|module| module.number)
    }

    fn completion(&self, row: &ProgressRow) -> Option<ModuleCompletion> {
        self.module_number(&row.module_id)
            .map(|module_number| ModuleCompletion {
                module_id: row.module_id,
                course_id: row.course_id,
                module_number,
                completed_at: row.completed_at,
            })
    }
}

/// Every repository port over shared in-process state.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("store mutex"),
        }
    }

    pub fn add_course(&self, course: Course) {
        self.lock().courses.push(course);
    }

    /// Store module `number` of `course_id` with a module quiz.
    pub fn add_module_with_quiz(
        &self,
        course_id: CourseId,
        number: ModuleNumber,
        questions: QuestionSet,
    ) -> (Module, Quiz) {
        let module = Module {
            id: ModuleId::random(),
            course_id,
            number,
            title: format!("Module {number}"),
            content: sample_content(&format!("Module {number}")),
        };
        let quiz = Quiz {
            id: QuizId::random(),
            module_id: Some(module.id),
            course_id: Some(course_id),
            quiz_type: QuizType::Module,
            questions,
        };
        let mut state = self.lock();
        state.modules.push(module.clone());
        state.quizzes.push(StoredQuiz {
            quiz: quiz.clone(),
            module_number: Some(number),
        });
        (module, quiz)
    }

    /// Mark a stored module completed without awarding points.
    pub fn complete_module(&self, user_id: &UserId, module: &Module, at: DateTime<Utc>) {
        self.lock().progress.push(ProgressRow {
            user_id: user_id.clone(),
            module_id: module.id,
            course_id: module.course_id,
            completed_at: at,
        });
    }

    pub fn set_display_name(&self, user_id: &UserId, name: &str) {
        self.lock().profile_mut(user_id).name = Some(name.to_owned());
    }

    pub fn stored_profile(&self, user_id: &UserId) -> Option<Profile> {
        self.lock()
            .profiles
            .iter()
            .find(|profile| &profile.user_id == user_id)
            .cloned()
    }

    pub fn module_count(&self) -> usize {
        self.lock().modules.len()
    }

    pub fn result_count(&self) -> usize {
        self.lock().results.len()
    }

    pub fn certificate_count(&self) -> usize {
        self.lock().certificates.len()
    }

    /// Ports backed by this store, with scripted AI doubles and `clock`.
    pub fn ports(
        self: &Arc<Self>,
        generator: Arc<dyn ContentGenerator>,
        grader: Arc<dyn AnswerGrader>,
        clock: Arc<dyn Clock>,
    ) -> LearningPorts {
        LearningPorts {
            courses: self.clone(),
            modules: self.clone(),
            quizzes: self.clone(),
            results: self.clone(),
            progress: self.clone(),
            profiles: self.clone(),
            certificates: self.clone(),
            generator,
            grader,
            notifier: Arc::new(TracingCertificateNotifier),
            clock,
        }
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        Ok(self.lock().courses.clone())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(self.lock().courses.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(self.lock().courses.iter().find(|c| &c.id == id).cloned())
    }
}

#[async_trait]
impl ModuleRepository for InMemoryStore {
    async fn find_by_number(
        &self,
        course_id: &CourseId,
        number: ModuleNumber,
    ) -> Result<Option<Module>, ModuleRepositoryError> {
        Ok(self
            .lock()
            .modules
            .iter()
            .find(|m| &m.course_id == course_id && m.number == number)
            .cloned())
    }

    async fn find_by_id(&self, id: &ModuleId) -> Result<Option<Module>, ModuleRepositoryError> {
        Ok(self.lock().modules.iter().find(|m| &m.id == id).cloned())
    }

    async fn save_generated(
        &self,
        record: &GeneratedModuleRecord,
    ) -> Result<(Module, Quiz), ModuleRepositoryError> {
        let mut state = self.lock();
        let existing = state
            .modules
            .iter()
            .position(|m| m.course_id == record.course_id && m.number == record.number);
        let module = match existing {
            Some(index) => {
                let module = &mut state.modules[index];
                module.title.clone_from(&record.title);
                module.content = record.content.clone();
                module.clone()
            }
            None => {
                let module = Module {
                    id: ModuleId::random(),
                    course_id: record.course_id,
                    number: record.number,
                    title: record.title.clone(),
                    content: record.content.clone(),
                };
                state.modules.push(module.clone());
                module
            }
        };
        let quiz = Quiz {
            id: QuizId::random(),
            module_id: Some(module.id),
            course_id: Some(record.course_id),
            quiz_type: QuizType::Module,
            questions: record.questions.clone(),
        };
        state.quizzes.push(StoredQuiz {
            quiz: quiz.clone(),
            module_number: Some(record.number),
        });
        Ok((module, quiz))
    }
}

#[async_trait]
impl QuizRepository for InMemoryStore {
    async fn find_by_id(&self, id: &QuizId) -> Result<Option<Quiz>, QuizRepositoryError> {
        Ok(self
            .lock()
            .quizzes
            .iter()
            .find(|stored| &stored.quiz.id == id)
            .map(|stored| stored.quiz.clone()))
    }

    async fn latest_for_module(
        &self,
        module_id: &ModuleId,
    ) -> Result<Option<Quiz>, QuizRepositoryError> {
        Ok(self
            .lock()
            .quizzes
            .iter()
            .rev()
            .find(|stored| {
                stored.quiz.quiz_type == QuizType::Module
                    && stored.quiz.module_id.as_ref() == Some(module_id)
            })
            .map(|stored| stored.quiz.clone()))
    }

    async fn latest_module_quizzes(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<(ModuleNumber, Quiz)>, QuizRepositoryError> {
        let state = self.lock();
        let mut latest: Vec<(ModuleNumber, Quiz)> = Vec::new();
        for stored in state.quizzes.iter().rev() {
            let Some(number) = stored.module_number else {
                continue;
            };
            if stored.quiz.course_id.as_ref() != Some(course_id)
                || latest.iter().any(|(seen, _)| *seen == number)
            {
                continue;
            }
            latest.push((number, stored.quiz.clone()));
        }
        latest.sort_by_key(|(number, _)| *number);
        Ok(latest)
    }

    async fn ensure_certification_quiz(
        &self,
        course_id: &CourseId,
    ) -> Result<QuizId, QuizRepositoryError> {
        let mut state = self.lock();
        if let Some(stored) = state.quizzes.iter().find(|stored| {
            stored.quiz.quiz_type == QuizType::Certification
                && stored.quiz.course_id.as_ref() == Some(course_id)
        }) {
            return Ok(stored.quiz.id);
        }
        let quiz = Quiz {
            id: QuizId::random(),
            module_id: None,
            course_id: Some(*course_id),
            quiz_type: QuizType::Certification,
            questions: QuestionSet::default(),
        };
        let id = quiz.id;
        state.quizzes.push(StoredQuiz {
            quiz,
            module_number: None,
        });
        Ok(id)
    }
}

#[async_trait]
impl ResultRepository for InMemoryStore {
    async fn insert(&self, attempt: &NewAttempt) -> Result<Uuid, ResultRepositoryError> {
        self.lock().results.push(attempt.clone());
        Ok(Uuid::new_v4())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryStore {
    async fn record_completion(
        &self,
        write: &CompletionWrite,
    ) -> Result<bool, ProgressRepositoryError> {
        let mut state = self.lock();
        let already = state
            .progress
            .iter()
            .any(|row| row.user_id == write.user_id && row.module_id == write.module_id);
        if already {
            return Ok(false);
        }
        state.progress.push(ProgressRow {
            user_id: write.user_id.clone(),
            module_id: write.module_id,
            course_id: write.course_id,
            completed_at: write.completed_at,
        });
        if write.points != 0 {
            state.profile_mut(&write.user_id).points += write.points;
        }
        Ok(true)
    }

    async fn list_for_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        let state = self.lock();
        let mut completions: Vec<ModuleCompletion> = state
            .progress
            .iter()
            .filter(|row| &row.user_id == user_id && &row.course_id == course_id)
            .filter_map(|row| state.completion(row))
            .collect();
        completions.sort_by_key(|completion| completion.module_number);
        Ok(completions)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ModuleCompletion>, ProgressRepositoryError> {
        let state = self.lock();
        Ok(state
            .progress
            .iter()
            .filter(|row| &row.user_id == user_id)
            .filter_map(|row| state.completion(row))
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn find(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self.stored_profile(user_id))
    }

    async fn add_points(
        &self,
        user_id: &UserId,
        points: i64,
    ) -> Result<(), ProfileRepositoryError> {
        self.lock().profile_mut(user_id).points += points;
        Ok(())
    }

    async fn grant_badges(
        &self,
        user_id: &UserId,
        badges: &[Badge],
        points_per_badge: i64,
    ) -> Result<Vec<Badge>, ProfileRepositoryError> {
        let mut state = self.lock();
        let profile = state.profile_mut(user_id);
        let mut added = Vec::new();
        for badge in badges {
            if !profile.badges.contains(badge) && !added.contains(badge) {
                added.push(*badge);
            }
        }
        profile.badges.extend(added.iter().copied());
        let count = i64::try_from(added.len()).unwrap_or(i64::MAX);
        profile.points += points_per_badge.saturating_mul(count);
        Ok(added)
    }

    async fn top_by_points(&self, limit: usize) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let mut profiles = self.lock().profiles.clone();
        profiles.sort_by(|left, right| {
            right
                .points
                .cmp(&left.points)
                .then_with(|| left.name.cmp(&right.name))
        });
        profiles.truncate(limit);
        Ok(profiles)
    }
}

#[async_trait]
impl CertificateRepository for InMemoryStore {
    async fn insert(
        &self,
        certificate: &NewCertificate,
    ) -> Result<Certificate, CertificateRepositoryError> {
        let mut state = self.lock();
        if state
            .certificates
            .iter()
            .any(|stored| stored.verification_code == certificate.verification_code)
        {
            return Err(CertificateRepositoryError::duplicate_code(
                certificate.verification_code.as_str(),
            ));
        }
        let stored = Certificate {
            id: Uuid::new_v4(),
            user_id: certificate.user_id.clone(),
            course_id: certificate.course_id,
            score: certificate.score,
            verification_code: certificate.verification_code.clone(),
            created_at: certificate.created_at,
        };
        state.certificates.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_code(
        &self,
        code: &VerificationCode,
    ) -> Result<Option<VerifiedCertificate>, CertificateRepositoryError> {
        let state = self.lock();
        let Some(certificate) = state
            .certificates
            .iter()
            .find(|stored| &stored.verification_code == code)
        else {
            return Ok(None);
        };
        let course_title = state
            .courses
            .iter()
            .find(|course| course.id == certificate.course_id)
            .map(|course| course.title.clone())
            .unwrap_or_default();
        let holder_name = state
            .profiles
            .iter()
            .find(|profile| profile.user_id == certificate.user_id)
            .and_then(|profile| profile.name.clone())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned());
        Ok(Some(VerifiedCertificate {
            holder_name,
            course_title,
            score: certificate.score,
            issued_at: certificate.created_at,
            verification_code: certificate.verification_code.clone(),
        }))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Certificate>, CertificateRepositoryError> {
        Ok(self
            .lock()
            .certificates
            .iter()
            .filter(|stored| &stored.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Generator returning a fixed module shape, or failing when told to.
#[derive(Default)]
pub struct ScriptedGenerator {
    fail: bool,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        match self.calls.lock() {
            Ok(calls) => *calls,
            Err(_) => panic!("generator mutex"),
        }
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedModule, AiProviderError> {
        match self.calls.lock() {
            Ok(mut calls) => *calls += 1,
            Err(_) => panic!("generator mutex"),
        }
        if self.fail {
            return Err(AiProviderError::upstream(500u16));
        }
        let title = format!("{} module {}", request.course_title, request.module_number);
        Ok(GeneratedModule {
            content: sample_content(&title),
            questions: sample_questions(&title, 4, 2),
            title,
        })
    }
}

/// Grader awarding the same points to every answer, or failing.
pub struct ScriptedGrader {
    points: Option<u32>,
}

impl ScriptedGrader {
    pub fn awarding(points: u32) -> Self {
        Self {
            points: Some(points),
        }
    }

    pub fn unavailable() -> Self {
        Self { points: None }
    }
}

#[async_trait]
impl AnswerGrader for ScriptedGrader {
    async fn grade(&self, items: &[GradingItem]) -> Result<Vec<u32>, AiProviderError> {
        match self.points {
            Some(points) => Ok(items
                .iter()
                .map(|item| if item.learner_answer.is_some() { points } else { 0 })
                .collect()),
            None => Err(AiProviderError::rate_limited()),
        }
    }
}
