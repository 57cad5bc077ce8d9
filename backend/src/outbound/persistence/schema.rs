//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Course catalogue.
    courses (id) {
        id -> Uuid,
        slug -> Varchar,
        title -> Varchar,
        description -> Text,
        /// `beginner`, `intermediate`, or `advanced`.
        level -> Varchar,
        skills -> Array<Text>,
        duration -> Varchar,
        icon -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Generated modules, unique per `(course_id, module_number)`.
    modules (id) {
        id -> Uuid,
        course_id -> Uuid,
        module_number -> Int2,
        title -> Varchar,
        /// Serialised `ModuleContent`.
        content -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Module and certification quizzes.
    quizzes (id) {
        id -> Uuid,
        module_id -> Nullable<Uuid>,
        course_id -> Nullable<Uuid>,
        /// `module` or `certification`.
        quiz_type -> Varchar,
        /// Serialised `QuestionSet`.
        questions -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only log of graded attempts.
    results (id) {
        id -> Uuid,
        user_id -> Uuid,
        quiz_id -> Uuid,
        module_id -> Nullable<Uuid>,
        course_id -> Nullable<Uuid>,
        score -> Float8,
        max_score -> Int4,
        answers -> Jsonb,
        completed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-learner module completion.
    user_module_progress (user_id, module_id) {
        user_id -> Uuid,
        module_id -> Uuid,
        course_id -> Uuid,
        completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    certificates (id) {
        id -> Uuid,
        user_id -> Uuid,
        course_id -> Uuid,
        score -> Float8,
        verification_code -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Learner points and badges, created lazily on first award.
    profiles (user_id) {
        user_id -> Uuid,
        name -> Nullable<Varchar>,
        points -> Int8,
        badges -> Array<Text>,
        avatar_url -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(modules -> courses (course_id));
diesel::joinable!(quizzes -> modules (module_id));
diesel::joinable!(results -> quizzes (quiz_id));
diesel::joinable!(user_module_progress -> modules (module_id));
diesel::joinable!(certificates -> courses (course_id));

diesel::allow_tables_to_appear_in_same_query!(
    courses,
    modules,
    quizzes,
    results,
    user_module_progress,
    certificates,
    profiles,
);
