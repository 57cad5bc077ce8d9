//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each repository implements one domain port on top of a shared
//! [`DbPool`] (`diesel-async` with `bb8`). Row structs and table definitions
//! stay private to this module; adapters only translate between rows and
//! domain entities and map failures into port errors.
//!
//! # Example
//!
//! ```no_run
//! use skillflash::outbound::persistence::{DbPool, DieselCourseRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), skillflash::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/skillflash")).await?;
//! let courses = DieselCourseRepository::new(pool);
//! # let _ = courses;
//! # Ok(())
//! # }
//! ```

mod diesel_certificate_repository;
mod diesel_course_repository;
mod diesel_module_repository;
mod diesel_profile_repository;
mod diesel_progress_repository;
mod diesel_quiz_repository;
mod diesel_result_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_certificate_repository::DieselCertificateRepository;
pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_module_repository::DieselModuleRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_progress_repository::DieselProgressRepository;
pub use diesel_quiz_repository::DieselQuizRepository;
pub use diesel_result_repository::DieselResultRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
