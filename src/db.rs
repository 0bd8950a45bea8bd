// src/db.rs

use std::sync::Arc;

pub mod admin_repo;
pub use admin_repo::AdminRepository;
pub mod nurse_repo;
pub use nurse_repo::NurseRepository;
pub mod work_day_repo;
pub use work_day_repo::WorkDayRepository;
pub mod assignment_repo;
pub use assignment_repo::AssignmentRepository;
pub mod time_off_repo;
pub use time_off_repo::TimeOffRepository;

pub mod pg_store;
pub use pg_store::PgStore;
pub mod memory_store;
pub use memory_store::MemoryStore;

// Everything the services need from persistence. Implemented by `PgStore`
// (production) and `MemoryStore` (no DATABASE_URL, tests).
pub trait Store:
    NurseRepository + AdminRepository + WorkDayRepository + AssignmentRepository + TimeOffRepository
{
}

impl<T> Store for T where
    T: NurseRepository
        + AdminRepository
        + WorkDayRepository
        + AssignmentRepository
        + TimeOffRepository
{
}

pub type DynStore = Arc<dyn Store>;
