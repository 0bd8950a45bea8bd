// src/services.rs

pub mod auth;
pub mod shift_policy;
pub mod nurse_service;
pub mod work_day_service;
pub mod assignment_service;
pub mod time_off_service;
pub mod coverage_service;

pub use assignment_service::AssignmentLedger;
pub use auth::AuthService;
pub use coverage_service::CoverageService;
pub use nurse_service::NurseService;
pub use shift_policy::ShiftPolicy;
pub use time_off_service::TimeOffService;
pub use work_day_service::WorkDayService;
