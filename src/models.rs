// src/models.rs

pub mod assignment;
pub mod auth;
pub mod nurse;
pub mod time_off;
pub mod work_day;
