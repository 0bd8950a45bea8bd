// src/handlers.rs

pub mod auth;
pub mod callins;
pub mod nurses;
pub mod schedule;
pub mod time_off;
pub mod work_days;
