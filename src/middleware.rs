// src/middleware.rs

pub mod auth;
