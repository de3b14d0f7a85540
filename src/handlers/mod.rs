// src/handlers/mod.rs

pub mod auth;
pub mod exam;
pub mod files;
pub mod quiz;
