// src/models/mod.rs

pub mod exam;
pub mod question;
pub mod quiz;
pub mod user;
