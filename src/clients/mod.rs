// src/clients/mod.rs

pub mod openai;
pub mod storage;
