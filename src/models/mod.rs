// src/models/mod.rs

pub mod course;
pub mod enrollment;
pub mod quiz_attempt;
pub mod review;
