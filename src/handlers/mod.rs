// src/handlers/mod.rs

pub mod admin;
pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod quiz;
pub mod review;
