// src/services/mod.rs
//
// Pure domain logic. Nothing in here touches the database.

pub mod grading;
pub mod progress;
pub mod stats;

/// `round(part / whole * 100)` with halves rounded up, or 0 when `whole` is 0.
pub fn rounded_percentage(part: i64, whole: i64) -> i32 {
    if whole <= 0 {
        return 0;
    }
    let pct = (part.max(0) * 100 + whole / 2) / whole;
    pct as i32
}
