use crate::models::{Checkpoint, Stats};
use chrono::Utc;

pub fn build_stats(checkpoints: &[Checkpoint]) -> Stats {
    build_stats_at(&today_string(), checkpoints)
}

/// Counts over the full list. Overdue compares zero-padded `YYYY-MM-DD` strings.
pub fn build_stats_at(today: &str, checkpoints: &[Checkpoint]) -> Stats {
    let total = checkpoints.len();
    let completed = checkpoints.iter().filter(|checkpoint| checkpoint.completed).count();
    let overdue_count = checkpoints
        .iter()
        .filter(|checkpoint| checkpoint.is_overdue(today))
        .count();

    Stats {
        total,
        completed,
        progress_percent: progress_percent(completed, total),
        overdue_count,
    }
}

pub fn today_string() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn progress_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 * 100.0 / total as f64).round() as u32
}
