//! Weight suggestion engine
//!
//! Weekly linear progression: the most recently written weight for an exercise
//! is repeated within its training week and bumped by the exercise increment
//! once a new week starts. Suggestions never exceed [`WEIGHT_CEILING`].

use crate::exercise_log::LogEntry;
use crate::program::DAYS_PER_WEEK;

/// Hard cap on any suggested or adjusted weight
pub const WEIGHT_CEILING: f64 = 80.0;

/// Lowest weight reachable by manual adjustment
pub const WEIGHT_FLOOR: f64 = 5.0;

/// Direction of a manual weight step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Up,
    Down,
}

impl std::str::FromStr for Adjust {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "+" => Ok(Self::Up),
            "down" | "-" => Ok(Self::Down),
            _ => Err(format!("Unknown direction: {} (expected up or down)", s)),
        }
    }
}

/// 1-based training week of a 1-based global day
pub fn week_of(day: u32) -> u32 {
    day.saturating_sub(1) / DAYS_PER_WEEK as u32 + 1
}

/// Next working weight for `exercise`.
///
/// The latest entry is chosen by write time, not by day: editing an older
/// day makes that edit the reference. Ties go to the later day.
pub fn suggest_weight<'a, I>(
    exercise: &str,
    starting_weight: f64,
    increment: f64,
    entries: I,
    current_day: u32,
) -> f64
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    let latest = entries
        .into_iter()
        .filter(|e| e.exercise == exercise)
        .filter_map(|e| e.weight.map(|w| (e, w)))
        .max_by(|(a, _), (b, _)| a.timestamp.cmp(&b.timestamp).then(a.day.cmp(&b.day)));

    let Some((entry, weight)) = latest else {
        return starting_weight;
    };

    if week_of(current_day) > week_of(entry.day) {
        (weight + increment).min(WEIGHT_CEILING)
    } else {
        weight
    }
}

/// One manual step from `current`, clamped to `[WEIGHT_FLOOR, WEIGHT_CEILING]`
pub fn step_weight(current: f64, step: f64, direction: Adjust) -> f64 {
    let next = match direction {
        Adjust::Up => current + step,
        Adjust::Down => current - step,
    };
    next.clamp(WEIGHT_FLOOR, WEIGHT_CEILING)
}
