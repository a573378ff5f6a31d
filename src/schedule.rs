//! Schedule resolver - which workout (if any) falls on the current day

use crate::error::CatalogError;
use crate::program::{Catalog, DAYS_PER_WEEK, Phase, REST, Workout};
use crate::progress::ProgressState;

/// What today holds
#[derive(Debug, Clone, Copy)]
pub enum Today<'a> {
    Rest,
    Workout { key: &'a str, workout: &'a Workout },
}

impl<'a> Today<'a> {
    pub fn workout(&self) -> Option<&'a Workout> {
        match self {
            Today::Rest => None,
            Today::Workout { workout, .. } => Some(workout),
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Today::Rest)
    }
}

/// Zero-based weekday slot. The pattern repeats every seven global days,
/// whatever day the phase started on.
pub fn day_index(global_day: u32) -> usize {
    global_day.saturating_sub(1) as usize % DAYS_PER_WEEK
}

fn resolve_slot<'a>(phase: &'a Phase, slot: usize) -> Result<Today<'a>, CatalogError> {
    let Some(token) = phase.schedule_pattern.as_ref().and_then(|p| p.get(slot)) else {
        return Ok(Today::Rest);
    };
    if token == REST {
        return Ok(Today::Rest);
    }
    let workout = phase
        .workouts
        .get(token)
        .ok_or_else(|| CatalogError::UnknownWorkoutKey {
            phase: phase.id.clone(),
            key: token.clone(),
        })?;
    Ok(Today::Workout { key: token, workout })
}

pub fn resolve_today<'a>(
    progress: &ProgressState,
    catalog: &'a Catalog,
) -> Result<Today<'a>, CatalogError> {
    let phase = catalog.phase(&progress.current_phase)?;
    resolve_slot(phase, day_index(progress.global_day))
}

/// One weekday of the current phase's pattern
#[derive(Debug, Clone)]
pub struct WeekSlot {
    pub token: String,
    pub workout_name: Option<String>,
    pub is_today: bool,
}

/// The seven slots of the current phase, today marked
pub fn week_overview(
    progress: &ProgressState,
    catalog: &Catalog,
) -> Result<Vec<WeekSlot>, CatalogError> {
    let phase = catalog.phase(&progress.current_phase)?;
    let today = day_index(progress.global_day);

    (0..DAYS_PER_WEEK)
        .map(|slot| {
            let resolved = resolve_slot(phase, slot)?;
            let (token, workout_name) = match resolved {
                Today::Rest => (REST.to_string(), None),
                Today::Workout { key, workout } => (key.to_string(), Some(workout.name.clone())),
            };
            Ok(WeekSlot {
                token,
                workout_name,
                is_today: slot == today,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::tests::sample;

    fn at(day: u32, phase: &str) -> ProgressState {
        ProgressState {
            global_day: day,
            current_phase: phase.to_string(),
        }
    }

    #[test]
    fn test_day_index() {
        assert_eq!(day_index(1), 0);
        assert_eq!(day_index(7), 6);
        assert_eq!(day_index(8), 0);
        assert_eq!(day_index(365), 0);
    }

    #[test]
    fn test_first_day_is_workout_a() {
        let catalog = sample();
        let today = resolve_today(&at(1, "p1"), &catalog).unwrap();
        match today {
            Today::Workout { key, workout } => {
                assert_eq!(key, "A");
                assert_eq!(workout.name, "Posterior Chain");
            }
            Today::Rest => panic!("expected workout"),
        }
    }

    #[test]
    fn test_rest_days() {
        let catalog = sample();
        assert!(resolve_today(&at(6, "p1"), &catalog).unwrap().is_rest());
        assert!(resolve_today(&at(7, "p1"), &catalog).unwrap().is_rest());
        assert!(!resolve_today(&at(5, "p1"), &catalog).unwrap().is_rest());
    }

    #[test]
    fn test_pattern_repeats_weekly() {
        let catalog = sample();
        for day in 1..=21 {
            let a = resolve_today(&at(day, "p1"), &catalog).unwrap();
            let b = resolve_today(&at(day + 7, "p1"), &catalog).unwrap();
            assert_eq!(
                a.workout().map(|w| w.name.as_str()),
                b.workout().map(|w| w.name.as_str()),
                "day {}",
                day
            );
        }
    }

    #[test]
    fn test_phase_without_pattern_rests() {
        let catalog = sample();
        assert!(resolve_today(&at(30, "p3"), &catalog).unwrap().is_rest());
    }

    #[test]
    fn test_unknown_phase() {
        let catalog = sample();
        let err = resolve_today(&at(1, "zz"), &catalog).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPhase(_)));
    }

    #[test]
    fn test_unknown_workout_key() {
        // Bypass the integrity check to simulate a corrupted catalog
        let mut catalog = sample();
        catalog.phases[0].workouts.remove("A");
        let err = resolve_today(&at(1, "p1"), &catalog).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownWorkoutKey { key, .. } if key == "A"));
    }

    #[test]
    fn test_week_overview() {
        let catalog = sample();
        let week = week_overview(&at(10, "p1"), &catalog).unwrap();
        assert_eq!(week.len(), 7);
        assert_eq!(week[2].token, "A");
        assert!(week[2].is_today);
        assert_eq!(week.iter().filter(|s| s.is_today).count(), 1);
        assert_eq!(week[4].workout_name.as_deref(), Some("Mobility Flow"));
        assert_eq!(week[6].token, "Rest");
    }
}
