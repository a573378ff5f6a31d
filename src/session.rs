//! Session - the context every engine operation runs against
//!
//! Holds the loaded catalog, the blob store, the progress state and the
//! exercise log. Each mutating operation updates memory first and then
//! persists; a failed write comes back as [`SessionError::Storage`] while the
//! in-memory change stays in place for the rest of the session.

use chrono::Utc;
use tracing::{info, warn};

use crate::db::BlobStore;
use crate::error::{CatalogError, SessionError};
use crate::exercise_log::{Difficulty, ExerciseLog, FieldValue, LogEntry, LogField, LogKey, LOG_KEY};
use crate::program::{Catalog, ExerciseDef, Workout};
use crate::progress::{self, Advance, ProgressState, STATE_KEY};
use crate::schedule::{self, Today, WeekSlot};
use crate::suggest::{self, Adjust};

/// Source of write timestamps (epoch millis)
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// One exercise of today's workout, ready for display
#[derive(Debug, Clone)]
pub struct ExerciseView<'a> {
    pub index: usize,
    pub def: &'a ExerciseDef,
    pub entry: Option<&'a LogEntry>,
    /// Placeholder weight; `None` for bodyweight exercises
    pub suggested_weight: Option<f64>,
}

/// Today's resolved schedule
#[derive(Debug, Clone)]
pub enum TodaysSchedule<'a> {
    Rest {
        global_day: u32,
        phase: &'a str,
    },
    Workout {
        global_day: u32,
        phase: &'a str,
        key: &'a str,
        workout: &'a Workout,
        exercises: Vec<ExerciseView<'a>>,
    },
}

pub struct Session<S: BlobStore, C: Clock = SystemClock> {
    catalog: Catalog,
    store: S,
    clock: C,
    progress: ProgressState,
    log: ExerciseLog,
}

impl<S: BlobStore> Session<S, SystemClock> {
    pub fn open(catalog: Catalog, store: S) -> Result<Self, SessionError> {
        Self::with_clock(catalog, store, SystemClock)
    }
}

impl<S: BlobStore, C: Clock> Session<S, C> {
    /// Load persisted state, falling back to defaults for anything missing
    pub fn with_clock(catalog: Catalog, mut store: S, clock: C) -> Result<Self, SessionError> {
        let log = ExerciseLog::load(&store);
        let progress = match ProgressState::load(&store) {
            Some(state) => state,
            None => {
                let state = ProgressState::initial(&catalog)?;
                if let Err(e) = state.save(&mut store) {
                    warn!("Initial progress not saved: {}", e);
                }
                state
            }
        };

        // Stale phase id from an older program version
        catalog.phase(&progress.current_phase)?;

        info!(
            "Session opened at day {} ({}), {} log entries",
            progress.global_day,
            progress.current_phase,
            log.len()
        );

        Ok(Self {
            catalog,
            store,
            clock,
            progress,
            log,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn log(&self) -> &ExerciseLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> Result<Today<'_>, CatalogError> {
        schedule::resolve_today(&self.progress, &self.catalog)
    }

    pub fn week(&self) -> Result<Vec<WeekSlot>, CatalogError> {
        schedule::week_overview(&self.progress, &self.catalog)
    }

    pub fn todays_schedule(&self) -> Result<TodaysSchedule<'_>, SessionError> {
        let global_day = self.progress.global_day;
        let phase = self.catalog.phase(&self.progress.current_phase)?.id.as_str();

        match self.today()? {
            Today::Rest => Ok(TodaysSchedule::Rest { global_day, phase }),
            Today::Workout { key, workout } => {
                let exercises = workout
                    .exercises
                    .iter()
                    .enumerate()
                    .map(|(index, def)| ExerciseView {
                        index,
                        def,
                        entry: self.log.get(LogKey::new(global_day, index)),
                        suggested_weight: self.suggestion_for(def),
                    })
                    .collect();
                Ok(TodaysSchedule::Workout {
                    global_day,
                    phase,
                    key,
                    workout,
                    exercises,
                })
            }
        }
    }

    fn suggestion_for(&self, def: &ExerciseDef) -> Option<f64> {
        if !def.uses_weight() {
            return None;
        }
        Some(suggest::suggest_weight(
            &def.name,
            def.starting_weight(),
            def.increment(),
            self.log.entries().map(|(_, e)| e),
            self.progress.global_day,
        ))
    }

    /// Exercise at `index` in today's workout plus its log key
    fn exercise(&self, index: usize) -> Result<(LogKey, &ExerciseDef), SessionError> {
        let workout = self.today()?.workout().ok_or(SessionError::RestDay)?;
        let def = workout
            .exercises
            .get(index)
            .ok_or(SessionError::NoSuchExercise {
                index,
                count: workout.exercises.len(),
            })?;
        Ok((LogKey::new(self.progress.global_day, index), def))
    }

    pub fn suggested_weight(&self, index: usize) -> Result<Option<f64>, SessionError> {
        let (_, def) = self.exercise(index)?;
        Ok(self.suggestion_for(def))
    }

    fn upsert(&mut self, index: usize, value: FieldValue) -> Result<(), SessionError> {
        let (key, def) = self.exercise(index)?;
        let name = def.name.clone();
        let now = self.clock.now_millis();
        self.log.upsert(key, &name, value, now);
        self.save_log()
    }

    fn clear(&mut self, index: usize, field: LogField) -> Result<(), SessionError> {
        let (key, _) = self.exercise(index)?;
        self.log.clear_field(key, field);
        self.save_log()
    }

    fn save_log(&mut self) -> Result<(), SessionError> {
        self.log.save(&mut self.store).map_err(|e| {
            warn!("Exercise log not saved: {}", e);
            SessionError::from(e)
        })
    }

    /// Set or clear today's weight for an exercise
    pub fn record_weight(&mut self, index: usize, weight: Option<f64>) -> Result<(), SessionError> {
        match weight {
            Some(w) if !w.is_finite() || w <= 0.0 => Err(SessionError::InvalidInput(format!(
                "weight must be a positive number, got {}",
                w
            ))),
            Some(w) => self.upsert(index, FieldValue::Weight(w)),
            None => self.clear(index, LogField::Weight),
        }
    }

    pub fn record_difficulty(
        &mut self,
        index: usize,
        difficulty: Option<Difficulty>,
    ) -> Result<(), SessionError> {
        match difficulty {
            Some(d) => self.upsert(index, FieldValue::Difficulty(d)),
            None => self.clear(index, LogField::Difficulty),
        }
    }

    /// Where a failed set broke down, both 1-based
    pub fn record_failed_point(&mut self, index: usize, set: u32, rep: u32) -> Result<(), SessionError> {
        let (_, def) = self.exercise(index)?;
        if set == 0 || set > def.sets {
            return Err(SessionError::InvalidInput(format!(
                "set must be between 1 and {}, got {}",
                def.sets, set
            )));
        }
        if rep == 0 {
            return Err(SessionError::InvalidInput("rep must be at least 1".into()));
        }
        self.upsert(index, FieldValue::FailedPoint { set, rep })
    }

    /// Blank text clears the notes
    pub fn record_notes(&mut self, index: usize, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            self.clear(index, LogField::Notes)
        } else {
            self.upsert(index, FieldValue::Notes(text.to_string()))
        }
    }

    /// Step today's weight up or down by the exercise increment.
    /// Starts from the logged weight, else the suggestion.
    pub fn adjust_weight(&mut self, index: usize, direction: Adjust) -> Result<f64, SessionError> {
        let (key, def) = self.exercise(index)?;
        if !def.uses_weight() {
            return Err(SessionError::InvalidInput(format!(
                "{} is not a weighted exercise",
                def.name
            )));
        }
        let current = self
            .log
            .get(key)
            .and_then(|e| e.weight)
            .or_else(|| self.suggestion_for(def))
            .unwrap_or_else(|| def.starting_weight());
        let next = suggest::step_weight(current, def.increment(), direction);
        self.record_weight(index, Some(next))?;
        Ok(next)
    }

    pub fn complete_workout(&mut self) -> Result<Advance, SessionError> {
        let outcome = progress::complete_workout(&mut self.progress, &self.catalog)?;
        if let Advance::Advanced { .. } = outcome {
            self.progress.save(&mut self.store).map_err(|e| {
                warn!("Progress not saved: {}", e);
                SessionError::from(e)
            })?;
        }
        Ok(outcome)
    }

    /// Wipe progress and the log. Returns false when not confirmed.
    pub fn reset_progress(&mut self, confirmed: bool) -> Result<bool, SessionError> {
        if !confirmed {
            return Ok(false);
        }

        self.log.clear();
        self.progress = ProgressState::initial(&self.catalog)?;
        info!("Progress reset");

        self.store.remove(STATE_KEY)?;
        self.store.remove(LOG_KEY)?;
        self.progress.save(&mut self.store)?;
        Ok(true)
    }

    /// Logged entries, oldest first, optionally for one exercise
    pub fn history(&self, exercise: Option<&str>) -> Vec<(LogKey, &LogEntry)> {
        self.log
            .entries()
            .filter(|(_, e)| {
                exercise.is_none_or(|name| e.exercise.to_lowercase().contains(&name.to_lowercase()))
            })
            .map(|(k, e)| (*k, e))
            .collect()
    }
}
