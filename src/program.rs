//! Program catalog - phases, weekly schedules, workouts and exercises
//!
//! The catalog is loaded once per session from a JSON document (local file or
//! HTTP URL), checked for integrity, and treated as immutable afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::CatalogError;

/// Schedule token meaning "no workout today"
pub const REST: &str = "Rest";

/// Slots in a schedule pattern
pub const DAYS_PER_WEEK: usize = 7;

/// Step used by weight suggestions when an exercise doesn't set one
pub const DEFAULT_WEIGHT_INCREMENT: f64 = 5.0;

/// Cold-start weight when an exercise doesn't set one
pub const DEFAULT_STARTING_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub meta: Option<ProgramMeta>,
    pub phases: Vec<Phase>,
}

/// Descriptive program metadata, not used by the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramMeta {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub principles: Vec<String>,
    #[serde(default)]
    pub constraints: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub duration_weeks: u32,
    /// Seven workout keys or `Rest`. A phase without a pattern is all rest.
    #[serde(default)]
    pub schedule_pattern: Option<Vec<String>>,
    #[serde(default)]
    pub workouts: BTreeMap<String, Workout>,
}

impl Phase {
    pub fn days(&self) -> u32 {
        self.duration_weeks.saturating_mul(DAYS_PER_WEEK as u32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub name: String,
    #[serde(default)]
    pub focus: String,
    /// Order matters: the position is the exercise slot in log keys
    pub exercises: Vec<ExerciseDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseDef {
    pub name: String,
    pub sets: u32,
    #[serde(deserialize_with = "display_string")]
    pub reps: String,
    #[serde(default, deserialize_with = "display_string")]
    pub rest: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_start: Option<u32>,
    #[serde(default)]
    pub uses_weight: Option<bool>,
    #[serde(default)]
    pub starting_weight: Option<f64>,
    #[serde(default)]
    pub weight_increment: Option<f64>,
}

impl ExerciseDef {
    /// Older catalogs omit the flag; every exercise was weighted back then
    pub fn uses_weight(&self) -> bool {
        self.uses_weight.unwrap_or(true)
    }

    pub fn starting_weight(&self) -> f64 {
        self.starting_weight.unwrap_or(DEFAULT_STARTING_WEIGHT)
    }

    pub fn increment(&self) -> f64 {
        self.weight_increment.unwrap_or(DEFAULT_WEIGHT_INCREMENT)
    }

    pub fn video_url(&self) -> Option<String> {
        let id = self.video_id.as_deref()?;
        let mut url = format!("https://www.youtube.com/embed/{}?autoplay=1&rel=0", id);
        if let Some(start) = self.video_start {
            url.push_str(&format!("&start={}", start));
        }
        Some(url)
    }
}

/// Program files write reps/rest as either "8-10" or 10
fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Display {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Display::deserialize(deserializer)? {
        Display::Text(s) => s,
        Display::Number(n) => n.to_string(),
    })
}

impl Catalog {
    /// Parse and integrity-check a program document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check_integrity()?;
        Ok(catalog)
    }

    /// Load from a file path or an `http(s)://` URL
    pub async fn load(source: &str) -> Result<Self, CatalogError> {
        let json = if source.starts_with("http://") || source.starts_with("https://") {
            reqwest::get(source).await?.error_for_status()?.text().await?
        } else {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|source_err| CatalogError::Read {
                    path: source.to_string(),
                    source: source_err,
                })?
        };

        let catalog = Self::from_json(&json)?;
        info!(
            "Loaded program from {} ({} phases)",
            source,
            catalog.phases.len()
        );
        Ok(catalog)
    }

    pub fn first_phase(&self) -> Option<&Phase> {
        self.phases.first()
    }

    pub fn phase(&self, id: &str) -> Result<&Phase, CatalogError> {
        self.phases
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownPhase(id.to_string()))
    }

    pub fn phase_index(&self, id: &str) -> Result<usize, CatalogError> {
        self.phases
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownPhase(id.to_string()))
    }

    /// Structural checks the engine relies on
    pub fn check_integrity(&self) -> Result<(), CatalogError> {
        if self.phases.is_empty() {
            return Err(CatalogError::NoPhases);
        }

        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.id.as_str()) {
                return Err(CatalogError::DuplicatePhase(phase.id.clone()));
            }
            if phase.duration_weeks == 0 {
                return Err(CatalogError::InvalidDuration(phase.id.clone()));
            }

            if let Some(pattern) = &phase.schedule_pattern {
                if pattern.len() != DAYS_PER_WEEK {
                    return Err(CatalogError::MalformedSchedule {
                        phase: phase.id.clone(),
                        len: pattern.len(),
                    });
                }
                for token in pattern.iter().filter(|t| *t != REST) {
                    if !phase.workouts.contains_key(token) {
                        return Err(CatalogError::UnknownWorkoutKey {
                            phase: phase.id.clone(),
                            key: token.clone(),
                        });
                    }
                }
            }

            for workout in phase.workouts.values() {
                if let Some(ex) = workout.exercises.iter().find(|ex| ex.sets == 0) {
                    return Err(CatalogError::InvalidSets {
                        workout: workout.name.clone(),
                        exercise: ex.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-phase program used across the crate's tests
    pub(crate) const SAMPLE: &str = r#"{
        "meta": { "startDate": "2026-01-05", "version": "1.0", "principles": ["form_over_load"] },
        "phases": [
            {
                "id": "p1",
                "name": "Foundation",
                "duration_weeks": 1,
                "schedule_pattern": ["A", "B", "A", "B", "C", "Rest", "Rest"],
                "workouts": {
                    "A": {
                        "name": "Posterior Chain",
                        "focus": "Hinge",
                        "exercises": [
                            { "name": "Warmup: Cat-Cow", "sets": 1, "reps": "10", "rest": "0s", "uses_weight": false },
                            { "name": "Squat", "sets": 3, "reps": "8-10", "rest": "90s", "starting_weight": 45, "weight_increment": 5, "video_id": "abc", "video_start": 12 },
                            { "name": "Romanian Deadlift", "sets": 3, "reps": 10, "rest": "90s" }
                        ]
                    },
                    "B": {
                        "name": "Push Pull",
                        "focus": "Upper",
                        "exercises": [
                            { "name": "Press", "sets": 3, "reps": "8", "rest": "60s", "starting_weight": 20, "weight_increment": 2.5 }
                        ]
                    },
                    "C": {
                        "name": "Mobility Flow",
                        "focus": "Recovery",
                        "exercises": [
                            { "name": "Hip Flow", "sets": 2, "reps": "5 min", "rest": "-", "uses_weight": false }
                        ]
                    }
                }
            },
            {
                "id": "p2",
                "name": "Build",
                "duration_weeks": 2,
                "schedule_pattern": ["D", "Rest", "D", "Rest", "D", "Rest", "Rest"],
                "workouts": {
                    "D": {
                        "name": "Full Body Strength",
                        "focus": "Compound",
                        "exercises": [
                            { "name": "Squat", "sets": 5, "reps": "5", "rest": "120s", "starting_weight": 45 }
                        ]
                    }
                }
            },
            { "id": "p3", "name": "Peak (placeholder)", "duration_weeks": 4 }
        ]
    }"#;

    pub(crate) fn sample() -> Catalog {
        Catalog::from_json(SAMPLE).unwrap()
    }

    fn with_phases(phases: &str) -> String {
        format!(r#"{{ "phases": {} }}"#, phases)
    }

    #[test]
    fn test_parse_sample() {
        let catalog = sample();
        assert_eq!(catalog.phases.len(), 3);
        assert_eq!(catalog.first_phase().unwrap().id, "p1");
        let meta = catalog.meta.as_ref().unwrap();
        assert_eq!(meta.version.as_deref(), Some("1.0"));
        assert_eq!(meta.start_date.as_deref(), Some("2026-01-05"));
    }

    #[test]
    fn test_numeric_reps_become_text() {
        let catalog = sample();
        let rdl = &catalog.phases[0].workouts["A"].exercises[2];
        assert_eq!(rdl.reps, "10");
    }

    #[test]
    fn test_exercise_defaults() {
        let catalog = sample();
        let ex = &catalog.phases[0].workouts["A"].exercises;
        assert!(!ex[0].uses_weight());
        assert!(ex[2].uses_weight());
        assert_eq!(ex[2].starting_weight(), DEFAULT_STARTING_WEIGHT);
        assert_eq!(ex[2].increment(), DEFAULT_WEIGHT_INCREMENT);
        assert_eq!(ex[1].starting_weight(), 45.0);
    }

    #[test]
    fn test_video_url() {
        let catalog = sample();
        let ex = &catalog.phases[0].workouts["A"].exercises;
        assert_eq!(
            ex[1].video_url().as_deref(),
            Some("https://www.youtube.com/embed/abc?autoplay=1&rel=0&start=12")
        );
        assert_eq!(ex[2].video_url(), None);
    }

    #[test]
    fn test_phase_days() {
        let catalog = sample();
        assert_eq!(catalog.phases[0].days(), 7);
        assert_eq!(catalog.phases[1].days(), 14);
        let json = with_phases(r#"[{ "id": "p1", "name": "x", "duration_weeks": 4294967295 }]"#);
        let huge = Catalog::from_json(&json).unwrap();
        assert_eq!(huge.phases[0].days(), u32::MAX);
    }

    #[test]
    fn test_unknown_phase_lookup() {
        let catalog = sample();
        assert!(matches!(catalog.phase("p9"), Err(CatalogError::UnknownPhase(id)) if id == "p9"));
    }

    #[test]
    fn test_rejects_no_phases() {
        let err = Catalog::from_json(&with_phases("[]")).unwrap_err();
        assert!(matches!(err, CatalogError::NoPhases));
    }

    #[test]
    fn test_rejects_short_pattern() {
        let json = with_phases(
            r#"[{ "id": "p1", "name": "x", "duration_weeks": 1, "schedule_pattern": ["Rest", "Rest"] }]"#,
        );
        let err = Catalog::from_json(&json).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedSchedule { len: 2, .. }));
    }

    #[test]
    fn test_rejects_unknown_workout_key() {
        let json = with_phases(
            r#"[{ "id": "p1", "name": "x", "duration_weeks": 1,
                 "schedule_pattern": ["A", "Rest", "Rest", "Rest", "Rest", "Rest", "Rest"] }]"#,
        );
        let err = Catalog::from_json(&json).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownWorkoutKey { key, .. } if key == "A"));
    }

    #[test]
    fn test_rejects_duplicate_phase() {
        let json = with_phases(
            r#"[{ "id": "p1", "name": "x", "duration_weeks": 1 },
                { "id": "p1", "name": "y", "duration_weeks": 1 }]"#,
        );
        assert!(matches!(
            Catalog::from_json(&json).unwrap_err(),
            CatalogError::DuplicatePhase(_)
        ));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let json = with_phases(r#"[{ "id": "p1", "name": "x", "duration_weeks": 0 }]"#);
        assert!(matches!(
            Catalog::from_json(&json).unwrap_err(),
            CatalogError::InvalidDuration(_)
        ));
    }

    #[test]
    fn test_rejects_zero_sets() {
        let json = with_phases(
            r#"[{ "id": "p1", "name": "x", "duration_weeks": 1, "workouts": {
                "A": { "name": "A", "exercises": [{ "name": "Squat", "sets": 0, "reps": "5" }] } } }]"#,
        );
        assert!(matches!(
            Catalog::from_json(&json).unwrap_err(),
            CatalogError::InvalidSets { .. }
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Catalog::from_json("{ not json").unwrap_err(),
            CatalogError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("basement_lab_program_{}.json", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let catalog = Catalog::load(&path.to_string_lossy()).await.unwrap();
        assert_eq!(catalog.phases.len(), 3);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Catalog::load("/definitely/not/here/program.json").await.unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_from_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data/program.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE)
            .create_async()
            .await;

        let url = format!("{}/data/program.json", server.url());
        let catalog = Catalog::load(&url).await.unwrap();
        assert_eq!(catalog.phases[1].id, "p2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_load_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/program.json")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/program.json", server.url());
        let err = Catalog::load(&url).await.unwrap_err();
        assert!(matches!(err, CatalogError::Fetch(_)));
    }
}
