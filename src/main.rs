//! basement-lab - Personal workout tracker
//!
//! Follows a phased program one day at a time and logs what was lifted.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use basement_lab::exercise_log::Difficulty;
use basement_lab::progress::Advance;
use basement_lab::session::TodaysSchedule;
use basement_lab::suggest::Adjust;
use basement_lab::tui::App;
use basement_lab::{Catalog, Database, Session, SessionError};

#[derive(Parser)]
#[command(name = "basement-lab")]
#[command(author, version, about = "Basement Lab - phased workout program tracker")]
struct Cli {
    /// SQLite file holding progress and the exercise log
    #[arg(long, env = "BASEMENT_LAB_DB", default_value = "basement_lab.db", global = true)]
    db: String,

    /// Program JSON: file path or http(s) URL
    #[arg(long, env = "BASEMENT_LAB_PROGRAM", default_value = "data/program.json", global = true)]
    program: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Show today's workout
    Today,

    /// Show this week's schedule
    Week,

    /// Record today's weight for an exercise
    Weight {
        /// Exercise number as shown by `today` (1-based)
        exercise: usize,

        /// Weight lifted
        #[arg(required_unless_present = "clear")]
        value: Option<f64>,

        /// Remove the recorded weight
        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },

    /// Step today's weight up or down by the exercise increment
    Adjust {
        exercise: usize,

        /// up or down
        direction: Adjust,
    },

    /// Record perceived difficulty (easy, good, hard, failed, none)
    Difficulty {
        exercise: usize,
        level: String,
    },

    /// Record where a failed set broke down
    Failed {
        exercise: usize,
        set: u32,
        rep: u32,
    },

    /// Record notes; no text clears them
    Notes {
        exercise: usize,
        text: Vec<String>,
    },

    /// Show the suggested weight for an exercise
    Suggest {
        exercise: usize,
    },

    /// Complete today's workout and advance one day
    Complete,

    /// Reset day counter and exercise log
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List logged exercises
    History {
        /// Filter by exercise name
        exercise: Option<String>,

        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Check the program file and print a summary
    Validate,
}

/// 1-based exercise number from the command line to a slot index
fn slot(exercise: usize) -> Result<usize> {
    match exercise.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("exercise numbers start at 1"),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Mutations that fail to persist still print, but as a warning
fn saved(result: Result<(), SessionError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_unsaved() => {
            eprintln!("Warning: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_today(session: &Session<Database>) -> Result<()> {
    match session.todays_schedule()? {
        TodaysSchedule::Rest { global_day, phase } => {
            println!("Day {} ({}) - rest day", global_day, phase);
        }
        TodaysSchedule::Workout { global_day, phase, workout, exercises, .. } => {
            println!("Day {} ({}) - {} [{}]", global_day, phase, workout.name, workout.focus);
            println!("{:-<72}", "");
            for ex in exercises {
                let weight = match (ex.entry.and_then(|e| e.weight), ex.suggested_weight) {
                    (Some(w), _) => format!("{} lbs", w),
                    (None, Some(s)) => format!("~{} lbs", s),
                    (None, None) => "-".to_string(),
                };
                let difficulty = ex
                    .entry
                    .and_then(|e| e.difficulty)
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                println!(
                    "{:>2}. {:28} | {}x{:6} | rest {:6} | {:10} | {}",
                    ex.index + 1,
                    ex.def.name,
                    ex.def.sets,
                    ex.def.reps,
                    ex.def.rest,
                    weight,
                    difficulty
                );
                if let Some(note) = &ex.def.note {
                    println!("    {}", note);
                }
                if let Some(notes) = ex.entry.and_then(|e| e.notes.as_deref()) {
                    println!("    > {}", notes);
                }
                if let Some(url) = ex.def.video_url() {
                    println!("    video: {}", url);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = Catalog::load(&cli.program)
        .await
        .with_context(|| format!("Error loading program from {}", cli.program))?;

    let db = Database::open(&cli.db)?;
    let mut session = Session::open(catalog, db)?;

    match cli.command {
        Some(Commands::Today) => print_today(&session)?,

        Some(Commands::Week) => {
            for (i, day) in session.week()?.iter().enumerate() {
                println!(
                    "{} {} {}",
                    if day.is_today { ">" } else { " " },
                    i + 1,
                    day.workout_name.as_deref().unwrap_or(&day.token)
                );
            }
        }

        Some(Commands::Weight { exercise, value, clear }) => {
            let value = if clear { None } else { value };
            saved(session.record_weight(slot(exercise)?, value))?;
            match value {
                Some(w) => println!("Logged {} lbs for #{}", w, exercise),
                None => println!("Cleared weight for #{}", exercise),
            }
        }

        Some(Commands::Adjust { exercise, direction }) => {
            match session.adjust_weight(slot(exercise)?, direction) {
                Ok(w) => println!("#{} now {} lbs", exercise, w),
                Err(e) if e.is_unsaved() => eprintln!("Warning: {}", e),
                Err(e) => return Err(e.into()),
            }
        }

        Some(Commands::Difficulty { exercise, level }) => {
            let difficulty = match level.as_str() {
                "none" | "clear" => None,
                other => Some(other.parse::<Difficulty>().map_err(anyhow::Error::msg)?),
            };
            saved(session.record_difficulty(slot(exercise)?, difficulty))?;
            println!("#{}: {}", exercise, level);
        }

        Some(Commands::Failed { exercise, set, rep }) => {
            saved(session.record_failed_point(slot(exercise)?, set, rep))?;
            println!("#{}: failed at set {}, rep {}", exercise, set, rep);
        }

        Some(Commands::Notes { exercise, text }) => {
            let text = text.join(" ");
            saved(session.record_notes(slot(exercise)?, &text))?;
            println!("#{}: notes {}", exercise, if text.trim().is_empty() { "cleared" } else { "saved" });
        }

        Some(Commands::Suggest { exercise }) => match session.suggested_weight(slot(exercise)?)? {
            Some(w) => println!("Suggested: {} lbs", w),
            None => println!("Bodyweight exercise"),
        },

        Some(Commands::Complete) => match session.complete_workout() {
            Ok(Advance::Advanced { global_day, phase_change }) => {
                println!("Advanced to day {}", global_day);
                if let Some(change) = phase_change {
                    println!("New phase: {} -> {}", change.from, change.to);
                }
                print_today(&session)?;
            }
            Ok(Advance::ProgramComplete) => {
                println!("Congratulations! You completed the 365-day program!");
            }
            Err(e) if e.is_unsaved() => eprintln!("Warning: {}", e),
            Err(e) => return Err(e.into()),
        },

        Some(Commands::Reset { yes }) => {
            let confirmed = yes
                || confirm("Reset all progress? This will clear your day count and exercise log.")?;
            if session.reset_progress(confirmed)? {
                println!("Progress reset to day 1");
            } else {
                println!("Nothing changed");
            }
        }

        Some(Commands::History { exercise, limit }) => {
            let history = session.history(exercise.as_deref());
            println!("Logged exercises:");
            println!("{:-<72}", "");
            for (key, entry) in history.iter().rev().take(limit) {
                println!(
                    "day {:>3} #{} | {:24} | {:>8} | {:8} | {}",
                    key.day,
                    key.slot + 1,
                    entry.exercise,
                    entry.weight.map(|w| format!("{} lbs", w)).unwrap_or_else(|| "-".into()),
                    entry.difficulty.map(|d| d.to_string()).unwrap_or_default(),
                    entry.notes.as_deref().unwrap_or("")
                );
            }
        }

        Some(Commands::Validate) => {
            let catalog = session.catalog();
            println!("Program OK: {} phase(s)", catalog.phases.len());
            if let Some(meta) = &catalog.meta {
                println!(
                    "Version {} starting {}",
                    meta.version.as_deref().unwrap_or("-"),
                    meta.start_date.as_deref().unwrap_or("-")
                );
            }
            for phase in &catalog.phases {
                println!(
                    "  {:6} {:30} {:>2} weeks, {} workouts",
                    phase.id,
                    phase.name,
                    phase.duration_weeks,
                    phase.workouts.len()
                );
            }
        }

        Some(Commands::Tui) | None => {
            // Default: show TUI
            let mut app = App::new(session);
            app.run()?;
        }
    }

    Ok(())
}
