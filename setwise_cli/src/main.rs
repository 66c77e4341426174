use clap::{Parser, Subcommand};
use setwise_core::gesture::{Feedback, Gesture};
use setwise_core::history::load_completed_sessions;
use setwise_core::kudos::PhraseBook;
use setwise_core::session::{NoticeLevel, SessionView};
use setwise_core::ticker::Ticker;
use setwise_core::timer::{format_clock, TimerMode, TimerPurpose};
use setwise_core::*;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "setwise")]
#[command(about = "Guided workout sessions in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout session
    Run {
        /// Built-in workout id or path to a workout JSON file
        workout: Option<String>,

        /// Schedule entry this session fulfils
        #[arg(long)]
        schedule: Option<String>,

        /// Do not start the one-second ticker; advance time with `tick [N]`
        #[arg(long)]
        manual_ticks: bool,
    },

    /// List built-in workouts
    List,

    /// Show completed sessions
    History {
        /// Only sessions from the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Export completed sessions to CSV
    Export {
        /// Destination CSV file
        path: PathBuf,

        /// Only sessions from the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Manage scheduled workouts
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Schedule a workout under an id
    Add { id: String, workout: String },
    /// Show scheduled workouts and their status
    List,
}

fn main() -> Result<()> {
    setwise_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Run {
            workout,
            schedule,
            manual_ticks,
        } => cmd_run(&data_dir, &config, workout, schedule, manual_ticks),
        Commands::List => cmd_list(),
        Commands::History { days } => cmd_history(&data_dir, days),
        Commands::Export { path, days } => cmd_export(&data_dir, &path, days),
        Commands::Schedule { action } => match action {
            ScheduleAction::Add { id, workout } => cmd_schedule_add(&data_dir, &id, &workout),
            ScheduleAction::List => cmd_schedule_list(&data_dir),
        },
    }
}

fn journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("sessions").join("journal.jsonl")
}

fn schedule_path(data_dir: &Path) -> PathBuf {
    data_dir.join("schedule.json")
}

// ============================================================================
// run
// ============================================================================

enum HostEvent {
    Line(String),
    Tick,
    InputClosed,
}

fn cmd_run(
    data_dir: &Path,
    config: &Config,
    workout_ref: Option<String>,
    schedule_id: Option<String>,
    manual_ticks: bool,
) -> Result<()> {
    let board = ScheduleBoard::new(schedule_path(data_dir));

    let workout_ref = match (workout_ref, &schedule_id) {
        (Some(reference), _) => reference,
        (None, Some(id)) => board
            .get(id)?
            .map(|entry| entry.workout_id)
            .ok_or_else(|| Error::Schedule(format!("unknown schedule '{}'", id)))?,
        (None, None) => {
            return Err(Error::Workout(
                "give a workout id or file, or --schedule".into(),
            ))
        }
    };

    let workout = resolve_workout(&workout_ref)?;
    let errors = workout.validate();
    if !errors.is_empty() {
        eprintln!("Workout validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Workout("Invalid workout".into()));
    }

    let mut options = SessionOptions::from_config(&config.session);
    let mut collab = Collaborators::new(Journal::new(journal_path(data_dir)))
        .with_kudos(PhraseBook::new(config.kudos.clone()));
    if let Some(id) = schedule_id {
        options = options.with_schedule(id);
        collab = collab.with_schedule(board);
    }

    tracing::info!("Running workout {} from {:?}", workout.id, data_dir);
    print_header(&workout);
    let mut engine = SessionEngine::create(workout, options, collab)?;

    let (tx, rx) = mpsc::channel();
    spawn_input_reader(tx.clone())?;
    if !manual_ticks {
        let tick_tx = tx.clone();
        let ticker = Ticker::spawn(Duration::from_secs(1), move || {
            tick_tx.send(HostEvent::Tick).is_ok()
        })?;
        engine.attach_tick_source(Box::new(ticker));
    }
    drop(tx);

    let events = engine.drain_events();
    print_events(&engine, events);
    print_status(&engine.view());

    while engine.is_active() || engine.unsaved_summary().is_some() {
        let Ok(event) = rx.recv() else {
            break;
        };

        match event {
            HostEvent::Tick => engine.tick(),
            HostEvent::Line(line) => {
                if !handle_line(&mut engine, line.trim(), manual_ticks) {
                    break;
                }
            }
            HostEvent::InputClosed => break,
        }
        let events = engine.drain_events();
        print_events(&engine, events);
    }

    let unsaved = engine.unsaved_summary().cloned();
    if engine.is_active() {
        println!("\nSession left unfinished; nothing was saved.");
    }
    engine.dispose();

    match unsaved {
        Some(summary) => {
            eprintln!(
                "Workout summary was not saved: {} in {}",
                summary.notes,
                format_clock(summary.duration_seconds)
            );
            Err(Error::Store("completed workout could not be saved".into()))
        }
        None => Ok(()),
    }
}

fn spawn_input_reader(tx: Sender<HostEvent>) -> Result<()> {
    thread::Builder::new()
        .name("setwise-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(HostEvent::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(HostEvent::InputClosed);
        })?;
    Ok(())
}

/// Apply one input line. Returns false when the host should stop.
fn handle_line(engine: &mut SessionEngine, line: &str, manual_ticks: bool) -> bool {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("done").to_lowercase();

    if engine.exit_pending() {
        if matches!(command.as_str(), "y" | "yes") {
            engine.confirm_exit();
        } else {
            engine.cancel_exit();
            println!("Carrying on.");
        }
        return true;
    }

    if engine.state() == LifecycleState::Completed {
        return match command.as_str() {
            "retry" | "r" => {
                engine.retry_save();
                true
            }
            "quit" | "q" | "exit" => false,
            _ => {
                println!("Type 'retry' to save again or 'quit' to give up.");
                true
            }
        };
    }

    match command.as_str() {
        "done" | "d" => engine.complete_current_set(),
        "tap" | "t" => engine.handle_gesture(Gesture::Tap),
        "hold" | "h" => engine.handle_gesture(Gesture::Hold),
        "next" | "n" => engine.advance_exercise(),
        "prev" | "p" => engine.go_to_previous_exercise(),
        "exit" | "q" | "quit" => engine.request_exit(),
        "status" | "s" => print_status(&engine.view()),
        "tick" if manual_ticks => {
            let count = parts.next().and_then(|n| n.parse::<u32>().ok()).unwrap_or(1);
            for _ in 0..count {
                engine.tick();
                let events = engine.drain_events();
                print_events(engine, events);
                if !engine.is_active() {
                    break;
                }
            }
        }
        "help" | "?" => print_help(manual_ticks),
        other => println!("Unknown command '{}'. Type 'help' for commands.", other),
    }
    true
}

fn print_header(workout: &Workout) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", workout.name);
    println!("╰─────────────────────────────────────────╯");
    for exercise in &workout.exercises {
        let mut line = format!("  {}. {} × {} sets", exercise.order, exercise.name, exercise.sets);
        if let Some(reps) = exercise.timing.reps() {
            line.push_str(&format!(", {} reps", reps));
        }
        if let Some(work) = exercise.timing.work_seconds() {
            line.push_str(&format!(", {} work", format_clock(work as u64)));
        }
        if let Some(rest) = exercise.rest_seconds {
            line.push_str(&format!(", {} rest", format_clock(rest as u64)));
        }
        println!("{}", line);
    }
    println!("\nType 'help' for commands. Enter marks the current set done.\n");
}

fn print_help(manual_ticks: bool) {
    println!("  done (Enter)  complete the current set");
    println!("  tap           start / pause / resume the timer");
    println!("  hold          reset the timer and skip pending rest");
    println!("  next, prev    move between exercises");
    println!("  status        show where you are");
    println!("  exit          leave the session (asks to confirm)");
    if manual_ticks {
        println!("  tick [N]      advance time by N seconds");
    }
}

fn print_status(view: &SessionView) {
    if view.state != LifecycleState::Active {
        return;
    }
    let mut line = format!(
        "── {}/{} {} · {}",
        view.exercise_index + 1,
        view.exercise_count,
        view.exercise_name,
        view.set_label
    );
    if let Some(reps) = &view.reps_label {
        line.push_str(&format!(" · {}", reps));
    }
    println!("{}", line);
    if let Some(notes) = &view.notes {
        println!("   {}", notes);
    }

    let timer = match (view.timer_mode, view.timer_purpose) {
        (TimerMode::Idle, _) => "idle".to_string(),
        (TimerMode::Paused, purpose) => format!("{} paused at {}", purpose_label(purpose), view.countdown_text),
        (_, purpose) => format!("{} {}", purpose_label(purpose), view.countdown_text),
    };
    println!(
        "   Timer: {} | Elapsed {} | Progress {:.0}% | next: {}",
        timer,
        view.elapsed_text,
        view.progress * 100.0,
        view.next_label
    );
}

fn purpose_label(purpose: TimerPurpose) -> &'static str {
    match purpose {
        TimerPurpose::Work => "work",
        TimerPurpose::Rest => "rest",
        TimerPurpose::None => "timer",
    }
}

fn print_events(engine: &SessionEngine, events: Vec<EngineEvent>) {
    for event in events {
        match event {
            EngineEvent::Started { session_id } => {
                if let Some(id) = session_id {
                    println!("Session {} started.", id);
                }
            }
            EngineEvent::Feedback(Feedback::HoldArmed) => println!("  (hold)"),
            EngineEvent::Feedback(Feedback::Pressed) => {}
            EngineEvent::TimerStarted { purpose, seconds } => {
                println!("  {} timer: {}", purpose_label(purpose), format_clock(seconds))
            }
            EngineEvent::TimerPaused => println!("  Timer paused"),
            EngineEvent::TimerResumed => println!("  Timer resumed"),
            EngineEvent::TimerReset => println!("  Timer reset"),
            EngineEvent::CountdownTick(remaining) => {
                if remaining % 10 == 0 || remaining <= 3 {
                    println!("  {}", format_clock(remaining));
                }
            }
            EngineEvent::TimerExpired(TimerPurpose::Rest) => println!("  Rest over!"),
            EngineEvent::TimerExpired(_) => println!("  Time!"),
            EngineEvent::RestStarted { seconds } => {
                println!("  Rest for {}", format_clock(seconds))
            }
            EngineEvent::SetCompleted {
                exercise_id,
                set_number,
            } => println!("✓ {} set {} done", exercise_id, set_number),
            EngineEvent::CursorMoved { .. } => print_status(&engine.view()),
            EngineEvent::Kudos { phrase, .. } => println!("  ★ {}", phrase),
            EngineEvent::ExitRequested => {
                println!("Exit and discard this session? Type 'y' to confirm, anything else to keep going.")
            }
            EngineEvent::Completed(summary) => {
                println!("\n✓ Workout complete!");
                println!("  {}", summary.notes);
                println!("  Duration: {}", format_clock(summary.duration_seconds));
                println!("  Calories: {} kcal", summary.calories_burned);
            }
            EngineEvent::Saved(id) => println!("✓ Session saved ({})", id),
            EngineEvent::SaveFailed { message } => {
                println!("✗ Couldn't save your workout: {}", message);
                println!("  Type 'retry' to try again or 'quit' to give up.");
            }
            EngineEvent::Abandoned => println!("\nSession abandoned. Nothing was saved."),
            EngineEvent::Notice(notice) => match notice.level {
                NoticeLevel::Info => println!("  {}", notice.message),
                NoticeLevel::Warning | NoticeLevel::Error => println!("! {}", notice.message),
            },
        }
    }
}

// ============================================================================
// list / history / export / schedule
// ============================================================================

fn cmd_list() -> Result<()> {
    for workout in default_catalog().values() {
        println!(
            "{:<16} {} ({} exercises, {} sets)",
            workout.id,
            workout.name,
            workout.exercises.len(),
            workout.total_sets()
        );
    }
    Ok(())
}

fn cmd_history(data_dir: &Path, days: Option<i64>) -> Result<()> {
    let sessions = load_completed_sessions(&journal_path(data_dir), days)?;
    if sessions.is_empty() {
        println!("No completed sessions yet.");
        return Ok(());
    }

    for session in &sessions {
        println!(
            "{}  {:<16} {:>8}  {:>4} kcal  {}",
            session.summary.completed_at.format("%Y-%m-%d %H:%M"),
            session.summary.workout_id,
            format_clock(session.summary.duration_seconds),
            session.summary.calories_burned,
            session.summary.notes
        );
    }
    Ok(())
}

fn cmd_export(data_dir: &Path, path: &Path, days: Option<i64>) -> Result<()> {
    let sessions = load_completed_sessions(&journal_path(data_dir), days)?;
    let count = setwise_core::export::export_csv(&sessions, path)?;
    println!("✓ Exported {} sessions to {}", count, path.display());
    Ok(())
}

fn cmd_schedule_add(data_dir: &Path, id: &str, workout_ref: &str) -> Result<()> {
    let workout = resolve_workout(workout_ref)?;
    let mut board = ScheduleBoard::new(schedule_path(data_dir));
    board.add(id, workout_ref)?;
    println!("✓ Scheduled '{}' as {}", workout.name, id);
    Ok(())
}

fn cmd_schedule_list(data_dir: &Path) -> Result<()> {
    let board = ScheduleBoard::new(schedule_path(data_dir));
    let entries = board.entries()?;
    if entries.is_empty() {
        println!("Nothing scheduled.");
        return Ok(());
    }
    for (id, entry) in entries {
        println!("{:<12} {:<16} {}", id, entry.workout_id, entry.status);
    }
    Ok(())
}
