use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use clap::Subcommand;
use kettlepal_core::compose::{parse_timestamp, Outcome, SaveRequest};
use kettlepal_core::summary::parse_elapsed;
use kettlepal_core::validation::Located;
use kettlepal_core::{
    ComposeError, Composer, Config, ExerciseEdit, GraphQlClient, WorkoutEdit,
};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Compose and save a new workout
    Log {
        /// Workout date (YYYY-MM-DD, RFC 3339, or "today")
        #[arg(long, default_value = "today")]
        date: String,
        /// Workout comment
        #[arg(long)]
        comment: Option<String>,
        /// Elapsed time (seconds, MM:SS or HH:MM:SS)
        #[arg(long)]
        elapsed: Option<String>,
        /// Exercise as "<title>;sets=3;reps=10;weight=135;unit=lb" (repeatable)
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        /// Submit exercise start/end times
        #[arg(long)]
        tracking: bool,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Print composer events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Load a saved workout, apply edits and save it again
    Edit {
        /// Workout uid
        uid: String,
        /// Replace the workout comment ("" clears it)
        #[arg(long)]
        comment: Option<String>,
        /// Replace the elapsed time
        #[arg(long)]
        elapsed: Option<String>,
        /// Field edit as "<n>:<field>=<value>", n counted from 1 (repeatable)
        #[arg(long = "set")]
        sets: Vec<String>,
        /// Append an exercise, same format as `log --exercise` (repeatable)
        #[arg(long = "add")]
        add: Vec<String>,
        /// Remove the n-th exercise, counted from 1 (repeatable)
        #[arg(long = "remove")]
        remove: Vec<usize>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Print composer events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: WorkoutAction) -> CliResult {
    let config = Config::load_or_default();
    match action {
        WorkoutAction::Log {
            date,
            comment,
            elapsed,
            exercises,
            tracking,
            yes,
            json,
        } => {
            let mut composer = Composer::new(config.composer.clone());
            composer.handle_state_change(WorkoutEdit::CreatedAt(Some(parse_date(&date)?)))?;
            if tracking && !composer.show_tracking() {
                composer.toggle_tracking();
            }
            if let Some(comment) = comment {
                set_comment(&mut composer, comment)?;
            }
            if let Some(raw) = elapsed {
                composer.set_time(parse_time(&raw)?)?;
            }
            for arg in &exercises {
                add_exercise(&mut composer, arg)?;
            }
            save(&mut composer, &config, yes, json).await
        }
        WorkoutAction::Edit {
            uid,
            comment,
            elapsed,
            sets,
            add,
            mut remove,
            yes,
            json,
        } => {
            tracing::debug!(%uid, endpoint = %config.api.endpoint, "loading workout for edit");
            let client = GraphQlClient::from_config(&config)?;
            let mut composer = Composer::load(&client, &uid, config.composer.clone()).await?;

            if let Some(comment) = comment {
                set_comment(&mut composer, comment)?;
            }
            if let Some(raw) = elapsed {
                composer.set_time(parse_time(&raw)?)?;
            }
            for arg in &sets {
                let (index, edit) = parse_set(arg)?;
                if !composer.handle_exercise(index, edit)? {
                    return Err(format!("no exercise #{}", index + 1).into());
                }
            }
            // Highest first, so earlier removals do not shift later ones.
            remove.sort_unstable();
            remove.dedup();
            for n in remove.into_iter().rev() {
                let index = ordinal(n)?;
                if composer.delete_exercise(index)?.is_none() {
                    return Err(format!("no exercise #{n}").into());
                }
            }
            for arg in &add {
                add_exercise(&mut composer, arg)?;
            }
            save(&mut composer, &config, yes, json).await
        }
    }
}

fn parse_date(raw: &str) -> CliResult<DateTime<Utc>> {
    if raw.eq_ignore_ascii_case("today") {
        return Ok(Utc::now());
    }
    parse_timestamp(raw).ok_or_else(|| format!("invalid date: {raw}").into())
}

fn parse_time(raw: &str) -> CliResult<u64> {
    parse_elapsed(raw).ok_or_else(|| format!("invalid time: {raw}").into())
}

fn ordinal(n: usize) -> CliResult<usize> {
    n.checked_sub(1)
        .ok_or_else(|| "exercises are counted from 1".into())
}

fn set_comment(composer: &mut Composer, comment: String) -> Result<(), ComposeError> {
    if !composer.add_workout_comment() {
        composer.toggle_workout_comment();
    }
    let comment = Some(comment).filter(|c| !c.trim().is_empty());
    composer.handle_state_change(WorkoutEdit::Comment(comment))
}

/// `Bench Press;sets=3;reps=10;weight=135;unit=lb` -> title edit plus one
/// edit per `key=value` pair. Keys are field names in either spelling;
/// `unit` is short for `weightUnit`.
fn parse_exercise_arg(arg: &str) -> Result<Vec<ExerciseEdit>, ComposeError> {
    let mut parts = arg.split(';');
    let title = parts.next().unwrap_or_default().trim();
    let mut edits = vec![ExerciseEdit::Title(title.to_string())];
    for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
        edits.push(parse_assignment(part)?);
    }
    Ok(edits)
}

fn parse_assignment(part: &str) -> Result<ExerciseEdit, ComposeError> {
    let (key, value) = part
        .split_once('=')
        .ok_or_else(|| ComposeError::UnknownField(part.to_string()))?;
    let key = match key.trim() {
        "unit" => "weightUnit",
        other => other,
    };
    ExerciseEdit::parse(key, value)
}

/// `2:reps=8` -> (index 1, reps edit).
fn parse_set(arg: &str) -> CliResult<(usize, ExerciseEdit)> {
    let (n, assignment) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected <n>:<field>=<value>, got '{arg}'"))?;
    let n: usize = n
        .trim()
        .parse()
        .map_err(|_| format!("invalid exercise number: {n}"))?;
    Ok((ordinal(n)?, parse_assignment(assignment)?))
}

fn add_exercise(composer: &mut Composer, arg: &str) -> Result<(), ComposeError> {
    let edits = parse_exercise_arg(arg)?;
    let key = composer.handle_add_exercise()?;
    for edit in edits {
        composer.handle_exercise_key(key, edit)?;
    }
    Ok(())
}

fn describe(composer: &Composer, located: &Located) -> String {
    let position = located
        .slot
        .and_then(|key| composer.draft().exercises.position(key));
    match position {
        Some(index) => format!("exercise #{}: {}", index + 1, located.violation),
        None => located.violation.message(),
    }
}

fn print_events(composer: &mut Composer, json: bool) -> CliResult {
    let events = composer.drain_events();
    if json {
        for event in events {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

fn confirm(question: &str) -> CliResult<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn save(composer: &mut Composer, config: &Config, yes: bool, json: bool) -> CliResult {
    let confirmation = match composer.request_save()? {
        SaveRequest::Blocked(violations) => {
            print_events(composer, json)?;
            for located in &violations {
                eprintln!("  - {}", describe(composer, located));
            }
            return Err(format!("workout not saved: {} problem(s)", violations.len()).into());
        }
        SaveRequest::Confirm(confirmation) => confirmation,
    };

    if !yes {
        for line in confirmation.lines() {
            println!("{line}");
        }
        println!("Elapsed: {}", confirmation.elapsed);
        if !confirm("Save this workout?")? {
            composer.cancel_save()?;
            print_events(composer, json)?;
            println!("not saved");
            return Ok(());
        }
    }

    let user_uid = match composer.workout_uid() {
        Some(_) => String::new(),
        None => config.require_user_uid()?.to_string(),
    };
    let client = GraphQlClient::from_config(config)?;
    let outcome = composer.confirm_save(&client, &user_uid).await?;
    print_events(composer, json)?;

    match outcome {
        Outcome::Saved {
            workout_uid,
            exercise_count,
        } => {
            if !json {
                println!("saved workout {workout_uid} ({exercise_count} exercises)");
            }
            Ok(())
        }
        Outcome::Failed { error, .. } => {
            if error.is_partial() {
                eprintln!("the workout was only partly saved; run `workout edit` to finish it");
            }
            Err(error.into())
        }
    }
}
