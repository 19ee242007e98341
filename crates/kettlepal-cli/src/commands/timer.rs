use std::io::Write;
use std::time::Duration;

use clap::Args;
use kettlepal_core::summary::{format_elapsed, parse_elapsed};
use kettlepal_core::SessionTimer;

#[derive(Args)]
pub struct TimerArgs {
    /// Stop automatically after this many elapsed seconds
    #[arg(long)]
    seconds: Option<u64>,
    /// Starting value (seconds, MM:SS or HH:MM:SS)
    #[arg(long)]
    from: Option<String>,
}

/// Tick a session timer in the terminal until the limit or Ctrl-C.
pub async fn run(args: TimerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = SessionTimer::new();
    if let Some(raw) = &args.from {
        let start = parse_elapsed(raw).ok_or_else(|| format!("invalid time: {raw}"))?;
        timer.set_elapsed(start);
    }
    timer.start()?;

    let mut display = tokio::time::interval(Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = display.tick() => {
                let elapsed = timer.elapsed_seconds();
                write!(stdout, "\r{}", format_elapsed(elapsed))?;
                stdout.flush()?;
                if args.seconds.is_some_and(|limit| elapsed >= limit) {
                    break;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    timer.stop();
    writeln!(stdout)?;
    println!("elapsed: {}", format_elapsed(timer.elapsed_seconds()));
    Ok(())
}
