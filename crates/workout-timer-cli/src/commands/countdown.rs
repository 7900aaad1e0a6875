use clap::Args;
use std::error::Error;
use std::io;
use workout_timer_core::console::{ConsoleCountdown, ConsoleRenderer};
use workout_timer_core::protocol::parse_duration;

use super::run::{drive, runtime, tick_period};

#[derive(Args, Debug)]
pub struct CountdownArgs {
    /// Duration (90, 1:30, 2m)
    #[arg(default_value = "30")]
    pub seconds: String,
    /// Text shown before the remaining time
    #[arg(short, long)]
    pub label: Option<String>,
    /// Tick period in milliseconds
    #[arg(long, hide = true, default_value_t = 1000)]
    pub tick_ms: u64,
}

pub fn run(args: CountdownArgs) -> Result<(), Box<dyn Error>> {
    let seconds = parse_duration(&args.seconds)?;
    let countdown = ConsoleCountdown::new(seconds, args.label);
    let mut renderer = ConsoleRenderer::new(io::stdout());

    if seconds == 0 {
        renderer.complete()?;
        return Ok(());
    }

    runtime()?.block_on(drive(countdown.plan(), tick_period(args.tick_ms), |event| {
        renderer.render(event)?;
        Ok(())
    }))?;
    Ok(())
}
