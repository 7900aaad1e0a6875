use chrono::Utc;
use clap::Args;
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use workout_timer_core::console::{summary_lines, ConsoleRenderer};
use workout_timer_core::sound::SoundPlayer;
use workout_timer_core::storage::{History, HistoryRecord, Settings};
use workout_timer_core::{Event, SessionPlan, SessionRunner, SessionState, SessionSummary};

use super::protocol::ProtocolArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(subcommand)]
    pub protocol: ProtocolArgs,
    /// Do not play phase sounds
    #[arg(long, global = true)]
    pub no_sound: bool,
    /// Append the finished session to the history
    #[arg(long, global = true)]
    pub save: bool,
    /// Print events as JSON lines instead of a countdown
    #[arg(long, global = true)]
    pub json: bool,
    /// Tick period in milliseconds
    #[arg(long, global = true, hide = true, default_value_t = 1000)]
    pub tick_ms: u64,
}

/// How a driven session ended.
#[derive(Debug)]
pub enum Outcome {
    Finished(SessionSummary),
    Stopped,
}

/// Where runner events are written.
pub enum EventSink<W: Write> {
    Console(ConsoleRenderer<W>),
    Json(W),
}

impl<W: Write> EventSink<W> {
    pub fn new(out: W, json: bool) -> Self {
        if json {
            EventSink::Json(out)
        } else {
            EventSink::Console(ConsoleRenderer::new(out))
        }
    }

    pub fn emit(&mut self, event: &Event) -> Result<(), Box<dyn Error>> {
        match self {
            EventSink::Console(renderer) => renderer.render(event)?,
            EventSink::Json(out) => {
                writeln!(out, "{}", serde_json::to_string(event)?)?;
                out.flush()?;
            }
        }
        Ok(())
    }
}

/// Run `plan` to the end, one runner tick per `period`.
///
/// Ctrl-C stops the session instead of killing the process so the last line
/// is terminated cleanly.
pub async fn drive<F>(
    plan: SessionPlan,
    period: Duration,
    mut on_event: F,
) -> Result<Outcome, Box<dyn Error>>
where
    F: FnMut(&Event) -> Result<(), Box<dyn Error>>,
{
    let mut runner = SessionRunner::new();
    on_event(&runner.start(plan)?)?;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while let Some(token) = runner.arm() {
        tokio::select! {
            _ = ticker.tick() => {
                for event in runner.fire(token)? {
                    on_event(&event)?;
                }
            }
            signal = &mut ctrl_c => {
                signal?;
                tracing::info!("interrupted");
                on_event(&runner.stop()?)?;
            }
        }
    }

    match (runner.state(), runner.summary()) {
        (SessionState::Finished, Some(summary)) => Ok(Outcome::Finished(summary.clone())),
        _ => Ok(Outcome::Stopped),
    }
}

pub fn tick_period(tick_ms: u64) -> Duration {
    Duration::from_millis(tick_ms.max(1))
}

pub fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load()?;
    let config = args.protocol.resolve(&settings.defaults)?;
    let plan = config.plan()?;
    tracing::info!(
        protocol = config.name(),
        phases = plan.phases.len(),
        total = plan.total_seconds(),
        "starting session"
    );

    let mut player = if args.no_sound {
        None
    } else {
        Some(SoundPlayer::detect(
            settings.sound.clone(),
            settings.sounds_dir()?,
        ))
    };
    let mut sink = EventSink::new(io::stdout(), args.json);

    let outcome = runtime()?.block_on(drive(plan, tick_period(args.tick_ms), |event| {
        if let (Some(player), Some(kind)) = (player.as_mut(), event.sound_cue()) {
            player.play(kind);
        }
        sink.emit(event)
    }))?;

    let Outcome::Finished(summary) = outcome else {
        return Ok(());
    };

    if !args.json {
        println!();
        for line in summary_lines(&summary) {
            println!("{line}");
        }
    }

    if args.save {
        let history = History::open()?;
        history.append(HistoryRecord::from_summary(&summary, Utc::now()))?;
        if !args.json {
            println!("Saved to {}", history.path().display());
        }
    }
    Ok(())
}
