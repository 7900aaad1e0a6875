use clap::Args;
use std::error::Error;
use workout_timer_core::console::summary_lines;
use workout_timer_core::protocol::format_seconds;
use workout_timer_core::storage::Settings;
use workout_timer_core::{SessionPlan, SessionSummary};

use super::protocol::ProtocolArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub protocol: ProtocolArgs,
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn Error>> {
    // Planning is read-only, so an unreadable settings file only costs the
    // stored defaults.
    let settings = Settings::load_or_default();
    let plan = args.protocol.resolve(&settings.defaults)?.plan()?;
    let summary = SessionSummary::from_plan(&plan);

    if args.json {
        let out = serde_json::json!({
            "protocol": plan.protocol,
            "rounds": plan.rounds,
            "total_seconds": plan.total_seconds(),
            "phases": plan.phases,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in render(&plan, &summary) {
            println!("{line}");
        }
    }
    Ok(())
}

fn render(plan: &SessionPlan, summary: &SessionSummary) -> Vec<String> {
    let mut lines: Vec<String> = plan
        .phases
        .iter()
        .enumerate()
        .map(|(idx, phase)| {
            format!(
                "{:>3}. {:<24} {:<8} {}",
                idx + 1,
                phase.label,
                phase.kind,
                format_seconds(phase.duration, true)
            )
        })
        .collect();
    lines.push(String::new());
    lines.extend(summary_lines(summary));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use workout_timer_core::{BoxingConfig, ProtocolConfig};

    #[test]
    fn renders_phase_table_and_summary() {
        let plan = ProtocolConfig::from(BoxingConfig::new(180, 60, 2).unwrap())
            .plan()
            .unwrap();
        let lines = render(&plan, &SessionSummary::from_plan(&plan));
        assert_eq!(lines[0], format!("  1. {:<24} {:<8} 03:00", "Round 1/2", "work"));
        assert_eq!(lines[1], format!("  2. {:<24} {:<8} 01:00", "Rest", "rest"));
        assert_eq!(lines[2], format!("  3. {:<24} {:<8} 03:00", "Round 2/2", "work"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Total work        06:00");
        assert_eq!(lines[7], "Session length    07:00");
    }
}
