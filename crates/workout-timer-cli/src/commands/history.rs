use clap::Subcommand;
use workout_timer_core::protocol::format_seconds;
use workout_timer_core::storage::{History, HistoryRecord};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List completed sessions, oldest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all recorded sessions
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let history = History::open()?;
    match action {
        HistoryAction::List { json } => {
            let records = history.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No sessions recorded");
            } else {
                for record in &records {
                    println!("{}", row(record));
                }
            }
        }
        HistoryAction::Clear => {
            let removed = history.clear()?;
            println!("Cleared {removed} session(s)");
        }
    }
    Ok(())
}

fn row(record: &HistoryRecord) -> String {
    format!(
        "{}  {:<7} {:>8}  work {}  rounds {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.mode,
        format_seconds(record.total_seconds, true),
        format_seconds(record.work_seconds, true),
        record.rounds_completed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn row_format() {
        let record = HistoryRecord {
            mode: "tabata".into(),
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 7, 5, 0).unwrap(),
            work_seconds: 160,
            prep_seconds: 10,
            rest_seconds: 70,
            cooldown_seconds: 0,
            rounds_completed: 8,
            total_seconds: 240,
        };
        assert_eq!(
            row(&record),
            "2024-03-01 07:05  tabata     04:00  work 02:40  rounds 8"
        );
    }
}
