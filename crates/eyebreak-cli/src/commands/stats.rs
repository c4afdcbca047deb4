use clap::Subcommand;
use eyebreak_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Rest cycles completed today
    Today,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let stats = db.daily_stats()?;
            println!(
                "{}",
                serde_json::json!({ "today_completed": stats.count })
            );
        }
    }

    Ok(())
}
