use clap::Subcommand;
use tock_core::timer::format_minutes;

use super::Context;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Lifetime totals
    Show {
        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Zero all counters
    Reset,
}

pub fn run(action: StatsAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ctx.open_store()?;

    match action {
        StatsAction::Show { json } => {
            let stats = store.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Sessions:   {}", stats.sessions_completed);
                println!("Focus time: {}", format_minutes(stats.total_focus_minutes));
                println!("Tasks done: {}", stats.tasks_done);
            }
        }
        StatsAction::Reset => {
            store.reset_stats()?;
            println!("stats reset");
        }
    }
    Ok(())
}
