//! Task management commands for CLI.

use std::io::{BufRead, Write};

use clap::Subcommand;
use tock_core::timer::format_clock;
use tock_core::{Task, TaskFilter};

use super::Context;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the front of the queue
    Add {
        /// Task name
        name: String,
        /// Focus length in minutes (default: 25)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// List tasks as JSON
    List {
        /// Which tasks to show: all, active or done
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
    },
    /// Show the active task
    Active,
    /// Make a task the active one
    Select {
        /// Task ID
        id: String,
    },
    /// Reopen a task and make it active
    Repeat {
        /// Task ID
        id: String,
    },
    /// Mark the active task done without running a session
    Complete,
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Remove all done tasks
    ClearDone,
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_task(task: &Task) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(task)?);
    Ok(())
}

pub fn run(action: TaskAction, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut coord = ctx.coordinator()?;

    match action {
        TaskAction::Add { name, minutes } => {
            let task = coord
                .add_task(&name, minutes)?
                .ok_or("task name must not be empty")?;
            println!("Task created: {}", task.id);
            print_task(&task)?;
        }
        TaskAction::List { filter } => {
            let tasks = coord.store().tasks(filter);
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Active => match coord.store().active_task() {
            Some(task) => print_task(&task)?,
            None => println!("No active task"),
        },
        TaskAction::Select { id } => {
            let task = coord
                .select_task(&id)?
                .ok_or_else(|| format!("Task not found or already done: {id}"))?;
            println!(
                "Active task: {} ({})",
                task.name,
                format_clock(coord.engine().focus_duration_secs())
            );
        }
        TaskAction::Repeat { id } => {
            let task = coord
                .repeat_task(&id)?
                .ok_or_else(|| format!("Task not found: {id}"))?;
            println!("Task repeated! (Total: {})", task.repeat_count);
            print_task(&task)?;
        }
        TaskAction::Complete => match coord.complete_active()? {
            Some(task) => println!("Task done: {}", task.name),
            None => println!("No active task"),
        },
        TaskAction::Delete { id, yes } => {
            let task = coord
                .store()
                .get(&id)
                .ok_or_else(|| format!("Task not found: {id}"))?;
            if !yes && !confirm(&format!("Delete task \"{}\"?", task.name))? {
                println!("Cancelled");
                return Ok(());
            }
            coord.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::ClearDone => {
            let removed = coord.clear_done()?;
            println!("Removed {removed} done task(s)");
        }
    }
    Ok(())
}
