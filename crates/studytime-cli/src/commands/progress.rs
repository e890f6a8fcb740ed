use chrono::Local;
use clap::Subcommand;
use studytime_core::storage::Database;
use studytime_core::Config;

use super::print_json;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Show completed cards, percentage and today's minutes
    Show,
    /// Mark a card as completed
    Complete {
        /// Card ID
        card_id: u64,
    },
    /// Remember the card currently being studied
    Card {
        /// Zero-based card index
        index: u64,
    },
    /// Clear the study record and all progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        ProgressAction::Show => {
            let summary = db.progress_summary(
                config.progress.total_cards,
                Local::now().date_naive(),
                config.progress.daily_limit_minutes,
            )?;
            print_json(&summary)?;
        }
        ProgressAction::Complete { card_id } => {
            if db.mark_card_completed(card_id)? {
                println!("card {card_id} completed");
            } else {
                println!("card {card_id} was already completed");
            }
        }
        ProgressAction::Card { index } => {
            db.set_current_card_index(index)?;
            println!("current card: {index}");
        }
        ProgressAction::Reset { yes } => {
            if !yes {
                return Err("refusing to reset progress without --yes".into());
            }
            db.reset_all_progress()?;
            println!("progress reset");
        }
    }
    Ok(())
}
