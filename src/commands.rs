use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate};
use clap::Subcommand;

use crate::api::FeedClient;
use crate::calendar::{CalendarDay, EventIndex, LayoutOptions};
use crate::config::{DataDir, Settings};
use crate::feed::{self, EventCache, PayloadOrigin};
use crate::presentation::time_range;
use crate::status;
use crate::translate::Translator;

#[derive(Subcommand, Debug, Clone)]
pub enum CalendarCommands {
    /// Print the status summary and today's events
    #[command(name = "today")]
    Today,

    /// Print the laid-out events of one day
    #[command(name = "day")]
    Day {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },

    /// Fetch the feed, update the cache and report what was loaded
    #[command(name = "refresh")]
    Refresh,
}

/// What every one-shot command needs to reach the feed.
pub struct CommandContext {
    pub feed_url: String,
    pub timeout_secs: u64,
    pub data_dir: DataDir,
    pub display_offset: FixedOffset,
}

impl CommandContext {
    async fn load(&self, settings: &Settings) -> Result<(EventIndex, PayloadOrigin)> {
        let client = FeedClient::new(self.feed_url.clone(), self.timeout_secs)?;
        let cache = EventCache::in_dir(self.data_dir.root());
        let options = LayoutOptions::new(
            self.display_offset,
            Translator::for_setting(settings.translate_names),
        );

        let refreshed = feed::refresh(&client, &cache, &options)
            .await
            .context("Failed to load events")?;

        Ok((refreshed.index, refreshed.origin))
    }
}

pub async fn handle_calendar_command(cmd: CalendarCommands, ctx: &CommandContext) -> Result<()> {
    let settings = ctx.data_dir.load_settings();
    let (index, origin) = ctx.load(&settings).await?;

    match cmd {
        CalendarCommands::Today => {
            let today = CalendarDay::today(&ctx.display_offset).date();

            match status::summarize(&index, today, &settings, &ctx.display_offset) {
                Some(summary) => {
                    println!("{}", summary.text);
                    for line in summary.tooltip.chunks(2) {
                        println!("  {}", line.join("\n    "));
                    }
                }
                None => println!("(status entry hidden)"),
            }
        }

        CalendarCommands::Day { date } => {
            let events = index.lookup(CalendarDay::from_date(date));

            println!("{}  ({} events)", date.format("%A, %B %-d, %Y"), events.len());
            println!();

            if events.is_empty() {
                return Ok(());
            }

            println!(
                "{:<6} {:<5} {:<5} {:<8} {:<30} {}",
                "Lane", "Color", "First", "ID", "Name", "When"
            );
            println!("{}", "─".repeat(100));

            for ev in events {
                let mut flags = String::new();
                if ev.special {
                    flags.push_str(" [special]");
                }
                if ev.is_pvp {
                    flags.push_str(" [pvp]");
                }
                if settings.is_completed(ev.id) {
                    flags.push_str(" [done]");
                }

                println!(
                    "{:<6.1} {:<5} {:<5} {:<8} {:<30} {}{}",
                    ev.lane_offset,
                    ev.color_index,
                    if ev.is_first_day { "yes" } else { "" },
                    ev.id,
                    ev.name,
                    time_range(ev, &ctx.display_offset, true),
                    flags
                );
            }
        }

        CalendarCommands::Refresh => {
            let source = match origin {
                PayloadOrigin::Remote { cache_updated: true } => "feed (cache updated)",
                PayloadOrigin::Remote { cache_updated: false } => "feed (cache unchanged)",
                PayloadOrigin::Cache => "cache (feed unavailable)",
            };

            println!("✅ Events loaded from {}", source);
            println!("   Events:  {}", index.event_count());
            println!("   Days:    {}", index.day_count());
            if index.skipped() > 0 {
                println!("   Skipped: {} (invalid date range)", index.skipped());
            }
        }
    }

    Ok(())
}
