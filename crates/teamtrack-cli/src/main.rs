// TeamTrack command-line entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (log file from config, else stderr)
// 4. Build the REST backend and a schedule controller
// 5. Run the subcommand, printing user-facing errors on failure

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use teamtrack_client::config::{self, Config};
use teamtrack_client::{
    Completion, GameEdit, RestBackend, ScheduleContext, ScheduleController, ScheduleView,
    ViewMode,
};
use teamtrack_core::schedule::GameRow;
use teamtrack_core::tournament::NewTournamentGame;
use teamtrack_core::GroupKey;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "teamtrack", about = "View and manage team and tournament schedules")]
struct Cli {
    /// Directory holding `config/` (defaults to the current directory or the
    /// platform config directory).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a team's schedule.
    Schedule {
        #[arg(long)]
        team: String,
        #[arg(long, value_enum, default_value_t = View::List)]
        view: View,
        /// Day the calendar opens on (YYYY-MM-DD, defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a tournament's schedule.
    Tournament {
        #[arg(long)]
        id: String,
        #[arg(long, value_enum, default_value_t = View::List)]
        view: View,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create a tournament game (one record per team).
    CreateGame {
        #[arg(long)]
        tournament: String,
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
        /// Length in minutes.
        #[arg(long)]
        length: u32,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        score: Option<String>,
    },
    /// Edit the game containing an event. Empty strings clear optional fields.
    EditGame {
        #[arg(long)]
        team: String,
        #[arg(long)]
        event: String,
        #[command(flatten)]
        fields: EditFields,
    },
    /// Delete the game containing an event.
    DeleteGame {
        #[arg(long)]
        team: String,
        #[arg(long)]
        event: String,
        /// Confirm the delete.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    List,
    #[value(alias = "month", alias = "week")]
    Calendar,
}

impl From<View> for ViewMode {
    fn from(view: View) -> Self {
        match view {
            View::List => ViewMode::List,
            View::Calendar => ViewMode::Calendar,
        }
    }
}

#[derive(clap::Args)]
struct EditFields {
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    length: Option<u32>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    score: Option<String>,
}

impl From<EditFields> for GameEdit {
    fn from(f: EditFields) -> Self {
        GameEdit {
            date: f.date,
            start_time: f.time,
            length_minutes: f.length,
            location: f.location,
            description: f.description,
            score: f.score,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_dir = cli.config_dir.clone().unwrap_or_else(config::default_base_dir);
    let config = config::load_config(&base_dir).context("failed to load configuration")?;

    init_tracing(&config)?;
    debug!(base_dir = %base_dir.display(), base_url = %config.backend.base_url, "config loaded");

    run(cli.command, &config).await
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    let backend =
        Arc::new(RestBackend::from_config(config).context("failed to build backend client")?);
    let today = chrono::Local::now().date_naive();
    let controller = |context: ScheduleContext, date: Option<NaiveDate>| {
        ScheduleController::new(
            backend.clone(),
            backend.clone(),
            context,
            date.unwrap_or(today),
            config.calendar.week_start,
        )
    };

    match command {
        Command::Schedule { team, view, date } => {
            let mut ctl = controller(ScheduleContext::Team { team_id: team }, date);
            show(&mut ctl, view).await
        }
        Command::Tournament { id, view, date } => {
            let mut ctl = controller(ScheduleContext::Tournament { tournament_id: id }, date);
            show(&mut ctl, view).await
        }
        Command::CreateGame {
            tournament,
            home,
            away,
            date,
            time,
            length,
            location,
            description,
            score,
        } => {
            let mut ctl = controller(
                ScheduleContext::Tournament {
                    tournament_id: tournament.clone(),
                },
                None,
            );
            load(&mut ctl).await?;
            let form = NewTournamentGame {
                tournament_id: tournament,
                home_team_id: Some(home),
                away_team_id: Some(away),
                date,
                start_time: time,
                length_minutes: length,
                location,
                description,
                score,
            };
            let created = ctl.create_game(form).await.map_err(|msg| anyhow!(msg))?;
            info!(ids = ?created.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), "game created");
            println!("Created {} and {}", created[0].id, created[1].id);
            if let Some(row) = ctl.list().iter().find(|r| r.member_ids.contains(&created[0].id)) {
                println!("{}", format_row(row));
            }
            Ok(())
        }
        Command::EditGame {
            team,
            event,
            fields,
        } => {
            let mut ctl = controller(ScheduleContext::Team { team_id: team }, None);
            let key = open_game(&mut ctl, &event).await?;
            ctl.begin_edit(&key)?;
            let completion = ctl.save_edit(&key, fields.into()).await?;
            finish(completion)?;
            if let Some(game) = ctl.game_for_event(&event) {
                println!("Updated {} record(s)", game.len());
                println!("{}", format_row(&GameRow::from_game(&game, ctl.roster())));
            }
            Ok(())
        }
        Command::DeleteGame { team, event, yes } => {
            let mut ctl = controller(ScheduleContext::Team { team_id: team }, None);
            let key = open_game(&mut ctl, &event).await?;
            ctl.request_delete(&key)?;
            if !yes {
                ctl.cancel_delete(&key)?;
                bail!("Not deleted. Re-run with --yes to delete this game.");
            }
            let members = ctl.game_for_event(&event).map(|g| g.len()).unwrap_or(0);
            finish(ctl.delete_confirmed(&key).await?)?;
            println!("Deleted game ({members} record(s))");
            Ok(())
        }
    }
}

async fn load(ctl: &mut ScheduleController) -> anyhow::Result<()> {
    ctl.load().await.map_err(|e| anyhow!(e.user_message()))
}

async fn show(ctl: &mut ScheduleController, view: View) -> anyhow::Result<()> {
    load(ctl).await?;
    ctl.set_mode(view.into());
    print_view(&ctl.view());
    Ok(())
}

/// Find the game containing `event_id`, widening to the tournament schedule
/// when the event belongs to one so every team's record is included.
async fn open_game(ctl: &mut ScheduleController, event_id: &str) -> anyhow::Result<GroupKey> {
    load(ctl).await?;
    let tournament = ctl
        .snapshot()
        .events
        .iter()
        .find(|e| e.id == event_id)
        .map(|e| e.tournament_id.clone())
        .ok_or_else(|| anyhow!("Event {event_id} is not on this team's schedule."))?;

    if let Some(tournament_id) = tournament {
        ctl.switch_context(ScheduleContext::Tournament { tournament_id });
        load(ctl).await?;
    }

    let game = ctl
        .game_for_event(event_id)
        .ok_or_else(|| anyhow!("Event {event_id} is no longer on the schedule."))?;
    Ok(game.key().clone())
}

fn finish(completion: Completion) -> anyhow::Result<()> {
    match completion {
        Completion::Applied => Ok(()),
        Completion::Failed(message) => Err(anyhow!(message)),
        Completion::Discarded => bail!("The schedule changed before the request finished."),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_view(view: &ScheduleView) {
    match view {
        ScheduleView::List(rows) => {
            if rows.is_empty() {
                println!("No games scheduled.");
            }
            for row in rows {
                println!("{}", format_row(row));
            }
        }
        ScheduleView::Calendar(calendar) => {
            println!("{}", calendar.title);
            let busy = calendar
                .cells()
                .filter(|c| c.in_focus && !c.games.is_empty());
            for cell in busy {
                println!("{}", cell.date.format("%a %b %-d"));
                for row in &cell.games {
                    println!("  {}", format_row(row));
                }
            }
        }
    }
}

fn format_row(row: &GameRow) -> String {
    let date = row.date.split('T').next().unwrap_or(&row.date);
    let mut line = format!(
        "{:<10} {:>8} {:>7}  {}",
        date, row.time, row.duration, row.display_name
    );
    if let Some(location) = &row.location {
        line.push_str(&format!(" @ {location}"));
    }
    if let Some(score) = &row.score {
        line.push_str(&format!(" [{score}]"));
    }
    line
}

/// Initialize tracing to the configured log file, or stderr when none is set.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teamtrack=info,warn")),
        )
        .with_target(true)
        .with_line_number(true);

    match &config.logging.file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            let subscriber = builder
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> GameRow {
        GameRow {
            display_name: "Lions vs Tigers".into(),
            date: "2024-05-18T00:00:00.000Z".into(),
            time: "9:00 AM".into(),
            duration: "1h".into(),
            location: Some("Field 1".into()),
            description: None,
            score: Some("2-1".into()),
            tournament_id: Some("cup".into()),
            member_ids: vec!["e1".into(), "e2".into()],
        }
    }

    #[test]
    fn row_line_includes_location_and_score() {
        assert_eq!(
            format_row(&row()),
            "2024-05-18  9:00 AM      1h  Lions vs Tigers @ Field 1 [2-1]"
        );
    }

    #[test]
    fn calendar_view_accepts_grid_aliases() {
        let cli = Cli::try_parse_from(["teamtrack", "schedule", "--team", "a", "--view", "month"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Schedule {
                view: View::Calendar,
                ..
            }
        ));
        let cli =
            Cli::try_parse_from(["teamtrack", "tournament", "--id", "cup", "--view", "week"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Tournament {
                view: View::Calendar,
                ..
            }
        ));
    }

    #[test]
    fn edit_fields_map_onto_game_edit() {
        let cli = Cli::try_parse_from([
            "teamtrack", "edit-game", "--team", "a", "--event", "e1", "--time", "10:15", "--score",
            "",
        ])
        .unwrap();
        let Command::EditGame { fields, .. } = cli.command else {
            panic!("expected edit-game");
        };
        let edit = GameEdit::from(fields);
        assert_eq!(edit.start_time.as_deref(), Some("10:15"));
        assert_eq!(edit.score.as_deref(), Some(""));
        assert!(edit.date.is_none());
    }

    #[test]
    fn delete_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["teamtrack", "delete-game", "--team", "a", "--event", "e1"])
            .unwrap();
        assert!(matches!(cli.command, Command::DeleteGame { yes: false, .. }));
    }
}
