// List and calendar projections over a set of event records.
//
// Both views start from the same sorted records; nothing here is cached.

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::EventRecord;
use crate::game::{group_events, Game};
use crate::schedule::calendar::CalendarCursor;
use crate::schedule::format::{format_duration, format_time};
use crate::schedule::sort::sorted;
use crate::team::TeamRoster;

/// One displayed game, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRow {
    pub display_name: String,
    pub date: String,
    pub time: String,
    pub duration: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub score: Option<String>,
    pub tournament_id: Option<String>,
    /// Ids of the records behind this row, in member order.
    pub member_ids: Vec<String>,
}

impl GameRow {
    pub fn from_game(game: &Game, roster: &TeamRoster) -> Self {
        let first = game.first();
        GameRow {
            display_name: game.display_name(roster),
            date: first.date.clone(),
            time: format_time(&first.start_time),
            duration: format_duration(first.length_minutes),
            location: first.location.clone(),
            description: first.description.clone(),
            // Members of a game share the edited score; fall back to any member
            // that has one in case a partial edit left them out of step.
            score: game.members().iter().find_map(|m| m.score.clone()),
            tournament_id: first.tournament_id.clone(),
            member_ids: game.member_ids(),
        }
    }
}

/// Sort, group and format `events` into list rows.
pub fn list_view(events: &[EventRecord], roster: &TeamRoster) -> Vec<GameRow> {
    group_events(&sorted(events))
        .iter()
        .map(|g| GameRow::from_game(g, roster))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// False for padding days from a neighbouring month.
    pub in_focus: bool,
    pub games: Vec<GameRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub title: String,
    /// Rows of seven cells. A week grid has exactly one row.
    pub weeks: Vec<Vec<CalendarCell>>,
}

impl CalendarView {
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells().find(|c| c.date == date)
    }
}

/// Build the calendar grid the cursor points at.
///
/// Each cell filters the full record set down to its own day and groups only
/// within that subset. Records with an unparseable date land in no cell.
pub fn calendar_view(
    events: &[EventRecord],
    roster: &TeamRoster,
    cursor: &CalendarCursor,
) -> CalendarView {
    let ordered = sorted(events);
    let dated: Vec<(NaiveDate, &EventRecord)> = ordered
        .iter()
        .filter_map(|e| e.parsed_date().map(|d| (d, e)))
        .collect();

    let cells: Vec<CalendarCell> = cursor
        .days()
        .into_iter()
        .map(|day| {
            let on_day: Vec<EventRecord> = dated
                .iter()
                .filter(|(d, _)| *d == day)
                .map(|(_, e)| (*e).clone())
                .collect();
            CalendarCell {
                date: day,
                in_focus: cursor.in_focus(day),
                games: group_events(&on_day)
                    .iter()
                    .map(|g| GameRow::from_game(g, roster))
                    .collect(),
            }
        })
        .collect();

    CalendarView {
        title: cursor.title(),
        weeks: cells.chunks(7).map(<[CalendarCell]>::to_vec).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::calendar::{CalendarMode, WeekStart};
    use crate::team::Team;

    fn ev(id: &str, team: &str, date: &str, time: &str) -> EventRecord {
        EventRecord {
            id: id.into(),
            team_id: team.into(),
            tournament_id: Some("tour".into()),
            name: format!("Game {id}"),
            date: date.into(),
            start_time: time.into(),
            length_minutes: 90,
            location: Some("Main Field".into()),
            description: None,
            score: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn roster() -> TeamRoster {
        [("a", "Lions"), ("b", "Tigers")]
            .into_iter()
            .map(|(id, name)| Team {
                id: id.into(),
                name: name.into(),
                sport: None,
                age_group: None,
            })
            .collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn list_view_sorts_groups_and_formats() {
        let events = vec![
            ev("3", "a", "2024-05-02", "18:00"),
            ev("1", "a", "2024-05-01", "09:30"),
            ev("2", "b", "2024-05-01", "09:30"),
        ];
        let rows = list_view(&events, &roster());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display_name, "Lions vs Tigers");
        assert_eq!(rows[0].time, "9:30 AM");
        assert_eq!(rows[0].duration, "1h 30m");
        assert_eq!(rows[0].member_ids, vec!["1", "2"]);
        assert_eq!(rows[1].display_name, "Game 3");
        assert_eq!(rows[1].time, "6:00 PM");
    }

    #[test]
    fn row_score_comes_from_any_member() {
        let mut b = ev("2", "b", "2024-05-01", "09:30");
        b.score = Some("2-1".into());
        let rows = list_view(&[ev("1", "a", "2024-05-01", "09:30"), b], &roster());
        assert_eq!(rows[0].score.as_deref(), Some("2-1"));
    }

    #[test]
    fn calendar_cells_group_within_the_day() {
        let events = vec![
            ev("1", "a", "2024-05-01", "09:30"),
            ev("2", "b", "2024-05-01", "09:30"),
            ev("3", "a", "2024-05-01", "13:00"),
            ev("4", "a", "2024-05-20", "09:30"),
            ev("5", "a", "not-a-date", "09:30"),
        ];
        let cursor = CalendarCursor::new(CalendarMode::Month, d(2024, 5, 10), WeekStart::Sunday);
        let view = calendar_view(&events, &roster(), &cursor);

        assert_eq!(view.title, "May 2024");
        assert_eq!(view.weeks.len(), 5);
        assert!(view.weeks.iter().all(|w| w.len() == 7));

        let first = view.cell(d(2024, 5, 1)).unwrap();
        assert_eq!(first.games.len(), 2);
        assert_eq!(first.games[0].display_name, "Lions vs Tigers");
        assert_eq!(first.games[1].member_ids, vec!["3"]);

        assert_eq!(view.cell(d(2024, 5, 20)).unwrap().games.len(), 1);

        let total: usize = view.cells().map(|c| c.games.len()).sum();
        assert_eq!(total, 3, "malformed date must not appear in any cell");
    }

    #[test]
    fn week_view_has_single_row() {
        let events = vec![ev("1", "a", "2024-05-14", "09:30")];
        let cursor = CalendarCursor::new(CalendarMode::Week, d(2024, 5, 15), WeekStart::Sunday);
        let view = calendar_view(&events, &roster(), &cursor);
        assert_eq!(view.weeks.len(), 1);
        assert_eq!(view.weeks[0][0].date, d(2024, 5, 12));
        assert!(view.cells().all(|c| c.in_focus));
        assert_eq!(view.cell(d(2024, 5, 14)).unwrap().games.len(), 1);
    }

    #[test]
    fn navigation_recomputes_from_same_records() {
        let events = vec![
            ev("1", "a", "2024-05-14", "09:30"),
            ev("2", "a", "2024-05-21", "09:30"),
        ];
        let cursor = CalendarCursor::new(CalendarMode::Week, d(2024, 5, 15), WeekStart::Sunday);
        let this_week = calendar_view(&events, &roster(), &cursor);
        let next_week = calendar_view(&events, &roster(), &cursor.next());
        assert_eq!(this_week.cells().map(|c| c.games.len()).sum::<usize>(), 1);
        assert_eq!(
            next_week.cell(d(2024, 5, 21)).unwrap().games[0].member_ids,
            vec!["2"]
        );
    }
}
