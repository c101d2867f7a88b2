// Calendar navigation: which days a month or week grid covers, and how the
// previous/next/today controls move it.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// The first day of the week containing `day`.
    pub fn start_of_week(self, day: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Sunday => day.weekday().num_days_from_sunday(),
            WeekStart::Monday => day.weekday().num_days_from_monday(),
        };
        day.checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(day)
    }
}

/// Month grids back the team schedule, week grids the tournament schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMode {
    Month,
    Week,
}

/// Where a calendar grid is pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub mode: CalendarMode,
    pub anchor: NaiveDate,
    pub week_start: WeekStart,
}

impl CalendarCursor {
    pub fn new(mode: CalendarMode, anchor: NaiveDate, week_start: WeekStart) -> Self {
        Self {
            mode,
            anchor,
            week_start,
        }
    }

    /// One month or one week earlier. Month steps clamp to the last day of a
    /// shorter month (Mar 31 -> Feb 29).
    pub fn previous(self) -> Self {
        let anchor = match self.mode {
            CalendarMode::Month => self.anchor.checked_sub_months(Months::new(1)),
            CalendarMode::Week => self.anchor.checked_sub_days(Days::new(7)),
        };
        Self {
            anchor: anchor.unwrap_or(self.anchor),
            ..self
        }
    }

    pub fn next(self) -> Self {
        let anchor = match self.mode {
            CalendarMode::Month => self.anchor.checked_add_months(Months::new(1)),
            CalendarMode::Week => self.anchor.checked_add_days(Days::new(7)),
        };
        Self {
            anchor: anchor.unwrap_or(self.anchor),
            ..self
        }
    }

    pub fn today(self, today: NaiveDate) -> Self {
        Self {
            anchor: today,
            ..self
        }
    }

    /// First and last day shown by the grid (inclusive). A month grid is
    /// padded out to whole weeks.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        match self.mode {
            CalendarMode::Month => {
                let first = self.anchor.with_day(1).unwrap_or(self.anchor);
                let last = last_day_of_month(first);
                let start = self.week_start.start_of_week(first);
                let end = self.week_start.start_of_week(last) + Days::new(6);
                (start, end)
            }
            CalendarMode::Week => {
                let start = self.week_start.start_of_week(self.anchor);
                (start, start + Days::new(6))
            }
        }
    }

    /// Every day in the grid, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let (start, end) = self.range();
        start.iter_days().take_while(|d| *d <= end).collect()
    }

    /// Whether `day` belongs to the period the cursor is focused on, as
    /// opposed to padding from a neighbouring month.
    pub fn in_focus(&self, day: NaiveDate) -> bool {
        match self.mode {
            CalendarMode::Month => {
                day.year() == self.anchor.year() && day.month() == self.anchor.month()
            }
            CalendarMode::Week => {
                let (start, end) = self.range();
                start <= day && day <= end
            }
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            CalendarMode::Month => self.anchor.format("%B %Y").to_string(),
            CalendarMode::Week => {
                let (start, _) = self.range();
                format!("Week of {}", start.format("%B %-d, %Y"))
            }
        }
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(first)
}
