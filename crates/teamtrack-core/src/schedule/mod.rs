// Schedule projection: ordering, formatting, calendar navigation and the
// list/calendar views built on top of them.

pub mod calendar;
pub mod format;
pub mod projection;
pub mod sort;

pub use calendar::{CalendarCursor, CalendarMode, WeekStart};
pub use format::{format_duration, format_time};
pub use projection::{calendar_view, list_view, CalendarCell, CalendarView, GameRow};
pub use sort::{sort_events, sorted};
