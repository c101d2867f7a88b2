// Chronological ordering of event records.

use chrono::NaiveDateTime;

use crate::event::EventRecord;

/// Sort events ascending by date + start time.
///
/// The sort is stable. Records whose date or time cannot be parsed stay at
/// their original index; the parseable records are ordered among the
/// remaining slots.
pub fn sort_events(events: &mut [EventRecord]) {
    let mut slots: Vec<usize> = Vec::with_capacity(events.len());
    let mut keyed: Vec<(NaiveDateTime, EventRecord)> = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        if let Some(at) = event.starts_at() {
            slots.push(i);
            keyed.push((at, event.clone()));
        }
    }

    // `sort_by_key` is stable.
    keyed.sort_by_key(|(at, _)| *at);

    for (slot, (_, event)) in slots.into_iter().zip(keyed) {
        events[slot] = event;
    }
}

/// Convenience: sorted copy of `events`.
pub fn sorted(events: &[EventRecord]) -> Vec<EventRecord> {
    let mut out = events.to_vec();
    sort_events(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: &str, date: &str, time: &str) -> EventRecord {
        EventRecord {
            id: id.into(),
            team_id: "t".into(),
            tournament_id: None,
            name: id.into(),
            date: date.into(),
            start_time: time.into(),
            length_minutes: 60,
            location: None,
            description: None,
            score: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(events: &[EventRecord]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn orders_by_date_then_time() {
        let out = sorted(&[
            ev("a", "2024-01-02", "10:00"),
            ev("b", "2024-01-01", "09:00"),
            ev("c", "2024-01-01", "08:00"),
        ]);
        assert_eq!(ids(&out), vec!["c", "b", "a"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let out = sorted(&[
            ev("x", "2024-03-01", "10:00"),
            ev("y", "2024-02-01", "10:00"),
            ev("z", "2024-03-01", "10:00:00"),
            ev("w", "2024-03-01", "10:00"),
        ]);
        assert_eq!(ids(&out), vec!["y", "x", "z", "w"]);
    }

    #[test]
    fn malformed_records_keep_their_position() {
        let out = sorted(&[
            ev("late", "2024-06-01", "10:00"),
            ev("bad", "someday", "10:00"),
            ev("early", "2024-01-01", "10:00"),
            ev("badtime", "2024-01-01", "noon"),
            ev("mid", "2024-03-01", "10:00"),
        ]);
        assert_eq!(ids(&out), vec!["early", "bad", "mid", "badtime", "late"]);
    }

    #[test]
    fn empty_and_single_are_noops() {
        assert!(sorted(&[]).is_empty());
        let one = sorted(&[ev("only", "nope", "nope")]);
        assert_eq!(ids(&one), vec!["only"]);
    }
}
