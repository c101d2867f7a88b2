// Game grouping: folds the per-team records of one real-world game into a
// single view-model.

use std::collections::HashMap;

use crate::event::{EventRecord, GroupKey};
use crate::team::TeamRoster;

/// A set of event records that share a [`GroupKey`]. Never persisted; rebuilt
/// from whatever records are loaded.
///
/// Only [`group_events`] builds these, so a game always has a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    key: GroupKey,
    /// Members in the order they were encountered.
    members: Vec<EventRecord>,
}

impl Game {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn members(&self) -> &[EventRecord] {
        &self.members
    }

    pub fn first(&self) -> &EventRecord {
        &self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.members.iter().any(|m| m.id == event_id)
    }

    /// Display name for the game.
    ///
    /// Exactly two members: `"{A} vs {B}"` using the roster, in member order.
    /// Otherwise the first member's own name.
    pub fn display_name(&self, roster: &TeamRoster) -> String {
        match self.members.as_slice() {
            [a, b] => format!(
                "{} vs {}",
                roster.name_of(&a.team_id),
                roster.name_of(&b.team_id)
            ),
            _ => self.first().name.clone(),
        }
    }
}

/// Partition `events` into games.
///
/// Groups come out in the order of their first member; members keep their
/// relative input order. Indexed by key, so results match the pairwise scan
/// without its quadratic cost.
pub fn group_events(events: &[EventRecord]) -> Vec<Game> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut games: Vec<Game> = Vec::new();

    for event in events {
        let key = event.group_key();
        match index.get(&key) {
            Some(&i) => games[i].members.push(event.clone()),
            None => {
                index.insert(key.clone(), games.len());
                games.push(Game {
                    key,
                    members: vec![event.clone()],
                });
            }
        }
    }

    games
}

/// Find the game that contains `event_id`.
pub fn find_game<'a>(games: &'a [Game], event_id: &str) -> Option<&'a Game> {
    games.iter().find(|g| g.contains(event_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{Team, UNKNOWN_TEAM};

    fn ev(id: &str, team: &str, date: &str, time: &str) -> EventRecord {
        EventRecord {
            id: id.into(),
            team_id: team.into(),
            tournament_id: Some("tour".into()),
            name: format!("Event {id}"),
            date: date.into(),
            start_time: time.into(),
            length_minutes: 60,
            location: Some("Field 1".into()),
            description: None,
            score: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn roster() -> TeamRoster {
        ["Lions", "Tigers", "Bears"]
            .iter()
            .enumerate()
            .map(|(i, name)| Team {
                id: format!("t{i}"),
                name: name.to_string(),
                sport: None,
                age_group: None,
            })
            .collect()
    }

    #[test]
    fn equal_keys_group_together() {
        let a = ev("1", "t0", "2024-01-01", "10:00");
        let b = ev("2", "t1", "2024-01-01", "10:00");
        let games = group_events(&[a, b]);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].member_ids(), vec!["1", "2"]);
    }

    #[test]
    fn any_differing_key_field_separates() {
        let base = ev("1", "t0", "2024-01-01", "10:00");
        let variants: Vec<Box<dyn Fn(&mut EventRecord)>> = vec![
            Box::new(|e| e.date = "2024-01-02".into()),
            Box::new(|e| e.start_time = "11:00".into()),
            Box::new(|e| e.location = Some("Field 9".into())),
            Box::new(|e| e.location = None),
            Box::new(|e| e.tournament_id = Some("other".into())),
            Box::new(|e| e.tournament_id = None),
            Box::new(|e| e.length_minutes = 45),
        ];
        for change in variants {
            let mut other = ev("2", "t1", "2024-01-01", "10:00");
            change(&mut other);
            let games = group_events(&[base.clone(), other]);
            assert_eq!(games.len(), 2);
        }
    }

    #[test]
    fn name_and_description_do_not_affect_grouping() {
        let a = ev("1", "t0", "2024-01-01", "10:00");
        let mut b = ev("2", "t1", "2024-01-01", "10:00");
        b.name = "Something else".into();
        b.description = Some("bring water".into());
        b.score = Some("1-0".into());
        assert_eq!(group_events(&[a, b]).len(), 1);
    }

    #[test]
    fn output_follows_first_member_order() {
        let events = vec![
            ev("1", "t0", "2024-01-01", "10:00"),
            ev("2", "t0", "2024-01-01", "12:00"),
            ev("3", "t1", "2024-01-01", "10:00"),
            ev("4", "t1", "2024-01-01", "12:00"),
            ev("5", "t2", "2024-01-01", "09:00"),
        ];
        let games = group_events(&events);
        let ids: Vec<Vec<String>> = games.iter().map(Game::member_ids).collect();
        assert_eq!(
            ids,
            vec![
                vec!["1".to_string(), "3".to_string()],
                vec!["2".to_string(), "4".to_string()],
                vec!["5".to_string()],
            ]
        );
    }

    #[test]
    fn two_member_game_uses_vs_name_in_member_order() {
        let games = group_events(&[
            ev("1", "t0", "2024-01-01", "10:00"),
            ev("2", "t1", "2024-01-01", "10:00"),
        ]);
        assert_eq!(games[0].display_name(&roster()), "Lions vs Tigers");

        let reversed = group_events(&[
            ev("2", "t1", "2024-01-01", "10:00"),
            ev("1", "t0", "2024-01-01", "10:00"),
        ]);
        assert_eq!(reversed[0].display_name(&roster()), "Tigers vs Lions");
    }

    #[test]
    fn single_and_large_groups_fall_back_to_first_name() {
        let single = group_events(&[ev("1", "t0", "2024-01-01", "10:00")]);
        assert_eq!(single[0].display_name(&roster()), "Event 1");

        let triple = group_events(&[
            ev("7", "t0", "2024-01-01", "10:00"),
            ev("8", "t1", "2024-01-01", "10:00"),
            ev("9", "t2", "2024-01-01", "10:00"),
        ]);
        assert_eq!(triple.len(), 1);
        assert_eq!(triple[0].display_name(&roster()), "Event 7");
    }

    #[test]
    fn unknown_team_is_rendered_not_fatal() {
        let games = group_events(&[
            ev("1", "t0", "2024-01-01", "10:00"),
            ev("2", "ghost", "2024-01-01", "10:00"),
        ]);
        assert_eq!(
            games[0].display_name(&roster()),
            format!("Lions vs {UNKNOWN_TEAM}")
        );
        assert_eq!(
            games[0].display_name(&TeamRoster::new()),
            "Unknown Team vs Unknown Team"
        );
    }

    #[test]
    fn find_game_by_member_id() {
        let games = group_events(&[
            ev("1", "t0", "2024-01-01", "10:00"),
            ev("2", "t1", "2024-01-01", "10:00"),
            ev("3", "t1", "2024-01-02", "10:00"),
        ]);
        assert_eq!(find_game(&games, "2").map(Game::len), Some(2));
        assert!(find_game(&games, "nope").is_none());
    }

    #[test]
    fn every_game_has_a_first_member() {
        let games = group_events(&[
            ev("1", "t0", "2024-01-01", "10:00"),
            ev("2", "t1", "2024-01-01", "10:00"),
            ev("3", "t2", "2024-01-03", "08:00"),
        ]);
        assert_eq!(games.len(), 2);
        for game in &games {
            assert!(!game.is_empty());
            assert_eq!(game.first(), &game.members()[0]);
            assert_eq!(game.key(), &game.first().group_key());
        }
        assert_eq!(games[1].first().id, "3");
    }

    #[test]
    fn empty_input_gives_no_games() {
        assert!(group_events(&[]).is_empty());
    }
}
