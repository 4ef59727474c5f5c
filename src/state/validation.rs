//! Sequential peer validation of submitted answers.
//!
//! When a round closes every non-blank answer becomes a [`ValidationEntry`].
//! Entries are judged one at a time: the entry under the cursor is live, all
//! others wait. An entry is accepted once every other active player approved
//! it, and rejected by a single veto.

use super::RoomState;
use crate::types::*;

impl RoomState {
    /// Turn the active players' answers into the validation queue.
    ///
    /// Players are visited by ascending ID and categories in configured
    /// order, so the queue is the same for the same answers.
    pub(crate) fn build_validation_queue(&mut self) {
        self.validation.clear();

        let active_ids = self.sorted_active_ids();
        let required = active_ids.len().saturating_sub(1);

        for player in self.players.values_mut().filter(|p| !p.is_active) {
            player.score = 0;
        }

        for player_id in &active_ids {
            let Some(player) = self.players.get(player_id) else {
                continue;
            };
            for category in &self.config.categories {
                let answer = player.answers.get(category).map(|a| a.trim()).unwrap_or("");
                if answer.is_empty() {
                    continue;
                }
                self.validation.entries.push(ValidationEntry {
                    id: self.next_entry_id,
                    author_id: player.id.clone(),
                    author_name: player.display_name.clone(),
                    category: category.clone(),
                    answer: answer.to_string(),
                    required_approvals: required,
                    approvals: Default::default(),
                    completed: false,
                    accepted: false,
                });
                self.next_entry_id += 1;
            }
        }
    }

    /// Move the cursor past every entry that can be decided without votes.
    ///
    /// Stops at the first entry that still needs approvals. An exhausted
    /// queue ends the validation phase.
    pub(crate) fn settle_validation(&mut self) {
        if self.phase != Phase::ValidationPending {
            return;
        }
        while let Some(entry) = self.validation.live() {
            if entry.completed {
                self.validation.cursor += 1;
                continue;
            }
            if !self.players.contains_key(&entry.author_id) {
                // The author is gone, nobody can be awarded for it
                self.complete_live(false);
                continue;
            }
            if entry.is_settled_by_approvals() {
                self.complete_live(true);
                continue;
            }
            return;
        }
        tracing::info!(room = %self.code, "Validation finished for round {}", self.rounds_played);
        self.enter_waiting();
    }

    /// Close the live entry and step past it
    fn complete_live(&mut self, accepted: bool) {
        let Some(entry) = self.validation.live_mut() else {
            return;
        };
        entry.completed = true;
        entry.accepted = accepted;

        if accepted {
            if let Some(author) = self.players.get_mut(&entry.author_id) {
                author.score += 1;
                author.total_score += 1;
            }
        }
        tracing::info!(
            room = %self.code,
            entry = entry.id,
            "{} / {}: {:?} {}",
            entry.author_name,
            entry.category,
            entry.answer,
            if accepted { "accepted" } else { "rejected" }
        );
        self.validation.cursor += 1;
    }

    /// Record a vote on the live entry.
    ///
    /// Votes on any other entry, self-votes, votes by inactive players and
    /// repeated approvals are ignored and return `false`.
    pub fn cast_vote(&mut self, voter_id: &str, entry_id: EntryId, approve: bool) -> bool {
        if self.phase != Phase::ValidationPending {
            return false;
        }
        let voter_active = self.players.get(voter_id).is_some_and(|p| p.is_active);
        let Some(entry) = self.validation.live_mut() else {
            return false;
        };
        if entry.id != entry_id || entry.completed {
            tracing::debug!(room = %self.code, voter = %voter_id, "Stale vote for entry {}", entry_id);
            return false;
        }
        if entry.author_id == voter_id || !voter_active || entry.approvals.contains(voter_id) {
            tracing::debug!(room = %self.code, voter = %voter_id, "Ineligible vote for entry {}", entry_id);
            return false;
        }

        if approve {
            entry.approvals.insert(voter_id.to_string());
            if entry.is_settled_by_approvals() {
                self.complete_live(true);
            }
        } else {
            self.complete_live(false);
        }
        self.settle_validation();
        true
    }

    /// Shrink the jury after an active player left mid-validation.
    ///
    /// The departed player no longer counts towards any open entry. If they
    /// wrote the live entry it is rejected when the queue settles.
    pub(crate) fn handle_validation_departure(&mut self, departed: &Player) {
        if self.phase != Phase::ValidationPending || !departed.is_active {
            return;
        }
        let cursor = self.validation.cursor;
        for entry in self.validation.entries.iter_mut().skip(cursor) {
            if entry.completed || entry.author_id == departed.id {
                continue;
            }
            entry.approvals.remove(&departed.id);
            entry.required_approvals = entry.required_approvals.saturating_sub(1);
        }
        self.settle_validation();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::RoomState;
    use crate::types::*;

    /// Room in validation with all `n` players having answered both categories
    fn validating_room(n: usize) -> (RoomState, Vec<PlayerId>) {
        let (mut room, ids) = room_with_players(two_categories(), n);
        room.start_round(false);
        for (i, id) in ids.iter().enumerate() {
            room.players.get_mut(id).unwrap().answers =
                full_answers(&format!("Bear{}", i), &format!("Bonn{}", i));
        }
        assert!(room.end_round());
        (room, ids)
    }

    fn live_id(room: &RoomState) -> EntryId {
        room.validation.live().expect("live entry").id
    }

    fn points_awarded(room: &RoomState) -> u32 {
        room.players.values().map(|p| p.score).sum()
    }

    #[test]
    fn test_complete_sheet_ends_round_before_timer() {
        let (mut room, ids) = room_with_players(two_categories(), 3);
        room.start_round(false);
        room.submit_answers(&ids[1], &full_answers("Boar", ""));
        room.submit_answers(&ids[2], &full_answers("", "Bonn"));
        assert_eq!(room.phase, Phase::RoundActive);

        // First complete sheet closes the round with time left on the clock
        room.submit_answers(&ids[0], &full_answers("Bear", "Berlin"));
        assert_eq!(room.phase, Phase::ValidationPending);
        assert_eq!(room.remaining_seconds, 0);

        let entries = &room.validation.entries;
        assert!(entries.len() <= 6);
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.required_approvals == 2));
    }

    #[test]
    fn test_full_queue_for_three_complete_sheets() {
        let (room, _) = validating_room(3);
        assert_eq!(room.validation.entries.len(), 6);
        assert!(room.validation.entries.iter().all(|e| e.required_approvals == 2));
    }

    #[test]
    fn test_queue_ordered_by_player_then_category() {
        let (mut room, ids) = room_with_players(two_categories(), 3);
        room.start_round(false);
        room.submit_answers(&ids[2], &full_answers("Cat", ""));
        room.submit_answers(&ids[1], &full_answers("", "Bonn"));
        room.submit_answers(&ids[0], &full_answers("Bear", "Berlin"));

        let order: Vec<(&str, &str)> = room
            .validation
            .entries
            .iter()
            .map(|e| (e.author_id.as_str(), e.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ids[0].as_str(), "Animal"),
                (ids[0].as_str(), "City"),
                (ids[1].as_str(), "City"),
                (ids[2].as_str(), "Animal"),
            ]
        );
        assert_eq!(room.validation.entries.len(), 4);
        assert_eq!(room.validation.cursor, 0);
    }

    #[test]
    fn test_solo_player_answers_auto_accepted() {
        let (mut room, ids) = room_with_players(two_categories(), 3);
        room.players.get_mut(&ids[1]).unwrap().is_ready = true;
        room.start_round(true);
        assert!(room.players[&ids[1]].is_active);

        room.submit_answers(&ids[1], &full_answers("Bear", ""));
        room.end_round();

        assert_eq!(room.players[&ids[1]].score, 1);
        assert_eq!(room.players[&ids[1]].total_score, 1);
        assert_eq!(room.phase, Phase::WaitingRestart);
    }

    #[test]
    fn test_unanimous_approval_accepts() {
        let (mut room, ids) = validating_room(3);
        let entry = live_id(&room);
        assert_eq!(room.validation.live().unwrap().author_id, ids[0]);

        assert!(room.cast_vote(&ids[1], entry, true));
        assert_eq!(room.validation.cursor, 0);
        assert!(room.cast_vote(&ids[2], entry, true));

        assert_eq!(room.validation.cursor, 1);
        assert!(room.validation.entries[0].accepted);
        assert_eq!(room.players[&ids[0]].score, 1);
    }

    #[test]
    fn test_single_veto_rejects() {
        let (mut room, ids) = validating_room(3);
        let entry = live_id(&room);

        room.cast_vote(&ids[1], entry, true);
        assert!(room.cast_vote(&ids[2], entry, false));

        let first = &room.validation.entries[0];
        assert!(first.completed);
        assert!(!first.accepted);
        assert_eq!(room.players[&ids[0]].score, 0);
        assert_eq!(room.validation.cursor, 1);
    }

    #[test]
    fn test_invalid_votes_are_ignored() {
        let (mut room, ids) = validating_room(3);
        let entry = live_id(&room);
        let queued = room.validation.entries[1].id;

        // own answer
        assert!(!room.cast_vote(&ids[0], entry, true));
        // not the live entry
        assert!(!room.cast_vote(&ids[1], queued, false));
        // unknown voter
        assert!(!room.cast_vote("ghost", entry, false));
        // double approval
        assert!(room.cast_vote(&ids[1], entry, true));
        assert!(!room.cast_vote(&ids[1], entry, true));
        assert!(!room.cast_vote(&ids[1], entry, false));

        let live = room.validation.live().unwrap();
        assert_eq!(live.id, entry);
        assert_eq!(live.approvals.len(), 1);
        assert!(!live.completed);
    }

    #[test]
    fn test_inactive_player_cannot_vote() {
        let (mut room, ids) = validating_room(2);
        let late = room.add_player(Some("Late".to_string()));
        let entry = live_id(&room);

        assert!(!room.cast_vote(&late.id, entry, false));
        assert!(room.cast_vote(&ids[1], entry, true));
    }

    #[test]
    fn test_completed_entry_is_frozen() {
        let (mut room, ids) = validating_room(2);
        let first = live_id(&room);
        room.cast_vote(&ids[1], first, true);
        assert!(room.validation.entries[0].accepted);

        // Late votes and departures leave it untouched
        assert!(!room.cast_vote(&ids[1], first, false));
        room.remove_player(&ids[1]);
        let entry = &room.validation.entries[0];
        assert!(entry.completed && entry.accepted);
        assert_eq!(entry.approvals.len(), 1);
    }

    #[test]
    fn test_author_leaving_rejects_live_entry() {
        let (mut room, ids) = validating_room(3);
        let entry = live_id(&room);
        room.cast_vote(&ids[1], entry, true);

        room.remove_player(&ids[0]);

        let first = &room.validation.entries[0];
        assert!(first.completed && !first.accepted);
        // Their second answer is rejected as well once it comes up
        assert!(room.validation.entries[1].completed);
        assert!(room.validation.cursor >= 2);
        assert_eq!(room.validation.live().unwrap().author_id, ids[1]);
    }

    #[test]
    fn test_pending_voter_leaving_shrinks_quorum() {
        let (mut room, ids) = validating_room(3);
        let entry = live_id(&room);
        room.cast_vote(&ids[1], entry, true);
        assert_eq!(room.validation.live().unwrap().required_approvals, 2);

        room.remove_player(&ids[2]);

        let first = &room.validation.entries[0];
        assert_eq!(first.required_approvals, 1);
        assert!(first.completed && first.accepted);
        assert_eq!(room.players[&ids[0]].score, 1);
        // Queued entries need one approval fewer too
        assert_eq!(room.validation.live().unwrap().required_approvals, 1);
    }

    #[test]
    fn test_approving_voter_leaves_removes_their_approval() {
        let (mut room, ids) = validating_room(4);
        let entry = live_id(&room);
        room.cast_vote(&ids[1], entry, true);

        room.remove_player(&ids[1]);

        let live = room.validation.live().unwrap();
        assert_eq!(live.id, entry);
        assert!(live.approvals.is_empty());
        assert_eq!(live.required_approvals, 2);
        assert!(!live.completed);
    }

    #[test]
    fn test_last_voter_leaving_auto_accepts_remaining() {
        let (mut room, ids) = validating_room(2);
        room.remove_player(&ids[1]);

        // P1 alone: their entries accepted, P2's rejected, queue drained
        assert_eq!(room.phase, Phase::WaitingRestart);
        assert_eq!(room.players[&ids[0]].score, 2);
    }

    #[test]
    fn test_inactive_departure_does_not_touch_queue() {
        let (mut room, _) = validating_room(3);
        let late = room.add_player(None);
        let before: Vec<usize> = room.validation.entries.iter().map(|e| e.required_approvals).collect();

        room.remove_player(&late.id);

        let after: Vec<usize> = room.validation.entries.iter().map(|e| e.required_approvals).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_points_equal_accepted_entries() {
        let (mut room, ids) = validating_room(3);
        let mut cursor_seen = 0;
        let mut turn = 0;
        while room.phase == Phase::ValidationPending {
            assert!(room.validation.cursor >= cursor_seen);
            cursor_seen = room.validation.cursor;
            let live = room.validation.live().unwrap().clone();
            let approve = turn % 3 != 0;
            for voter in ids.iter().filter(|id| **id != live.author_id) {
                room.cast_vote(voter, live.id, approve);
            }
            turn += 1;
        }

        assert_eq!(room.phase, Phase::WaitingRestart);
        assert_eq!(turn, 6);
        // 6 entries, every third vetoed
        assert_eq!(points_awarded(&room), 4);
    }

    #[test]
    fn test_entry_ids_unique_across_rounds() {
        let (mut room, ids) = room_with_players(two_categories(), 1);
        room.start_round(false);
        room.submit_answers(&ids[0], &full_answers("Bear", ""));
        room.end_round();
        let first_round_max = room.next_entry_id;

        room.mark_ready(&ids[0]);
        room.submit_answers(&ids[0], &full_answers("Cat", "Cork"));
        assert!(room.next_entry_id > first_round_max);
    }
}
