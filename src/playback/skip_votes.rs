use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Where a room's skip vote currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    /// No votes for the current track
    Idle,
    /// At least one distinct vote, threshold not yet met
    Voting(usize),
}

/// Result of recording a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Distinct votes counted, including the one just recorded
    pub votes: usize,
    pub room_size: usize,
    /// Consensus reached; the tally has already been reset for the next track
    pub skip: bool,
}

/// Strict majority: more than half of the current members
pub fn consensus_reached(votes: usize, room_size: usize) -> bool {
    votes * 2 > room_size
}

/// Votes needed for consensus in a room of the given size
pub fn votes_required(room_size: usize) -> usize {
    room_size / 2 + 1
}

/// Per-room skip votes for the track that is currently playing.
///
/// Each room's vote set sits behind its own lock so busy rooms do not serialize
/// each other; the outer map is only written when a room appears or goes away.
#[derive(Debug, Default)]
pub struct SkipVoteTally {
    rooms: RwLock<HashMap<String, Arc<Mutex<HashSet<String>>>>>,
}

impl SkipVoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    async fn votes_for(&self, room_id: &str) -> Arc<Mutex<HashSet<String>>> {
        if let Some(votes) = self.rooms.read().await.get(room_id) {
            return Arc::clone(votes);
        }

        let mut rooms = self.rooms.write().await;
        Arc::clone(rooms.entry(room_id.to_string()).or_default())
    }

    /// Records one vote from `member_id`. Repeat votes for the same track are ignored.
    ///
    /// Membership is checked by the caller; `room_size` is the live member count.
    pub async fn record_vote(&self, room_id: &str, member_id: &str, room_size: usize) -> VoteOutcome {
        let votes = self.votes_for(room_id).await;
        let mut votes = votes.lock().await;

        if !votes.insert(member_id.to_string()) {
            debug!(room_id = %room_id, member_id = %member_id, "Duplicate skip vote ignored");
        }

        let count = votes.len();
        let skip = consensus_reached(count, room_size);
        if skip {
            votes.clear();
            info!(
                room_id = %room_id,
                votes = count,
                room_size = room_size,
                "Skip consensus reached"
            );
        }

        VoteOutcome {
            votes: count,
            room_size,
            skip,
        }
    }

    /// Removes the vote of a member who is no longer in the room
    pub async fn withdraw(&self, room_id: &str, member_id: &str) -> bool {
        let votes = self.rooms.read().await.get(room_id).cloned();
        let Some(votes) = votes else {
            return false;
        };

        let withdrawn = votes.lock().await.remove(member_id);
        if withdrawn {
            debug!(room_id = %room_id, member_id = %member_id, "Skip vote withdrawn");
        }
        withdrawn
    }

    /// Keeps only votes cast by `members`, the room's current member list
    pub async fn retain(&self, room_id: &str, members: &[String]) {
        let votes = self.rooms.read().await.get(room_id).cloned();
        if let Some(votes) = votes {
            let mut votes = votes.lock().await;
            let before = votes.len();
            votes.retain(|voter| members.contains(voter));
            if votes.len() != before {
                debug!(room_id = %room_id, dropped = before - votes.len(), "Stale skip votes dropped");
            }
        }
    }

    /// Clears votes because the current track changed for any reason
    pub async fn reset(&self, room_id: &str) {
        let votes = self.rooms.read().await.get(room_id).cloned();
        if let Some(votes) = votes {
            votes.lock().await.clear();
            debug!(room_id = %room_id, "Skip votes reset");
        }
    }

    /// Drops all state for a room that has no members left
    pub async fn forget_room(&self, room_id: &str) {
        if self.rooms.write().await.remove(room_id).is_some() {
            debug!(room_id = %room_id, "Skip vote state dropped");
        }
    }

    pub async fn votes(&self, room_id: &str) -> usize {
        let votes = self.rooms.read().await.get(room_id).cloned();
        match votes {
            Some(votes) => votes.lock().await.len(),
            None => 0,
        }
    }

    pub async fn state(&self, room_id: &str) -> VoteState {
        match self.votes(room_id).await {
            0 => VoteState::Idle,
            n => VoteState::Voting(n),
        }
    }

    pub async fn tracks_room(&self, room_id: &str) -> bool {
        self.rooms.read().await.contains_key(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 0, false)]
    #[case(1, 1, true)]
    #[case(2, 1, false)]
    #[case(2, 2, true)]
    #[case(3, 1, false)]
    #[case(3, 2, true)]
    #[case(4, 2, false)]
    #[case(4, 3, true)]
    #[case(5, 2, false)]
    #[case(5, 3, true)]
    #[case(10, 5, false)]
    #[case(10, 6, true)]
    fn strict_majority_threshold(#[case] room_size: usize, #[case] votes: usize, #[case] skip: bool) {
        assert_eq!(consensus_reached(votes, room_size), skip);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 2)]
    #[case(4, 3)]
    #[case(7, 4)]
    fn votes_required_is_first_count_reaching_consensus(#[case] room_size: usize, #[case] required: usize) {
        assert_eq!(votes_required(room_size), required);
        assert!(consensus_reached(required, room_size));
        assert!(!consensus_reached(required - 1, room_size));
    }

    #[test]
    fn threshold_holds_for_all_small_rooms() {
        for room_size in 1..=50 {
            for votes in 0..=room_size {
                let expected = (votes as f64) > (room_size as f64) / 2.0;
                assert_eq!(consensus_reached(votes, room_size), expected);
            }
        }
    }

    #[tokio::test]
    async fn single_member_room_skips_on_first_vote() {
        let tally = SkipVoteTally::new();

        let outcome = tally.record_vote("1", "alice", 1).await;

        assert_eq!(
            outcome,
            VoteOutcome {
                votes: 1,
                room_size: 1,
                skip: true
            }
        );
        assert_eq!(tally.state("1").await, VoteState::Idle);
    }

    #[tokio::test]
    async fn three_member_room_skips_on_second_vote() {
        let tally = SkipVoteTally::new();

        let first = tally.record_vote("1", "alice", 3).await;
        assert!(!first.skip);
        assert_eq!(tally.state("1").await, VoteState::Voting(1));

        let second = tally.record_vote("1", "bob", 3).await;
        assert!(second.skip);
        assert_eq!(second.votes, 2);
        assert_eq!(tally.votes("1").await, 0);
    }

    #[tokio::test]
    async fn duplicate_votes_count_once() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 4).await;
        tally.record_vote("1", "alice", 4).await;
        let outcome = tally.record_vote("1", "alice", 4).await;

        assert_eq!(outcome.votes, 1);
        assert!(!outcome.skip);
    }

    #[tokio::test]
    async fn duplicate_vote_never_reaches_consensus_in_pair() {
        let tally = SkipVoteTally::new();

        assert!(!tally.record_vote("1", "alice", 2).await.skip);
        assert!(!tally.record_vote("1", "alice", 2).await.skip);
        assert!(tally.record_vote("1", "bob", 2).await.skip);
    }

    #[tokio::test]
    async fn tally_starts_empty_after_skip() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 2).await;
        assert!(tally.record_vote("1", "bob", 2).await.skip);

        let next = tally.record_vote("1", "alice", 2).await;
        assert_eq!(next.votes, 1);
        assert!(!next.skip);
    }

    #[tokio::test]
    async fn reset_discards_stale_votes() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 5).await;
        tally.record_vote("1", "bob", 5).await;
        tally.reset("1").await;

        assert_eq!(tally.state("1").await, VoteState::Idle);
        assert_eq!(tally.record_vote("1", "carol", 5).await.votes, 1);
    }

    #[tokio::test]
    async fn rooms_are_tallied_independently() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 4).await;
        tally.record_vote("2", "alice", 4).await;
        tally.record_vote("2", "bob", 4).await;

        assert_eq!(tally.votes("1").await, 1);
        assert_eq!(tally.votes("2").await, 2);

        tally.reset("2").await;
        assert_eq!(tally.votes("1").await, 1);
    }

    #[tokio::test]
    async fn forget_room_drops_state() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 3).await;
        assert!(tally.tracks_room("1").await);

        tally.forget_room("1").await;
        assert!(!tally.tracks_room("1").await);
        assert_eq!(tally.votes("1").await, 0);
    }

    #[tokio::test]
    async fn withdrawn_vote_no_longer_counts() {
        let tally = SkipVoteTally::new();

        tally.record_vote("1", "alice", 3).await;
        assert!(tally.withdraw("1", "alice").await);
        assert!(!tally.withdraw("1", "alice").await);

        // bob alone in a room of two is not a majority
        let outcome = tally.record_vote("1", "bob", 2).await;
        assert_eq!(outcome.votes, 1);
        assert!(!outcome.skip);
    }

    #[tokio::test]
    async fn retain_drops_votes_from_departed_members() {
        let tally = SkipVoteTally::new();
        tally.record_vote("1", "alice", 3).await;
        tally.record_vote("1", "carol", 3).await;

        tally.retain("1", &["bob".to_string(), "carol".to_string()]).await;

        assert_eq!(tally.votes("1").await, 1);
        assert!(!tally.withdraw("1", "alice").await);
    }

    #[tokio::test]
    async fn withdraw_from_untracked_room_is_noop() {
        let tally = SkipVoteTally::new();

        assert!(!tally.withdraw("9", "alice").await);
        assert!(!tally.tracks_room("9").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_trigger_exactly_one_skip() {
        let tally = Arc::new(SkipVoteTally::new());

        let tasks: Vec<_> = (0..9)
            .map(|i| {
                let tally = Arc::clone(&tally);
                tokio::spawn(async move { tally.record_vote("1", &format!("m{i}"), 9).await })
            })
            .collect();

        let mut skips = 0;
        for task in tasks {
            if task.await.unwrap().skip {
                skips += 1;
            }
        }

        // 5 of 9 reach consensus and reset; the remaining 4 never reach 5 again
        assert_eq!(skips, 1);
        assert_eq!(tally.votes("1").await, 4);
    }
}
