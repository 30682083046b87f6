// Public API
pub use selector::{play_order, select_next_track};
pub use service::PlaybackService;
pub use skip_votes::{consensus_reached, votes_required, SkipVoteTally, VoteOutcome, VoteState};

// Internal modules
mod selector;
mod service;
mod skip_votes;
