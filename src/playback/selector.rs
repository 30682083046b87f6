use crate::room::models::TrackModel;

/// Picks the track that should play next from a playlist snapshot.
///
/// Earliest submission wins, compared at millisecond resolution. Tracks
/// submitted within the same millisecond are ordered by ascending track id so
/// the choice is stable for a given snapshot. An empty playlist yields `None`.
pub fn select_next_track(playlist: &[TrackModel]) -> Option<&TrackModel> {
    playlist
        .iter()
        .min_by(|a, b| play_order_key(a).cmp(&play_order_key(b)))
}

/// Returns the snapshot sorted into the order tracks would be played
pub fn play_order(playlist: &[TrackModel]) -> Vec<TrackModel> {
    let mut ordered = playlist.to_vec();
    ordered.sort_by(|a, b| play_order_key(a).cmp(&play_order_key(b)));
    ordered
}

fn play_order_key(track: &TrackModel) -> (i64, &str) {
    (track.submitted_millis(), track.id.as_str())
}
