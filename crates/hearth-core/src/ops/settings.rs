//! Household preferences: ambient sound and the sync relay URL.

use crate::model::Snapshot;

use super::{CommandError, Outcome};

#[must_use]
pub fn set_sound_enabled(snapshot: &Snapshot, enabled: bool) -> Snapshot {
    let mut settings = snapshot.settings.clone();
    settings.sound_enabled = enabled;
    snapshot.with_settings(settings)
}

/// Store `url` as the sync relay endpoint. A blank `url` clears it.
///
/// The outcome's value is the stored URL.
///
/// # Errors
///
/// Returns [`CommandError::InvalidSyncUrl`] when a non-blank `url` does not
/// start with `http://` or `https://`.
pub fn set_sync_url(snapshot: &Snapshot, url: &str) -> Result<Outcome<String>, CommandError> {
    let url = url.trim();
    if !url.is_empty() && !has_http_scheme(url) {
        return Err(CommandError::InvalidSyncUrl);
    }
    let mut settings = snapshot.settings.clone();
    settings.sync_endpoint_url = url.to_string();
    Ok(Outcome::new(snapshot.with_settings(settings), url.to_string()))
}

fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_flag_round_trips() {
        let snapshot = Snapshot::default();
        let on = set_sound_enabled(&snapshot, true);
        assert!(on.settings.sound_enabled);
        assert!(!set_sound_enabled(&on, false).settings.sound_enabled);
        assert_eq!(on.ledger, snapshot.ledger);
    }

    #[test]
    fn sync_url_accepts_http_schemes_only() {
        let snapshot = Snapshot::default();
        let outcome = set_sync_url(&snapshot, "  HTTPS://relay.example/sync ").expect("https");
        assert_eq!(outcome.value, "HTTPS://relay.example/sync");
        assert_eq!(outcome.state.settings.sync_endpoint_url, "HTTPS://relay.example/sync");
        assert!(set_sync_url(&snapshot, "http://10.0.0.2:8787").is_ok());

        for bad in ["ftp://relay.example", "relay.example", "ht", "héllo://x"] {
            assert_eq!(set_sync_url(&snapshot, bad), Err(CommandError::InvalidSyncUrl), "{bad}");
        }
    }

    #[test]
    fn blank_sync_url_clears() {
        let outcome = set_sync_url(&Snapshot::default(), "   ").expect("clear");
        assert_eq!(outcome.value, "");
        assert!(outcome.state.settings.sync_endpoint_url.is_empty());
    }
}
