//! Popup notifications a tab has not dismissed yet. Dismissals are kept in
//! session storage, so a new tab shows active popups again.

use academy_shared::constants::session_keys;
use academy_store::{PopupNotification, Tab};

fn seen_ids(tab: &Tab) -> Vec<String> {
    tab.session().get_items(session_keys::SEEN_POPUP_IDS, Vec::new())
}

/// Active popups this tab has not marked as seen.
pub fn unseen_popups(tab: &Tab) -> Vec<PopupNotification> {
    let seen = seen_ids(tab);
    tab.popups()
        .filter(|p| p.is_active && !seen.contains(&p.id))
}

pub fn mark_popup_seen(tab: &Tab, popup_id: &str) {
    let mut seen = seen_ids(tab);
    if !seen.iter().any(|id| id == popup_id) {
        seen.push(popup_id.to_string());
        tab.session().save_items(session_keys::SEEN_POPUP_IDS, &seen);
    }
}
