//! crates/nyaya_core/src/session.rs
//!
//! The session store: an ordered collection of chat sessions plus the
//! active-session pointer. Sessions are kept most-recently-created first;
//! messages within a session are strictly append-ordered.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ChatSession, Message};

/// Number of leading characters of the first message used for the
/// auto-derived session title.
const TITLE_SNIPPET_LEN: usize = 30;

/// The ordered collection of conversations.
///
/// The invariant "at least one session exists" holds at all times: both
/// constructors materialize a default session when none is available. The
/// active pointer is runtime-only — it is not persisted, and a reload
/// selects the first (most recent) session again.
#[derive(Debug, Clone)]
pub struct SessionLog {
    sessions: Vec<ChatSession>,
    active_id: String,
}

impl SessionLog {
    /// A fresh log holding only the default conversation.
    pub fn new(now: DateTime<Utc>) -> Self {
        let default = ChatSession {
            id: "default".to_string(),
            title: "New Conversation".to_string(),
            messages: Vec::new(),
            updated_at: now,
        };
        Self {
            active_id: default.id.clone(),
            sessions: vec![default],
        }
    }

    /// Restores a persisted collection. An empty collection falls back to
    /// the default session so the invariant holds even for corrupt records.
    pub fn from_sessions(sessions: Vec<ChatSession>, now: DateTime<Utc>) -> Self {
        if sessions.is_empty() {
            return Self::new(now);
        }
        Self {
            active_id: sessions[0].id.clone(),
            sessions,
        }
    }

    /// The persisted representation: sessions only, most-recent-first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// The active session. Falls back to the first session when the active
    /// pointer is stale (lookup-with-default semantics).
    pub fn active(&self) -> &ChatSession {
        self.sessions
            .iter()
            .find(|s| s.id == self.active_id)
            .unwrap_or(&self.sessions[0])
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// Creates a fresh empty session, prepends it, and makes it active.
    /// No limit is enforced on the total session count.
    pub fn new_session(&mut self, now: DateTime<Utc>) -> &ChatSession {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            title: "New Legal Query".to_string(),
            messages: Vec::new(),
            updated_at: now,
        };
        self.active_id = session.id.clone();
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    /// Switches the active pointer. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active_id = id.to_string();
            true
        } else {
            false
        }
    }

    /// Appends a message to the active session and bumps `updated_at`.
    ///
    /// When this is the very first message of the session, the display
    /// title becomes the message's first 30 characters plus an ellipsis
    /// marker; it is never recomputed afterwards.
    pub fn add_message(&mut self, message: Message, now: DateTime<Utc>) {
        let active_id = self.active().id.clone();
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == active_id)
            .expect("active() always resolves to an existing session");

        if session.messages.is_empty() {
            session.title = derive_title(&message.content);
        }
        session.messages.push(message);
        session.updated_at = now;
    }

    /// Convenience for the send flow: the history to hand to the gateway is
    /// everything already in the active session, in append order, excluding
    /// flagged error turns.
    pub fn active_history(&self) -> Vec<Message> {
        self.active()
            .messages
            .iter()
            .filter(|m| !m.is_error)
            .cloned()
            .collect()
    }
}

fn derive_title(content: &str) -> String {
    let snippet: String = content.chars().take(TITLE_SNIPPET_LEN).collect();
    format!("{snippet}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn a_fresh_log_holds_the_default_session() {
        let log = SessionLog::new(now());
        assert_eq!(log.sessions().len(), 1);
        assert_eq!(log.active().id, "default");
        assert_eq!(log.active().title, "New Conversation");
    }

    #[test]
    fn new_sessions_are_prepended_and_made_active() {
        let mut log = SessionLog::new(now());
        let id = log.new_session(now()).id.clone();

        assert_eq!(log.sessions().len(), 2);
        assert_eq!(log.sessions()[0].id, id, "most-recent-first ordering");
        assert_eq!(log.active().id, id);
        assert!(log.active().messages.is_empty());
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut log = SessionLog::new(now());
        log.new_session(now());
        assert!(!log.select("no-such-session"));
        // Active pointer unchanged, lookup still resolves.
        assert_eq!(log.active().id, log.sessions()[0].id);

        assert!(log.select("default"));
        assert_eq!(log.active().id, "default");
    }

    #[test]
    fn first_message_derives_the_title_once() {
        let mut log = SessionLog::new(now());
        let content = "My landlord refuses to return the security deposit after I vacated";
        log.add_message(Message::user(content, now()), now());

        let expected: String = content.chars().take(30).collect();
        assert_eq!(log.active().title, format!("{expected}..."));

        log.add_message(Message::model("You may send a legal notice.", now()), now());
        assert_eq!(log.active().title, format!("{expected}..."), "title never recomputed");
    }

    #[test]
    fn title_derivation_respects_char_boundaries() {
        let mut log = SessionLog::new(now());
        log.add_message(Message::user("धारा ४२० के तहत धोखाधड़ी की शिकायत कैसे करें", now()), now());
        // Must not panic on multi-byte content and must end with the marker.
        assert!(log.active().title.ends_with("..."));
    }

    #[test]
    fn messages_stay_in_append_order() {
        let mut log = SessionLog::new(now());
        log.add_message(Message::user("first", now()), now());
        log.add_message(Message::model("second", now()), now());
        log.add_message(Message::user("third", now()), now());

        let contents: Vec<_> = log.active().messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn restoring_an_empty_collection_materializes_the_default() {
        let log = SessionLog::from_sessions(Vec::new(), now());
        assert_eq!(log.sessions().len(), 1);
        assert_eq!(log.active().id, "default");
    }

    #[test]
    fn history_for_the_gateway_excludes_error_turns() {
        let mut log = SessionLog::new(now());
        log.add_message(Message::user("q1", now()), now());
        log.add_message(Message::error("temporary error", now()), now());
        log.add_message(Message::user("q2", now()), now());

        let history = log.active_history();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| !m.is_error));
    }
}
