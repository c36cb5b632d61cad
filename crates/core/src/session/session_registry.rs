use std::collections::HashMap;
use std::time::Instant;

use crate::metrics::domain::engine_state::EngineState;

/// Per-interview engine state, created lazily on a session's first frame.
///
/// Sessions never expire; the worker is expected to be restarted per batch
/// of interviews.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, EngineState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `interview_id`, starting a fresh session clocked at `now`
    /// if this is the first time the id is seen.
    pub fn state_for(&mut self, interview_id: &str, now: Instant) -> &mut EngineState {
        if !self.sessions.contains_key(interview_id) {
            log::debug!("Starting session {interview_id}");
        }
        self.sessions
            .entry(interview_id.to_owned())
            .or_insert_with(|| EngineState::new(now))
    }

    pub fn get(&self, interview_id: &str) -> Option<&EngineState> {
        self.sessions.get(interview_id)
    }

    pub fn contains(&self, interview_id: &str) -> bool {
        self.sessions.contains_key(interview_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
