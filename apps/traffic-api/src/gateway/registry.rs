//! Session registry and room membership table.
//!
//! Sessions live in a `DashMap` keyed by session id. Room membership lives in
//! a single `parking_lot::RwLock`ed table, and each session handle mirrors its
//! own room set. Both views are only mutated while holding the table's write
//! lock, and every fan-out holds its read lock, so a broadcast never observes
//! a half-removed session and a join racing a teardown cannot leave a
//! dangling membership.
//!
//! Lock order: membership table first, then a `DashMap` shard.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc::error::TrySendError;

use super::events::ServerEvent;
use super::rooms::Room;
use super::session::{OutboundSender, Session};

/// Result of adding a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Added,
    AlreadyMember,
    /// The session is not (or no longer) registered; nothing was recorded.
    UnknownSession,
}

/// Who an event is fanned out to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Rooms(&'a [Room]),
    All,
}

/// A live session together with its outbound queue and joined rooms.
struct SessionHandle {
    session: Arc<Session>,
    outbound: OutboundSender,
    rooms: BTreeSet<Room>,
}

/// What teardown removed.
#[derive(Debug)]
pub struct RemovedSession {
    pub session: Arc<Session>,
    pub rooms: Vec<Room>,
}

/// Shared registry of live sessions and their room memberships.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
    members: RwLock<HashMap<Room, HashSet<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Register a freshly authenticated session with no rooms.
    pub fn register(&self, session: Arc<Session>, outbound: OutboundSender) {
        let handle = SessionHandle {
            session: session.clone(),
            outbound,
            rooms: BTreeSet::new(),
        };
        self.sessions.insert(session.session_id.clone(), handle);
    }

    pub fn join(&self, session_id: &str, room: Room) -> Membership {
        let mut members = self.members.write();
        let Some(mut handle) = self.sessions.get_mut(session_id) else {
            return Membership::UnknownSession;
        };
        if !handle.rooms.insert(room.clone()) {
            return Membership::AlreadyMember;
        }
        members
            .entry(room)
            .or_default()
            .insert(session_id.to_string());
        Membership::Added
    }

    /// Remove one membership. Returns whether the session was a member.
    pub fn leave(&self, session_id: &str, room: &Room) -> bool {
        let mut members = self.members.write();
        let Some(mut handle) = self.sessions.get_mut(session_id) else {
            return false;
        };
        if !handle.rooms.remove(room) {
            return false;
        }
        drop(handle);
        Self::detach(&mut members, room, session_id);
        true
    }

    /// Remove a session from every room and from the registry in one step.
    /// Returns `None` if it was already gone.
    pub fn remove(&self, session_id: &str) -> Option<RemovedSession> {
        let mut members = self.members.write();
        let (_, handle) = self.sessions.remove(session_id)?;
        for room in &handle.rooms {
            Self::detach(&mut members, room, session_id);
        }
        Some(RemovedSession {
            session: handle.session,
            rooms: handle.rooms.into_iter().collect(),
        })
    }

    /// Drop a member, discarding the room entry once it is empty.
    fn detach(members: &mut HashMap<Room, HashSet<String>>, room: &Room, session_id: &str) {
        if let Some(set) = members.get_mut(room) {
            set.remove(session_id);
            if set.is_empty() {
                members.remove(room);
            }
        }
    }

    /// Push an event to every session in the target. A session in several
    /// targeted rooms receives it once. Returns the number of sessions reached.
    pub fn deliver(&self, target: Target<'_>, event: &Arc<ServerEvent>) -> usize {
        let members = self.members.read();
        match target {
            Target::All => self
                .sessions
                .iter()
                .filter(|entry| push(entry.value(), event))
                .count(),
            Target::Rooms(rooms) => {
                let recipients: HashSet<&str> = rooms
                    .iter()
                    .filter_map(|room| members.get(room))
                    .flat_map(|set| set.iter().map(String::as_str))
                    .collect();

                recipients
                    .into_iter()
                    .filter(|id| {
                        self.sessions
                            .get(*id)
                            .is_some_and(|handle| push(&handle, event))
                    })
                    .count()
            }
        }
    }

    /// Push an event to a single session.
    pub fn send_to(&self, session_id: &str, event: &Arc<ServerEvent>) -> bool {
        let _members = self.members.read();
        self.sessions
            .get(session_id)
            .is_some_and(|handle| push(&handle, event))
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|h| h.session.clone())
    }

    pub fn rooms_of(&self, session_id: &str) -> Option<Vec<Room>> {
        let _members = self.members.read();
        self.sessions
            .get(session_id)
            .map(|h| h.rooms.iter().cloned().collect())
    }

    /// Session ids currently in a room, sorted.
    pub fn members(&self, room: &Room) -> Vec<String> {
        let members = self.members.read();
        let mut ids: Vec<String> = members
            .get(room)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Member count per non-empty room, keyed by room name.
    pub fn room_sizes(&self) -> BTreeMap<String, usize> {
        self.members
            .read()
            .iter()
            .map(|(room, set)| (room.to_string(), set.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking enqueue. A full queue drops the event for this session only.
fn push(handle: &SessionHandle, event: &Arc<ServerEvent>) -> bool {
    match handle.outbound.try_send(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(
                session_id = %handle.session.session_id,
                event = %event.event,
                "outbound queue full, dropping event"
            );
            false
        }
        // Connection task already gone; teardown will follow.
        Err(TrySendError::Closed(_)) => false,
    }
}
