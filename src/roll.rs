use serde::Serialize;
use std::collections::BTreeMap;

use crate::roster::{Student, StudentId};

/// Per-student roll state for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollState {
    #[default]
    Unmarked,
    Present,
    Late,
    Absent,
}

impl RollState {
    /// Next state for the per-row switcher.
    ///
    /// `Unmarked` is an entry point only: once a student has been marked the
    /// state cycles present -> late -> absent -> present. Both `Unmarked` and
    /// `Absent` land on `Present`, so one tap always reaches present.
    pub fn advance(self) -> RollState {
        match self {
            RollState::Unmarked => RollState::Present,
            RollState::Present => RollState::Late,
            RollState::Late => RollState::Absent,
            RollState::Absent => RollState::Present,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RollState::Unmarked => "unmarked",
            RollState::Present => "present",
            RollState::Late => "late",
            RollState::Absent => "absent",
        }
    }
}

/// Session-scoped roll assignments. Students without an entry are unmarked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollStates {
    by_student: BTreeMap<StudentId, RollState>,
}

impl RollStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: StudentId) -> RollState {
        self.by_student.get(&id).copied().unwrap_or_default()
    }

    /// Applies the switcher transition for `id` and returns the new state.
    pub fn advance(&mut self, id: StudentId) -> RollState {
        let next = self.get(id).advance();
        self.by_student.insert(id, next);
        next
    }

    /// Number of students touched this session.
    pub fn len(&self) -> usize {
        self.by_student.len()
    }

    /// Frequency of each state across `roster`. Entries for ids outside the
    /// roster are ignored.
    pub fn counts(&self, roster: &[Student]) -> RollCounts {
        let mut counts = RollCounts {
            all: roster.len(),
            ..RollCounts::default()
        };
        for s in roster {
            match self.get(s.id) {
                RollState::Unmarked => counts.unmarked += 1,
                RollState::Present => counts.present += 1,
                RollState::Late => counts.late += 1,
                RollState::Absent => counts.absent += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollCounts {
    pub all: usize,
    pub unmarked: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
}
