use serde::Serialize;
use tracing::{debug, info, warn};

use crate::roll::{RollCounts, RollState, RollStates};
use crate::roster::{derive, StateFilter, Student, StudentId, ViewCriteria};
use crate::source::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    Pending,
    Loaded,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub student: Student,
    pub roll_state: RollState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub load: LoadState,
    pub criteria: ViewCriteria,
    pub rows: Vec<BoardRow>,
    pub counts: RollCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollEntry {
    pub student_id: StudentId,
    pub roll_state: RollState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollSummary {
    pub student_roll_states: Vec<RollEntry>,
    pub counts: RollCounts,
}

/// Owns the roster snapshot, the view criteria and the roll states for one
/// session. Every intent replaces the piece of state it targets and then
/// rebuilds the view from scratch.
#[derive(Debug)]
pub struct Board {
    load: LoadState,
    roster: Vec<Student>,
    criteria: ViewCriteria,
    states: RollStates,
    view: Vec<Student>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            load: LoadState::Pending,
            roster: Vec::new(),
            criteria: ViewCriteria::default(),
            states: RollStates::new(),
            view: Vec::new(),
        }
    }

    pub fn begin_load(&mut self) {
        self.load = LoadState::Pending;
    }

    /// Installs a fetch outcome. Either way the session restarts with
    /// default criteria and no roll states.
    pub fn finish_load(&mut self, result: Result<Vec<Student>, FetchError>) {
        self.criteria = ViewCriteria::default();
        self.states = RollStates::new();
        match result {
            Ok(roster) => {
                info!(students = roster.len(), "roster loaded");
                self.roster = roster;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                warn!(error = %e, "roster fetch failed");
                self.roster = Vec::new();
                self.load = LoadState::Failed {
                    error: e.to_string(),
                };
            }
        }
        self.recompute();
    }

    pub fn toggle_sort_key(&mut self) -> &[Student] {
        let next = self.criteria.with_sort_key_toggled();
        self.apply(next)
    }

    pub fn toggle_sort_direction(&mut self) -> &[Student] {
        let next = self.criteria.with_sort_direction_toggled();
        self.apply(next)
    }

    pub fn set_state_filter(&mut self, filter: StateFilter) -> &[Student] {
        let next = self.criteria.with_state_filter(filter);
        self.apply(next)
    }

    pub fn set_search_text(&mut self, text: &str) -> &[Student] {
        let next = self.criteria.with_search_text(text);
        self.apply(next)
    }

    /// Advances one student's roll state and rebuilds the view in the same
    /// step, so an active state filter sees the new value immediately.
    pub fn advance_student(&mut self, id: StudentId) -> RollState {
        let next = self.states.advance(id);
        debug!(student_id = id, roll_state = next.as_str(), "roll state advanced");
        self.recompute();
        next
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.roster.iter().any(|s| s.id == id)
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn criteria(&self) -> &ViewCriteria {
        &self.criteria
    }

    pub fn view(&self) -> &[Student] {
        &self.view
    }

    pub fn roll_state(&self, id: StudentId) -> RollState {
        self.states.get(id)
    }

    pub fn counts(&self) -> RollCounts {
        self.states.counts(&self.roster)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            load: self.load.clone(),
            criteria: self.criteria.clone(),
            rows: self
                .view
                .iter()
                .map(|s| BoardRow {
                    student: s.clone(),
                    roll_state: self.roll_state(s.id),
                })
                .collect(),
            counts: self.counts(),
        }
    }

    /// Marked students in roster order, in the shape a roll submission uses.
    pub fn roll_summary(&self) -> RollSummary {
        RollSummary {
            student_roll_states: self
                .roster
                .iter()
                .filter_map(|s| match self.roll_state(s.id) {
                    RollState::Unmarked => None,
                    roll_state => Some(RollEntry {
                        student_id: s.id,
                        roll_state,
                    }),
                })
                .collect(),
            counts: self.counts(),
        }
    }

    fn apply(&mut self, criteria: ViewCriteria) -> &[Student] {
        self.criteria = criteria;
        self.recompute();
        &self.view
    }

    fn recompute(&mut self) {
        self.view = derive(&self.roster, &self.criteria, &self.states);
        debug!(
            rows = self.view.len(),
            roster = self.roster.len(),
            marked = self.states.len(),
            "view rebuilt"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{SortDirection, SortKey};

    fn student(id: StudentId, first: &str, last: &str) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn loaded() -> Board {
        let mut b = Board::new();
        b.finish_load(Ok(vec![student(1, "Bob", "Zed"), student(2, "Amy", "Young")]));
        b
    }

    fn ids(view: &[Student]) -> Vec<StudentId> {
        view.iter().map(|s| s.id).collect()
    }

    #[test]
    fn new_board_is_pending_and_empty() {
        let b = Board::new();
        assert_eq!(b.load_state(), &LoadState::Pending);
        assert!(b.view().is_empty());
        assert_eq!(b.criteria(), &ViewCriteria::default());
    }

    #[test]
    fn load_applies_default_order() {
        let b = loaded();
        assert_eq!(b.load_state(), &LoadState::Loaded);
        assert_eq!(ids(b.view()), vec![2, 1]);
    }

    #[test]
    fn toggle_direction_reverses_view() {
        let mut b = loaded();
        assert_eq!(ids(b.toggle_sort_direction()), vec![1, 2]);
        assert_eq!(ids(b.toggle_sort_direction()), vec![2, 1]);
    }

    #[test]
    fn search_narrows_view() {
        let mut b = loaded();
        assert_eq!(ids(b.set_search_text("bob")), vec![1]);
        assert_eq!(ids(b.set_search_text("")), vec![2, 1]);
    }

    #[test]
    fn advance_then_filter_present() {
        let mut b = loaded();
        assert_eq!(b.advance_student(1), RollState::Present);
        assert_eq!(ids(b.set_state_filter(StateFilter::Present)), vec![1]);
        assert_eq!(b.roll_state(2), RollState::Unmarked);
    }

    #[test]
    fn advance_under_active_filter_drops_student_immediately() {
        let mut b = loaded();
        b.advance_student(1);
        b.set_state_filter(StateFilter::Present);
        assert_eq!(ids(b.view()), vec![1]);

        assert_eq!(b.advance_student(1), RollState::Late);
        assert!(b.view().is_empty());

        b.set_state_filter(StateFilter::Late);
        assert_eq!(ids(b.view()), vec![1]);
    }

    #[test]
    fn intents_do_not_reset_each_other() {
        let mut b = loaded();
        b.set_search_text("a");
        b.set_state_filter(StateFilter::Absent);
        b.toggle_sort_key();
        b.toggle_sort_direction();
        b.advance_student(2);

        let c = b.criteria();
        assert_eq!(c.search_text, "a");
        assert_eq!(c.state_filter, StateFilter::Absent);
        assert_eq!(c.sort_key, SortKey::LastName);
        assert_eq!(c.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn four_advances_cycle_back_to_present() {
        let mut b = loaded();
        for _ in 0..4 {
            b.advance_student(1);
        }
        assert_eq!(b.roll_state(1), RollState::Present);
    }

    #[test]
    fn failed_load_leaves_defaults_and_empty_view() {
        let mut b = loaded();
        b.advance_student(1);
        b.set_search_text("bob");
        b.begin_load();
        assert_eq!(b.load_state(), &LoadState::Pending);
        b.finish_load(Err(FetchError::NoSource));

        assert!(matches!(b.load_state(), LoadState::Failed { .. }));
        assert!(b.view().is_empty());
        assert_eq!(b.criteria(), &ViewCriteria::default());
        assert_eq!(b.roll_state(1), RollState::Unmarked);
        assert!(!b.contains(1));
    }

    #[test]
    fn reload_starts_a_fresh_session() {
        let mut b = loaded();
        b.advance_student(2);
        b.toggle_sort_key();
        b.finish_load(Ok(vec![student(2, "Amy", "Young")]));
        assert_eq!(b.roll_state(2), RollState::Unmarked);
        assert_eq!(b.criteria(), &ViewCriteria::default());
        assert_eq!(ids(b.view()), vec![2]);
    }

    #[test]
    fn snapshot_rows_carry_state_and_counts_cover_roster() {
        let mut b = loaded();
        b.advance_student(1);
        b.set_search_text("amy");
        let snap = b.snapshot();
        assert_eq!(snap.rows.len(), 1);
        assert_eq!(snap.rows[0].student.id, 2);
        assert_eq!(snap.rows[0].roll_state, RollState::Unmarked);
        assert_eq!(snap.counts.all, 2);
        assert_eq!(snap.counts.present, 1);
        assert_eq!(snap.counts.unmarked, 1);

        let v = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(v["load"]["status"], "loaded");
        assert_eq!(v["criteria"]["sortKey"], "first_name");
        assert_eq!(v["criteria"]["searchText"], "amy");
        assert_eq!(v["rows"][0]["rollState"], "unmarked");
    }

    #[test]
    fn roll_summary_lists_marked_students_in_roster_order() {
        let mut b = loaded();
        b.advance_student(2);
        b.advance_student(1);
        b.advance_student(1);
        let summary = b.roll_summary();
        let got: Vec<(StudentId, RollState)> = summary
            .student_roll_states
            .iter()
            .map(|e| (e.student_id, e.roll_state))
            .collect();
        assert_eq!(got, vec![(1, RollState::Late), (2, RollState::Present)]);
        assert_eq!(summary.counts.late, 1);
    }
}
