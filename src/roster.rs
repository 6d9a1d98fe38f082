use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::{Ordering, Reverse};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::roll::{RollState, RollStates};

pub type StudentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
}

// Partial records still render: a null name reads as "".
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Student {
    fn matches_search(&self, needle: &str) -> bool {
        format!(
            "{} {}",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
        .contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    FirstName,
    LastName,
}

impl SortKey {
    pub fn toggled(self) -> SortKey {
        match self {
            SortKey::FirstName => SortKey::LastName,
            SortKey::LastName => SortKey::FirstName,
        }
    }

    fn of(self, s: &Student) -> &str {
        match self {
            SortKey::FirstName => &s.first_name,
            SortKey::LastName => &s.last_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Roll-state filter offered by the roll overlay. There is deliberately no
/// `unmarked` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFilter {
    #[default]
    All,
    Present,
    Late,
    Absent,
}

impl StateFilter {
    pub fn parse(raw: &str) -> Option<StateFilter> {
        match raw.trim() {
            "all" => Some(StateFilter::All),
            "present" => Some(StateFilter::Present),
            "late" => Some(StateFilter::Late),
            "absent" => Some(StateFilter::Absent),
            _ => None,
        }
    }

    fn admits(self, state: RollState) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Present => state == RollState::Present,
            StateFilter::Late => state == RollState::Late,
            StateFilter::Absent => state == RollState::Absent,
        }
    }
}

/// Search, filter and sort settings for the board. Each setter returns a new
/// value and touches only its own field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCriteria {
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub state_filter: StateFilter,
    pub search_text: String,
}

impl ViewCriteria {
    pub fn with_sort_key_toggled(&self) -> Self {
        Self {
            sort_key: self.sort_key.toggled(),
            ..self.clone()
        }
    }

    pub fn with_sort_direction_toggled(&self) -> Self {
        Self {
            sort_direction: self.sort_direction.toggled(),
            ..self.clone()
        }
    }

    pub fn with_state_filter(&self, state_filter: StateFilter) -> Self {
        Self {
            state_filter,
            ..self.clone()
        }
    }

    pub fn with_search_text(&self, search_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            ..self.clone()
        }
    }

    fn search_needle(&self) -> Option<String> {
        let t = self.search_text.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_lowercase())
        }
    }
}

/// Collation key for a name.
///
/// Levels, strongest first: base letters with diacritics stripped and case
/// folded, then accents (unaccented before accented), then case (lowercase
/// before uppercase). Only byte-identical names compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollationKey {
    base: String,
    accented: String,
    raw: String,
}

impl CollationKey {
    pub fn new(name: &str) -> Self {
        let accented: String = name.nfd().flat_map(char::to_lowercase).collect();
        let base = accented.chars().filter(|c| !is_combining_mark(*c)).collect();
        Self {
            base,
            accented,
            raw: name.to_string(),
        }
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base
            .cmp(&other.base)
            .then_with(|| self.accented.cmp(&other.accented))
            // Reversed so that "a" sorts before "A".
            .then_with(|| other.raw.cmp(&self.raw))
    }
}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Name ordering used by the sort stage.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

/// Builds the displayed roster: search, then roll-state filter, then a stable
/// sort on the selected name.
pub fn derive(roster: &[Student], criteria: &ViewCriteria, states: &RollStates) -> Vec<Student> {
    let needle = criteria.search_needle();
    let mut view: Vec<Student> = roster
        .iter()
        .filter(|s| needle.as_deref().map_or(true, |n| s.matches_search(n)))
        .filter(|s| criteria.state_filter.admits(states.get(s.id)))
        .cloned()
        .collect();

    let key = criteria.sort_key;
    // Reverse the key, not the output, so ties keep their order.
    match criteria.sort_direction {
        SortDirection::Ascending => view.sort_by_cached_key(|s| CollationKey::new(key.of(s))),
        SortDirection::Descending => {
            view.sort_by_cached_key(|s| Reverse(CollationKey::new(key.of(s))))
        }
    }
    view
}
