use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db;
use crate::roster::{Student, StudentId};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid roster {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate student id {0}")]
    DuplicateId(StudentId),
    #[error("workspace database error: {0}")]
    Database(String),
    #[error("no roster source configured")]
    NoSource,
}

/// Something that can produce the roster snapshot for a session.
pub trait RosterSource {
    fn describe(&self) -> String;
    fn fetch_roster(&self) -> Result<Vec<Student>, FetchError>;
}

/// JSON document holding either a bare student array or `{ "students": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RosterSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.to_string_lossy())
    }

    fn fetch_roster(&self) -> Result<Vec<Student>, FetchError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_roster(&self.path, &text)
    }
}

/// Roster table inside a workspace database.
#[derive(Debug, Clone)]
pub struct WorkspaceSource {
    dir: PathBuf,
}

impl WorkspaceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RosterSource for WorkspaceSource {
    fn describe(&self) -> String {
        format!("workspace:{}", self.dir.to_string_lossy())
    }

    fn fetch_roster(&self) -> Result<Vec<Student>, FetchError> {
        let roster = db::open_db(&self.dir)
            .and_then(|conn| db::list_roster(&conn))
            .map_err(|e| FetchError::Database(format!("{e:#}")))?;
        check_unique(&roster)?;
        Ok(roster)
    }
}

fn parse_roster(path: &Path, text: &str) -> Result<Vec<Student>, FetchError> {
    let parse_err = |source| FetchError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mut doc: serde_json::Value = serde_json::from_str(text).map_err(parse_err)?;
    let list = if doc.get("students").is_some() {
        doc["students"].take()
    } else {
        doc
    };
    let roster: Vec<Student> = serde_json::from_value(list).map_err(parse_err)?;
    check_unique(&roster)?;
    Ok(roster)
}

fn check_unique(roster: &[Student]) -> Result<(), FetchError> {
    let mut seen: HashSet<StudentId> = HashSet::with_capacity(roster.len());
    for s in roster {
        if !seen.insert(s.id) {
            return Err(FetchError::DuplicateId(s.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> PathBuf {
        PathBuf::from("roster.json")
    }

    #[test]
    fn parses_wrapped_and_bare_payloads() {
        let wrapped = r#"{"students":[{"id":1,"first_name":"Bob","last_name":"Zed"}]}"#;
        let bare = r#"[{"id":1,"first_name":"Bob","last_name":"Zed"}]"#;
        let a = parse_roster(&p(), wrapped).expect("wrapped");
        let b = parse_roster(&p(), bare).expect("bare");
        assert_eq!(a, b);
        assert_eq!(a[0].first_name, "Bob");
    }

    #[test]
    fn missing_id_is_a_parse_error() {
        let err = parse_roster(&p(), r#"[{"first_name":"Bob"}]"#).expect_err("no id");
        assert!(matches!(err, FetchError::Parse { .. }), "{err}");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse_roster(&p(), r#"[{"id":3},{"id":3}]"#).expect_err("dup");
        assert!(matches!(err, FetchError::DuplicateId(3)));
    }

    #[test]
    fn workspace_failure_carries_the_path() {
        let blocker = std::env::temp_dir().join(format!(
            "rollboard-source-blocker-{}",
            std::process::id()
        ));
        std::fs::write(&blocker, "not a directory").expect("write blocker");

        let err = WorkspaceSource::new(&blocker)
            .fetch_roster()
            .expect_err("file is not a workspace");
        match &err {
            FetchError::Database(message) => {
                assert!(message.contains(&blocker.display().to_string()), "{message}")
            }
            other => panic!("unexpected error: {other}"),
        }

        let _ = std::fs::remove_file(blocker);
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let src = JsonFileSource::new("/definitely/not/here/roster.json");
        let err = src.fetch_roster().expect_err("missing file");
        assert!(matches!(err, FetchError::Io { .. }));
        assert!(src.describe().starts_with("file:"));
    }
}
