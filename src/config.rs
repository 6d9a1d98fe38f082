use clap::Parser;
use std::path::PathBuf;

use crate::source::{JsonFileSource, RosterSource, WorkspaceSource};

#[derive(Debug, Parser)]
#[command(
    name = "rollboardd",
    version,
    about = "Roll board sidecar: newline-delimited JSON requests on stdin, responses on stdout"
)]
pub struct Config {
    /// JSON roster file fetched at startup.
    #[arg(long = "roster", value_name = "FILE", conflicts_with = "workspace")]
    pub roster: Option<PathBuf>,

    /// Workspace directory whose database holds the roster.
    #[arg(long = "workspace", value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Tracing filter directives (defaults to RUST_LOG, then "info").
    #[arg(long = "log-filter", value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,
}

impl Config {
    pub fn roster_source(&self) -> Option<Box<dyn RosterSource>> {
        if let Some(path) = &self.roster {
            return Some(Box::new(JsonFileSource::new(path.clone())));
        }
        self.workspace
            .as_ref()
            .map(|dir| Box::new(WorkspaceSource::new(dir.clone())) as Box<dyn RosterSource>)
    }
}
