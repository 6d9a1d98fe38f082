use serde::Deserialize;

use crate::board::Board;
use crate::source::RosterSource;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub board: Board,
    pub source: Option<Box<dyn RosterSource>>,
    /// Presentation-only; never feeds into the board.
    pub roll_mode: bool,
}

impl AppState {
    pub fn new(source: Option<Box<dyn RosterSource>>) -> Self {
        Self {
            board: Board::new(),
            source,
            roll_mode: false,
        }
    }
}
