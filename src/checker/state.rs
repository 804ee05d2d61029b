//! Per-file checking state

use std::fmt;

/// Progress of one file through the first pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCheckState {
    NotChecked,
    FileLevelChecking,
    RowLevelChecking,
    /// A fail-fast file-level checker reported errors, rows were not read
    Aborted,
    Done,
}

impl FileCheckState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCheckState::NotChecked => "NOT_CHECKED",
            FileCheckState::FileLevelChecking => "FILE_LEVEL_CHECKING",
            FileCheckState::RowLevelChecking => "ROW_LEVEL_CHECKING",
            FileCheckState::Aborted => "ABORTED",
            FileCheckState::Done => "DONE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileCheckState::Aborted | FileCheckState::Done)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: FileCheckState) -> bool {
        matches!(
            (self, next),
            (FileCheckState::NotChecked, FileCheckState::FileLevelChecking)
                | (FileCheckState::FileLevelChecking, FileCheckState::RowLevelChecking)
                | (FileCheckState::FileLevelChecking, FileCheckState::Aborted)
                | (FileCheckState::RowLevelChecking, FileCheckState::Done)
        )
    }
}

impl fmt::Display for FileCheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
