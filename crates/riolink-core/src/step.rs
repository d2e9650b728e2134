//! Outcome of one interactive step
//!
//! A step either produces a value or is absent for a stated reason. The
//! reason decides whether the enclosing flow aborts silently or shows a
//! notice, so callers never have to infer that from context.

use std::fmt;

/// Why a step produced no value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absence {
    /// No workspace is open; nothing to do
    NoWorkspace,
    /// The user backed out of a prompt
    Cancelled,
    /// A workspace was chosen but its preferences cannot be located
    WorkspaceNotFound,
    /// The list to choose from is empty
    NoChoices,
    /// The flow needs a team number and none is configured
    NoTeamNumber,
    /// The user entered something unusable
    InvalidInput(String),
}

impl Absence {
    /// Notice to show the user, `None` for silent aborts
    pub fn notice(&self) -> Option<String> {
        match self {
            Absence::NoWorkspace | Absence::Cancelled => None,
            Absence::WorkspaceNotFound => Some("Could not find a workspace".to_string()),
            Absence::NoChoices => Some("No languages available to add".to_string()),
            Absence::NoTeamNumber => {
                Some("No team number set; run set-team-number first".to_string())
            }
            Absence::InvalidInput(message) => Some(message.clone()),
        }
    }
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Absence::NoWorkspace => write!(f, "no workspace open"),
            Absence::Cancelled => write!(f, "cancelled"),
            Absence::WorkspaceNotFound => write!(f, "workspace not found"),
            Absence::NoChoices => write!(f, "no choices available"),
            Absence::NoTeamNumber => write!(f, "no team number"),
            Absence::InvalidInput(message) => write!(f, "invalid input: {}", message),
        }
    }
}

/// Value or absence-with-reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Value(T),
    Absent(Absence),
}

impl<T> Step<T> {
    /// Turn into a `Result` so flows can use `?`
    pub fn into_result(self) -> Result<T, Absence> {
        match self {
            Step::Value(value) => Ok(value),
            Step::Absent(absence) => Err(absence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_versus_notice() {
        assert!(Absence::NoWorkspace.notice().is_none());
        assert!(Absence::Cancelled.notice().is_none());
        assert_eq!(
            Absence::WorkspaceNotFound.notice().as_deref(),
            Some("Could not find a workspace")
        );
        assert_eq!(
            Absence::NoChoices.notice().as_deref(),
            Some("No languages available to add")
        );
        assert!(Absence::InvalidInput("bad".into()).notice().is_some());
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Step::Value(3).into_result(), Ok(3));
        assert_eq!(
            Step::<u8>::Absent(Absence::Cancelled).into_result(),
            Err(Absence::Cancelled)
        );
    }
}
