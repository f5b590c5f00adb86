//! Hero operation errors.

/// Broad kind of a rejected hero command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing id, self-reference, ownership or limit problems
    Validation,
    /// The master's current state forbids the operation
    Precondition,
}

/// Errors returned by hero membership and leadership commands.
///
/// Every variant is recoverable and leaves all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeroError {
    #[error("Master character is unavailable")]
    InvalidMaster,
    #[error("Character not found")]
    NotFound,
    #[error("A master cannot be its own hero")]
    SelfReference,
    #[error("This character is already connected")]
    AlreadyOnline,
    #[error("The character must belong to the same account")]
    CrossAccount,
    #[error("This character is already active as a hero")]
    AlreadyActive,
    #[error("Maximum number of heroes reached ({max})")]
    LimitReached { max: usize },
    #[error("No active heroes")]
    NoGroup,
    #[error("No active hero with this identifier")]
    NotActive,
    #[error("This character is already the one being played")]
    AlreadyIncarnated,
    #[error("Cannot switch while in combat")]
    InCombat,
    #[error("Cannot switch while an action is in progress")]
    ActionInProgress,
    #[error("Master position is unknown")]
    UnknownPosition,
    #[error("No active session")]
    NoSession,
}

impl HeroError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HeroError::InCombat
            | HeroError::ActionInProgress
            | HeroError::UnknownPosition
            | HeroError::NoSession => ErrorCategory::Precondition,
            _ => ErrorCategory::Validation,
        }
    }
}
