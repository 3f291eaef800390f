use std::fmt;

use kernel::error::validation::{Constraint, FieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub const ALL: [RunStatus; 5] = [
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Succeeded,
        RunStatus::Failed,
        RunStatus::Cancelled,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use RunStatus::*;
        match self {
            Pending => "pending",
            Running => "running",
            Succeeded => "succeeded",
            Failed => "failed",
            Cancelled => "cancelled",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, FieldError> {
        use RunStatus::*;
        match code {
            "pending" => Ok(Pending),
            "running" => Ok(Running),
            "succeeded" => Ok(Succeeded),
            "failed" => Ok(Failed),
            "cancelled" => Ok(Cancelled),
            _ => Err(FieldError::new(
                Constraint::UnknownVariant,
                format!(
                    "unknown status `{code}`, expected one of pending, running, succeeded, failed, cancelled"
                ),
            )),
        }
    }

    #[inline]
    pub const fn is_terminal(&self) -> bool {
        use RunStatus::*;
        matches!(self, Succeeded | Failed | Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
