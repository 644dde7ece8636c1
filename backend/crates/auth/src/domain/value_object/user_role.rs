use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use kernel::error::app_error::AppError;

/// Closed role hierarchy: Developer > Admin > Teacher > Student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Student = 0,
    Teacher = 1,
    Admin = 2,
    Developer = 3,
}

impl UserRole {
    /// Highest privilege first
    pub const ALL: [UserRole; 4] = [
        UserRole::Developer,
        UserRole::Admin,
        UserRole::Teacher,
        UserRole::Student,
    ];

    /// Position in the hierarchy; larger is more privileged
    #[inline]
    pub const fn rank(&self) -> i16 {
        *self as i16
    }

    /// Inverse of [`UserRole::rank`]; the stored form
    pub fn from_rank(rank: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.rank() == rank)
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Developer => "Developer",
            Admin => "Admin",
            Teacher => "Teacher",
            Student => "Student",
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.code() == code)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| AppError::bad_request(format!("Invalid role: {s}")))
    }
}
