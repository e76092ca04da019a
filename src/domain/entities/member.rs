use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 会员等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Basic,
    Vip,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Basic => f.write_str("basic"),
            Grade::Vip => f.write_str("vip"),
        }
    }
}

impl FromStr for Grade {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Grade::Basic),
            "vip" => Ok(Grade::Vip),
            _ => Err(DomainError::UnknownGrade(s.to_string())),
        }
    }
}

/// 会员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub grade: Grade,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>, grade: Grade) -> Self {
        Self {
            id,
            name: name.into(),
            grade,
        }
    }

    pub fn is_vip(&self) -> bool {
        self.grade == Grade::Vip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_parsing() {
        assert_eq!("VIP".parse::<Grade>().unwrap(), Grade::Vip);
        assert_eq!("basic".parse::<Grade>().unwrap(), Grade::Basic);
        assert!(matches!(
            "gold".parse::<Grade>(),
            Err(DomainError::UnknownGrade(_))
        ));
    }
}
