use serde::{Deserialize, Serialize};
use std::fmt;

/// Gender term used when building portrait prompts. Carried as roster data
/// instead of being guessed from the subject's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// One of the fixed individuals awakened by the pipeline. Immutable,
/// compiled in, ordered by id.
#[derive(Debug, Clone, Copy)]
pub struct Subject {
    pub id: u32,
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub gender: Gender,
}

impl Subject {
    /// Name as sent to the text stage: `"Name (Alias)"` when an alias exists.
    pub fn display_name(&self) -> String {
        match self.alias {
            Some(alias) => format!("{} ({})", self.name, alias),
            None => self.name.to_string(),
        }
    }
}

pub const ROSTER: &[Subject] = &[
    Subject {
        id: 1,
        name: "Dharmendra Singh Indoliya",
        alias: Some("DharMa"),
        gender: Gender::Male,
    },
    Subject {
        id: 2,
        name: "Anuj Singh Indoliya",
        alias: None,
        gender: Gender::Male,
    },
    Subject {
        id: 3,
        name: "Anurag Singh Indoliya",
        alias: None,
        gender: Gender::Male,
    },
    Subject {
        id: 4,
        name: "Kush Singh Indoliya",
        alias: None,
        gender: Gender::Male,
    },
    Subject {
        id: 5,
        name: "Ankit Singh Indoliya",
        alias: None,
        gender: Gender::Male,
    },
    Subject {
        id: 6,
        name: "Anjali Singh Indoliya",
        alias: None,
        gender: Gender::Female,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_with_alias() {
        assert_eq!(ROSTER[0].display_name(), "Dharmendra Singh Indoliya (DharMa)");
    }

    #[test]
    fn test_display_name_without_alias() {
        assert_eq!(ROSTER[1].display_name(), "Anuj Singh Indoliya");
    }

    #[test]
    fn test_roster_ids_are_stable_and_ordered() {
        for (i, subject) in ROSTER.iter().enumerate() {
            assert_eq!(subject.id, i as u32 + 1);
        }
    }

    #[test]
    fn test_gender_term() {
        assert_eq!(ROSTER[5].gender.to_string(), "female");
        assert_eq!(ROSTER[0].gender.to_string(), "male");
    }
}
