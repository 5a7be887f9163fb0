//! Caller-supplied context: output language and the user's own history.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language for generated text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English.
    #[default]
    #[serde(rename = "EN", alias = "en")]
    En,
    /// Simplified Chinese.
    #[serde(rename = "CN", alias = "cn")]
    Cn,
}

impl Language {
    /// Picks the English or Chinese variant of a string.
    #[must_use]
    pub const fn pick<'a>(self, en: &'a str, cn: &'a str) -> &'a str {
        match self {
            Self::En => en,
            Self::Cn => cn,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pick("EN", "CN"))
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EN" => Ok(Self::En),
            "CN" => Ok(Self::Cn),
            other => Err(format!("unknown language '{other}' (expected EN or CN)")),
        }
    }
}

/// The parts of a user profile the calibrator reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Free-text skincare goals, e.g. `"minimize pores"`.
    #[serde(default)]
    pub goals: Vec<String>,
}

impl ProfileSummary {
    /// Whether any goal mentions one of `needles` (case-insensitive).
    #[must_use]
    pub fn has_goal_matching(&self, needles: &[&str]) -> bool {
        self.goals.iter().any(|goal| {
            let goal = goal.to_lowercase();
            needles.iter().any(|needle| goal.contains(needle))
        })
    }
}

/// One self-reported daily log, scored 0-5 per issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentLog {
    /// Self-reported acne level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acne: Option<f64>,
    /// Self-reported redness level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redness: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("cn".parse::<Language>(), Ok(Language::Cn));
        assert_eq!(" EN ".parse::<Language>(), Ok(Language::En));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Cn).unwrap(), "\"CN\"");
        let lang: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(lang, Language::En);
    }

    #[test]
    fn test_goal_matching_is_case_insensitive() {
        let profile = ProfileSummary {
            goals: vec!["Fade Dark Spots".to_string()],
        };
        assert!(profile.has_goal_matching(&["dark", "pigment"]));
        assert!(!profile.has_goal_matching(&["pores"]));
    }
}
