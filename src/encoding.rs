use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn label(self) -> &'static str {
        match self {
            Venue::Home => "home",
            Venue::Away => "away",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Venue::Home),
            "away" => Some(Venue::Away),
            _ => None,
        }
    }

    /// Home → 1, Away → 0.
    pub fn encoded(self) -> u8 {
        match self {
            Venue::Home => 1,
            Venue::Away => 0,
        }
    }
}

/// Result from the row's own team perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn from_goals(goals_for: i32, goals_against: i32) -> Self {
        if goals_for > goals_against {
            Outcome::Win
        } else if goals_for < goals_against {
            Outcome::Loss
        } else {
            Outcome::Draw
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Draw => "D",
            Outcome::Loss => "L",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "W" | "w" => Some(Outcome::Win),
            "D" | "d" => Some(Outcome::Draw),
            "L" | "l" => Some(Outcome::Loss),
            _ => None,
        }
    }

    /// W → 1, D → 0, L → 2. Downstream targets rely on this exact mapping.
    pub fn encoded(self) -> u8 {
        match self {
            Outcome::Win => 1,
            Outcome::Draw => 0,
            Outcome::Loss => 2,
        }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetWinner {
    Team,
    Opponent,
    Draw,
}

impl TargetWinner {
    pub fn from_goals(goals_for: i32, goals_against: i32) -> Self {
        match Outcome::from_goals(goals_for, goals_against) {
            Outcome::Win => TargetWinner::Team,
            Outcome::Loss => TargetWinner::Opponent,
            Outcome::Draw => TargetWinner::Draw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetWinner::Team => "team",
            TargetWinner::Opponent => "opponent",
            TargetWinner::Draw => "draw",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team" => Some(TargetWinner::Team),
            "opponent" => Some(TargetWinner::Opponent),
            "draw" => Some(TargetWinner::Draw),
            _ => None,
        }
    }

    /// team → 1, opponent → 2, draw → 0.
    pub fn encoded(self) -> u8 {
        match self {
            TargetWinner::Team => 1,
            TargetWinner::Opponent => 2,
            TargetWinner::Draw => 0,
        }
    }
}

/// Ordinal team vocabulary. Built over Team and Opponent together so a name
/// seen only as an opponent still gets an index; indices follow sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamEncoder {
    classes: Vec<String>,
}

impl TeamEncoder {
    pub fn fit<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<String> = names
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, name: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(name))
            .ok()
    }

    /// Case-insensitive, whitespace-trimmed exact lookup. Returns the stored
    /// spelling.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.classes
            .iter()
            .find(|class| class.to_lowercase() == wanted)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, TargetWinner, TeamEncoder, Venue};

    #[test]
    fn outcome_and_target_conventions_differ() {
        assert_eq!(Outcome::Win.encoded(), 1);
        assert_eq!(Outcome::Draw.encoded(), 0);
        assert_eq!(Outcome::Loss.encoded(), 2);
        assert_eq!(TargetWinner::Team.encoded(), 1);
        assert_eq!(TargetWinner::Opponent.encoded(), 2);
        assert_eq!(TargetWinner::Draw.encoded(), 0);
        assert_eq!(Venue::from_label("Home").map(Venue::encoded), Some(1));
        assert_eq!(Venue::from_label("away").map(Venue::encoded), Some(0));
    }

    #[test]
    fn encoder_spans_teams_and_opponents() {
        let enc = TeamEncoder::fit(["Rapid", "Steaua", "CFR", "Rapid"]);
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.encode("CFR"), Some(0));
        assert_eq!(enc.encode("Steaua"), Some(2));
        assert_eq!(enc.resolve("  rapid "), Some("Rapid"));
        assert_eq!(enc.resolve("Dinamo"), None);
    }
}
