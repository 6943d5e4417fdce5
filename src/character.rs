use crate::roster::{Gender, Subject};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CharacterClass {
    Monarch,
    Assassin,
    Mage,
    Healer,
    Tank,
    Ranger,
    Fighter,
    Summoner,
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CharacterClass::Monarch => "Monarch",
            CharacterClass::Assassin => "Assassin",
            CharacterClass::Mage => "Mage",
            CharacterClass::Healer => "Healer",
            CharacterClass::Tank => "Tank",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Summoner => "Summoner",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "S-Rank")]
    S,
    #[serde(rename = "A-Rank")]
    A,
    #[serde(rename = "B-Rank")]
    B,
    #[serde(rename = "C-Rank")]
    C,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rank::S => "S-Rank",
            Rank::A => "A-Rank",
            Rank::B => "B-Rank",
            Rank::C => "C-Rank",
        };
        write!(f, "{}", name)
    }
}

/// One generated profile from the text stage. Matched to a subject by
/// substring containment of the subject's name within `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub name: String,
    pub title: String,
    pub description: String,
    pub class: CharacterClass,
    pub rank: Rank,
    pub quote: String,
}

/// The evolving record for one subject: identity fields at creation, profile
/// fields after the text stage, `image_url` after the portrait stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCharacter {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<CharacterClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EnrichedCharacter {
    pub fn from_subject(subject: &Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name.to_string(),
            alias: subject.alias.map(str::to_string),
            gender: subject.gender,
            title: None,
            description: None,
            class: None,
            rank: None,
            quote: None,
            image_url: None,
        }
    }

    /// True once the text stage matched a profile onto this record. The
    /// profile fields are set all together or not at all.
    pub fn has_profile(&self) -> bool {
        self.title.is_some()
    }

    fn apply_profile(&mut self, profile: &ProfileAttributes) {
        self.name = profile.name.clone();
        self.title = Some(profile.title.clone());
        self.description = Some(profile.description.clone());
        self.class = Some(profile.class);
        self.rank = Some(profile.rank);
        self.quote = Some(profile.quote.clone());
    }
}

/// Merge text-stage profiles into the roster. Each subject takes the first
/// profile whose `name` contains the subject's name as a substring; a subject
/// with no match keeps its profile fields absent. Output length and id order
/// always equal the roster, whatever order the profiles arrived in.
pub fn merge_profiles(roster: &[Subject], profiles: &[ProfileAttributes]) -> Vec<EnrichedCharacter> {
    roster
        .iter()
        .map(|subject| {
            let mut character = EnrichedCharacter::from_subject(subject);
            if let Some(profile) = profiles.iter().find(|p| p.name.contains(subject.name)) {
                character.apply_profile(profile);
            }
            character
        })
        .collect()
}

/// Merge portrait payloads in, index-aligned with the character sequence.
/// Only called once every portrait request succeeded.
pub fn merge_portraits(characters: &mut [EnrichedCharacter], images: Vec<String>) {
    for (character, image) in characters.iter_mut().zip(images) {
        character.image_url = Some(format!("data:image/jpeg;base64,{}", image));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::ROSTER;

    fn profile_for(name: &str, rank: Rank) -> ProfileAttributes {
        ProfileAttributes {
            name: format!("{} the Awakened", name),
            title: "The Shadow Monarch".to_string(),
            description: "Commands the fallen.".to_string(),
            class: CharacterClass::Monarch,
            rank,
            quote: "Arise.".to_string(),
        }
    }

    #[test]
    fn test_merge_matches_by_substring() {
        let profiles: Vec<ProfileAttributes> = ROSTER
            .iter()
            .map(|s| profile_for(s.name, Rank::A))
            .collect();

        let characters = merge_profiles(ROSTER, &profiles);
        assert_eq!(characters.len(), ROSTER.len());
        assert!(characters.iter().all(|c| c.has_profile()));
        assert_eq!(characters[0].name, "Dharmendra Singh Indoliya the Awakened");
    }

    #[test]
    fn test_merge_first_match_wins() {
        let mut first = profile_for(ROSTER[0].name, Rank::S);
        first.title = "First".to_string();
        let mut second = profile_for(ROSTER[0].name, Rank::C);
        second.title = "Second".to_string();

        let characters = merge_profiles(&ROSTER[..1], &[first, second]);
        assert_eq!(characters[0].title.as_deref(), Some("First"));
        assert_eq!(characters[0].rank, Some(Rank::S));
    }

    #[test]
    fn test_merge_miss_leaves_profile_absent() {
        let profiles = vec![profile_for("Nobody In Particular", Rank::B)];
        let characters = merge_profiles(&ROSTER[..2], &profiles);

        assert_eq!(characters.len(), 2);
        assert!(!characters[0].has_profile());
        assert!(characters[0].description.is_none());
        assert!(characters[0].class.is_none());
        assert!(characters[0].rank.is_none());
        assert!(characters[0].quote.is_none());
        // Identity survives untouched.
        assert_eq!(characters[0].name, ROSTER[0].name);
        assert_eq!(characters[0].id, 1);
    }

    #[test]
    fn test_merge_preserves_roster_order_despite_shuffled_response() {
        let mut profiles: Vec<ProfileAttributes> = ROSTER
            .iter()
            .map(|s| profile_for(s.name, Rank::B))
            .collect();
        profiles.reverse();

        let characters = merge_profiles(ROSTER, &profiles);
        for (subject, character) in ROSTER.iter().zip(&characters) {
            assert_eq!(character.id, subject.id);
            assert!(character.name.contains(subject.name));
        }
    }

    #[test]
    fn test_merge_is_deterministic() {
        let profiles: Vec<ProfileAttributes> = ROSTER
            .iter()
            .take(4)
            .map(|s| profile_for(s.name, Rank::C))
            .collect();

        let first = merge_profiles(ROSTER, &profiles);
        let second = merge_profiles(ROSTER, &profiles);
        assert_eq!(first, second);
    }

    #[test]
    fn test_full_batch_scenario_keeps_one_s_rank() {
        let profiles: Vec<ProfileAttributes> = ROSTER
            .iter()
            .enumerate()
            .map(|(i, s)| profile_for(s.name, if i == 0 { Rank::S } else { Rank::B }))
            .collect();

        let characters = merge_profiles(ROSTER, &profiles);
        assert_eq!(characters.len(), 6);
        assert!(characters.iter().all(|c| c.has_profile()));
        assert!(characters.iter().any(|c| c.rank == Some(Rank::S)));
    }

    #[test]
    fn test_merge_portraits_index_aligned() {
        let mut characters = merge_profiles(ROSTER, &[]);
        let images: Vec<String> = (0..characters.len()).map(|i| format!("img{}", i)).collect();

        merge_portraits(&mut characters, images);
        for (i, character) in characters.iter().enumerate() {
            assert_eq!(
                character.image_url.as_deref(),
                Some(format!("data:image/jpeg;base64,img{}", i).as_str())
            );
        }
    }

    #[test]
    fn test_wire_forms() {
        let json = r#"{
            "name": "Anjali Singh Indoliya, Blade of Dusk",
            "title": "Sovereign of Plagues",
            "description": "Her touch withers armies.",
            "class": "ASSASSIN",
            "rank": "S-Rank",
            "quote": "None escape my gaze."
        }"#;

        let profile: ProfileAttributes = serde_json::from_str(json).unwrap();
        assert_eq!(profile.class, CharacterClass::Assassin);
        assert_eq!(profile.rank, Rank::S);

        let round = serde_json::to_value(&profile).unwrap();
        assert_eq!(round["class"], "ASSASSIN");
        assert_eq!(round["rank"], "S-Rank");
    }

    #[test]
    fn test_character_serialization_omits_absent_fields() {
        let character = EnrichedCharacter::from_subject(&ROSTER[1]);
        let value = serde_json::to_value(&character).unwrap();

        assert_eq!(value["id"], 2);
        assert_eq!(value["gender"], "male");
        assert!(value.get("alias").is_none());
        assert!(value.get("title").is_none());
        assert!(value.get("imageUrl").is_none());
    }
}
