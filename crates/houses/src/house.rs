use serde::{Deserialize, Serialize};

use westeros_core::{CharacterId, DomainError, DomainResult, HouseId};

/// Writable fields of a house (create and full replace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseData {
    pub name: String,
    #[serde(default)]
    pub words: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl HouseData {
    /// Names are the natural key used in URLs, so they must be non-blank.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("house name cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub name: String,
    pub words: Option<String>,
    pub description: Option<String>,
    pub members: Vec<Character>,
}

impl House {
    pub fn from_data(id: HouseId, data: HouseData) -> Self {
        Self {
            id,
            name: data.name,
            words: data.words,
            description: data.description,
            members: Vec::new(),
        }
    }

    /// Replace the writable fields, keeping id and members.
    pub fn apply(&mut self, data: HouseData) {
        self.name = data.name;
        self.words = data.words;
        self.description = data.description;
    }
}

/// Writable fields of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    pub name: String,
    #[serde(default)]
    pub titles: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CharacterData {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("character name cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub titles: Option<String>,
    pub description: Option<String>,
    pub house_id: HouseId,
}

impl Character {
    pub fn from_data(id: CharacterId, house_id: HouseId, data: CharacterData) -> Self {
        Self {
            id,
            name: data.name,
            titles: data.titles,
            description: data.description,
            house_id,
        }
    }
}
