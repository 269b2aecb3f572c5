//! The named, timestamped, identified shape shared by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::SealedField;
use crate::error::{Result, StrongboxError};

/// Cleartext base fields of an entity.
///
/// The id never changes after creation; every setter bumps `last_edited`,
/// which never falls behind `created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordParts")]
pub struct Record {
    name: String,
    description: String,
    icon_name: String,
    created: DateTime<Utc>,
    last_edited: DateTime<Utc>,
    id: Uuid,
}

#[derive(Deserialize)]
struct RecordParts {
    name: String,
    description: String,
    icon_name: String,
    created: DateTime<Utc>,
    last_edited: DateTime<Utc>,
    id: Uuid,
}

impl TryFrom<RecordParts> for Record {
    type Error = StrongboxError;

    fn try_from(parts: RecordParts) -> Result<Self> {
        Record::from_parts(
            parts.name,
            parts.description,
            parts.icon_name,
            parts.created,
            parts.last_edited,
            parts.id,
        )
    }
}

impl Record {
    /// New record stamped now, with a fresh v4 id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            icon_name: String::new(),
            created: now,
            last_edited: now,
            id: Uuid::new_v4(),
        }
    }

    /// Rebuild a record from stored parts.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `created` is later than `last_edited`.
    pub fn from_parts(
        name: String,
        description: String,
        icon_name: String,
        created: DateTime<Utc>,
        last_edited: DateTime<Utc>,
        id: Uuid,
    ) -> Result<Self> {
        if created > last_edited {
            return Err(StrongboxError::InvalidInput(format!(
                "Record {} was edited ({}) before it was created ({})",
                id, last_edited, created
            )));
        }
        Ok(Self {
            name,
            description,
            icon_name,
            created,
            last_edited,
            id,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon_name(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = icon_name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn last_edited(&self) -> DateTime<Utc> {
        self.last_edited
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn set_icon_name(&mut self, icon_name: impl Into<String>) {
        self.icon_name = icon_name.into();
        self.touch();
    }

    /// Mark the record as edited now.
    pub fn touch(&mut self) {
        self.last_edited = Utc::now().max(self.created);
    }
}

/// Encrypted base fields: every field, the id included, is a sealed blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub name: SealedField,
    pub description: SealedField,
    pub icon_name: SealedField,
    pub created: SealedField,
    pub last_edited: SealedField,
    pub id: SealedField,
}

impl SealedRecord {
    pub(crate) fn fields(&self) -> [&SealedField; 6] {
        [
            &self.name,
            &self.description,
            &self.icon_name,
            &self.created,
            &self.last_edited,
            &self.id,
        ]
    }

    pub(crate) fn fields_mut(&mut self) -> [&mut SealedField; 6] {
        [
            &mut self.name,
            &mut self.description,
            &mut self.icon_name,
            &mut self.created,
            &mut self.last_edited,
            &mut self.id,
        ]
    }
}
