//! The structured work-history entry a chat session answers questions about.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A single job entry: where, when, what the role covered and what was achieved.
///
/// Records are supplied by the caller and treated as immutable for the lifetime
/// of a chat session. A different record means a different session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    /// Employer name.
    pub company: String,
    /// Title held during the role.
    pub job_title: String,
    /// Free-form start date as entered by the user.
    pub start_date: String,
    /// Free-form end date. Empty while the role is ongoing.
    #[serde(default)]
    pub end_date: String,
    /// Day-to-day responsibilities, in the order they were entered.
    #[serde(default, alias = "description")]
    pub responsibilities: Vec<String>,
    /// Accomplishments, in the order they were entered.
    #[serde(default)]
    pub accomplishments: Vec<Accomplishment>,
}

/// One accomplishment within a [`WorkRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Accomplishment {
    /// Short title, e.g. "Led migration".
    pub headline: String,
    /// The full story behind the headline. This is the primary answerable content.
    pub context: String,
    /// Skills exercised.
    ///
    /// Accepts either a list or the free-text form the editor stores
    /// (`"SQL, planning; Rust"`), which is split with [`Accomplishment::parse_skills`].
    #[serde(default, deserialize_with = "deserialize_skills")]
    pub skills: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillsField {
    Text(String),
    List(Vec<String>),
}

fn deserialize_skills<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<SkillsField>::deserialize(deserializer)? {
        Some(SkillsField::Text(raw)) => Accomplishment::parse_skills(&raw),
        Some(SkillsField::List(skills)) => skills,
        None => Vec::new(),
    })
}

impl Accomplishment {
    /// Create an accomplishment from its parts.
    pub fn new(
        headline: impl Into<String>,
        context: impl Into<String>,
        skills: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            headline: headline.into(),
            context: context.into(),
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a free-text skills field such as `"SQL, planning; Rust"` into a list.
    ///
    /// Both `,` and `;` separate entries. Entries are trimmed and empty ones dropped.
    pub fn parse_skills(raw: &str) -> Vec<String> {
        raw.split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl WorkRecord {
    /// Whether the role is still held (no end date given).
    pub fn is_ongoing(&self) -> bool {
        self.end_date.trim().is_empty()
    }

    /// A stable content hash identifying this exact record.
    ///
    /// Two records with identical field values share a fingerprint; any edit to
    /// any field produces a different one. Used to key derived indices.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |value: &str| {
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        };

        field(&self.company);
        field(&self.job_title);
        field(&self.start_date);
        field(&self.end_date);
        field(&self.responsibilities.len().to_string());
        for responsibility in &self.responsibilities {
            field(responsibility);
        }
        field(&self.accomplishments.len().to_string());
        for accomplishment in &self.accomplishments {
            field(&accomplishment.headline);
            field(&accomplishment.context);
            field(&accomplishment.skills.len().to_string());
            for skill in &accomplishment.skills {
                field(skill);
            }
        }

        format!("{:x}", hasher.finalize())
    }
}
