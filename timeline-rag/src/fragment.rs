//! Turns a [`WorkRecord`] into a flat list of retrievable [`Fragment`]s.

use serde::{Deserialize, Serialize};

use crate::document::{Fragment, FragmentMetadata, Section};
use crate::record::{Accomplishment, WorkRecord};

/// What goes into an accomplishment fragment's `content`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FragmentContent {
    /// Only the accomplishment context.
    Context,
    /// `"{headline}: {context}"`, which gives the embedding a denser signal.
    #[default]
    HeadlineAndContext,
}

/// Builds fragments from a work record.
///
/// Produces one fragment per accomplishment, in record order, optionally
/// followed by one fragment per responsibility. Building is pure: the same
/// record always yields the same fragments.
///
/// # Example
///
/// ```rust,ignore
/// use timeline_rag::{FragmentBuilder, FragmentContent};
///
/// let fragments = FragmentBuilder::new()
///     .content(FragmentContent::Context)
///     .include_responsibilities(true)
///     .build(&record);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentBuilder {
    content: FragmentContent,
    include_responsibilities: bool,
}

impl FragmentBuilder {
    /// Create a builder with default settings (headline-prefixed content, no responsibilities).
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how accomplishment content is rendered.
    pub fn content(mut self, content: FragmentContent) -> Self {
        self.content = content;
        self
    }

    /// Also emit a `responsibilities` fragment for each responsibility line.
    pub fn include_responsibilities(mut self, include: bool) -> Self {
        self.include_responsibilities = include;
        self
    }

    /// Build the fragment list for `record`.
    pub fn build(&self, record: &WorkRecord) -> Vec<Fragment> {
        let mut fragments: Vec<Fragment> = record
            .accomplishments
            .iter()
            .map(|accomplishment| Fragment {
                content: self.render(accomplishment),
                metadata: FragmentMetadata {
                    headline: accomplishment.headline.clone(),
                    skills: accomplishment.skills.clone(),
                    ..base_metadata(record, Section::Accomplishments)
                },
            })
            .collect();

        if self.include_responsibilities {
            fragments.extend(
                record
                    .responsibilities
                    .iter()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| Fragment {
                        content: line.clone(),
                        metadata: base_metadata(record, Section::Responsibilities),
                    }),
            );
        }

        fragments
    }

    fn render(&self, accomplishment: &Accomplishment) -> String {
        // A blank context falls back to the headline so the fragment stays embeddable.
        if accomplishment.context.trim().is_empty() {
            return accomplishment.headline.clone();
        }
        match self.content {
            FragmentContent::Context => accomplishment.context.clone(),
            FragmentContent::HeadlineAndContext => {
                format!("{}: {}", accomplishment.headline, accomplishment.context)
            }
        }
    }
}

fn base_metadata(record: &WorkRecord, section: Section) -> FragmentMetadata {
    FragmentMetadata {
        company: record.company.clone(),
        job_title: record.job_title.clone(),
        start_date: record.start_date.clone(),
        end_date: record.end_date.clone(),
        headline: String::new(),
        skills: Vec::new(),
        section,
    }
}

/// Build fragments with the default [`FragmentBuilder`] settings.
pub fn build_fragments(record: &WorkRecord) -> Vec<Fragment> {
    FragmentBuilder::new().build(record)
}
