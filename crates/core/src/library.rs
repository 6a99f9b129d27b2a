use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::access::LibraryAccess;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("no prompt template with id {0}")]
    NotFound(String),

    #[error("copying templates requires premium access")]
    PremiumRequired,

    #[error("unknown prompt category: {0}")]
    UnknownCategory(String),
}

//
// ─── TEMPLATES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptCategory {
    Marketing,
    Coding,
    Business,
    Writing,
    Productivity,
    ImageGen,
}

impl PromptCategory {
    pub const ALL: [PromptCategory; 6] = [
        PromptCategory::Marketing,
        PromptCategory::Coding,
        PromptCategory::Business,
        PromptCategory::Writing,
        PromptCategory::Productivity,
        PromptCategory::ImageGen,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PromptCategory::Marketing => "Marketing",
            PromptCategory::Coding => "Coding",
            PromptCategory::Business => "Business",
            PromptCategory::Writing => "Writing",
            PromptCategory::Productivity => "Productivity",
            PromptCategory::ImageGen => "Image Gen",
        }
    }
}

impl fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PromptCategory {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        PromptCategory::ALL
            .into_iter()
            .find(|category| category.label().replace(' ', "").to_lowercase() == wanted)
            .ok_or_else(|| LibraryError::UnknownCategory(s.to_string()))
    }
}

/// Reusable prompt with bracketed placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub category: PromptCategory,
    pub description: &'static str,
    pub content: &'static str,
    pub tags: &'static [&'static str],
}

impl PromptTemplate {
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

//
// ─── LIBRARY ───────────────────────────────────────────────────────────────────
//

/// Curated, read-only collection of prompt templates.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: &'static [PromptTemplate],
}

impl PromptLibrary {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            templates: &BUILTIN,
        }
    }

    #[must_use]
    pub fn templates(&self) -> &[PromptTemplate] {
        self.templates
    }

    /// Templates in `category` (or any) whose title, description or tags
    /// contain `query`, case-insensitively.
    #[must_use]
    pub fn filter(&self, category: Option<PromptCategory>, query: &str) -> Vec<&PromptTemplate> {
        let needle = query.trim().to_lowercase();
        self.templates
            .iter()
            .filter(|template| category.is_none_or(|wanted| template.category == wanted))
            .filter(|template| template.matches(&needle))
            .collect()
    }

    /// Template body for copying.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` for an unknown id and
    /// `LibraryError::PremiumRequired` when access is preview-only.
    pub fn copy(&self, id: &str, access: LibraryAccess) -> Result<&'static str, LibraryError> {
        let template = self
            .templates
            .iter()
            .find(|template| template.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        match access {
            LibraryAccess::Full => Ok(template.content),
            LibraryAccess::Preview => Err(LibraryError::PremiumRequired),
        }
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN: [PromptTemplate; 9] = [
    PromptTemplate {
        id: "m1",
        title: "Content Plan Generator",
        category: PromptCategory::Marketing,
        description: "A month of posts with topics and formats.",
        content: "You are a professional SMM strategist. Build a one-month content plan for [BRAND/PRODUCT]. Target audience: [AUDIENCE].\n\nRequirements:\n1. Format: table (Week, Day, Topic, Format (Reels/Post/Story), Idea).\n2. Alternate selling, entertaining and educational posts (20/40/40).\n3. Topics must be timely and shareable.",
        tags: &["SMM", "Strategy", "Planning"],
    },
    PromptTemplate {
        id: "m2",
        title: "AIDA Copywriting Framework",
        category: PromptCategory::Marketing,
        description: "Sales copy following the classic AIDA formula.",
        content: "You are an expert copywriter. Write sales copy for [PRODUCT] using AIDA (Attention, Interest, Desire, Action).\n\n- Attention: open with a provocative question.\n- Interest: cite facts or audience pain points.\n- Desire: show how the product solves the problem.\n- Action: a clear call to action.\n\nTone of voice: [TONE].",
        tags: &["Copywriting", "Sales", "Framework"],
    },
    PromptTemplate {
        id: "c1",
        title: "Explain Code Like I'm New",
        category: PromptCategory::Coding,
        description: "A plain-language walkthrough of tricky code.",
        content: "Explain step by step what this code does, as if I were ten years old. Use simple analogies. Finish with possible problems or optimisation opportunities.\n\nCode:\n```\n[PASTE CODE]\n```",
        tags: &["Learning", "Debugging"],
    },
    PromptTemplate {
        id: "c2",
        title: "Unit Test Generator",
        category: PromptCategory::Coding,
        description: "Test coverage for a single function.",
        content: "You are a senior QA engineer. Write unit tests for the function below using [TEST FRAMEWORK]. Cover happy paths, edge cases and error handling.\n\nFunction:\n```\n[PASTE CODE]\n```",
        tags: &["Testing", "QA", "Automation"],
    },
    PromptTemplate {
        id: "b1",
        title: "SWOT Analysis",
        category: PromptCategory::Business,
        description: "Strengths, weaknesses, opportunities and threats for an idea.",
        content: "Act as a strategy consultant. Produce a SWOT analysis for [BUSINESS IDEA] in [MARKET]. For each quadrant give 3-5 points and one recommended action. Finish with the single biggest risk.",
        tags: &["Strategy", "Analysis"],
    },
    PromptTemplate {
        id: "w1",
        title: "Story Outline",
        category: PromptCategory::Writing,
        description: "Three-act outline for a short story.",
        content: "You are a story editor. Outline a short story in [GENRE] about [PREMISE] using a three-act structure. For each act list the key scenes, the protagonist's goal and the turning point.",
        tags: &["Fiction", "Structure"],
    },
    PromptTemplate {
        id: "p1",
        title: "Weekly Planner",
        category: PromptCategory::Productivity,
        description: "Turns a task dump into a prioritised week.",
        content: "Here is everything on my plate: [TASK LIST]. My working hours are [HOURS]. Sort the tasks with the Eisenhower matrix, then schedule them across the week as a table (Day, Time block, Task). Flag anything I should delegate or drop.",
        tags: &["Planning", "Time management"],
    },
    PromptTemplate {
        id: "p2",
        title: "Meeting Summary",
        category: PromptCategory::Productivity,
        description: "Decisions and action items from raw notes.",
        content: "Summarise these meeting notes: [NOTES]. Output three sections: Decisions, Action items (owner, deadline), Open questions. Keep each bullet under 15 words.",
        tags: &["Meetings", "Notes"],
    },
    PromptTemplate {
        id: "i1",
        title: "Product Photo Scene",
        category: PromptCategory::ImageGen,
        description: "Studio-style product shot description.",
        content: "Professional product photo of [PRODUCT] on [SURFACE], [BACKGROUND] background, soft box lighting from the left, shallow depth of field, 85mm lens, high detail, commercial style.",
        tags: &["Photography", "E-commerce"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_by_category_and_query() {
        let library = PromptLibrary::builtin();
        let coding = library.filter(Some(PromptCategory::Coding), "");
        assert_eq!(coding.len(), 2);

        let testing = library.filter(None, "qa");
        assert_eq!(testing.len(), 1);
        assert_eq!(testing[0].id, "c2");

        let planning = library.filter(Some(PromptCategory::Productivity), "PLANNING");
        assert_eq!(planning.len(), 1);
        assert_eq!(planning[0].id, "p1");
    }

    #[test]
    fn copy_requires_full_access() {
        let library = PromptLibrary::builtin();
        assert!(library.copy("m1", LibraryAccess::Full).unwrap().contains("[BRAND/PRODUCT]"));
        assert_eq!(
            library.copy("m1", LibraryAccess::Preview).unwrap_err(),
            LibraryError::PremiumRequired
        );
        assert!(matches!(
            library.copy("zz", LibraryAccess::Full).unwrap_err(),
            LibraryError::NotFound(_)
        ));
    }

    #[test]
    fn categories_parse_loosely() {
        assert_eq!("image-gen".parse::<PromptCategory>().unwrap(), PromptCategory::ImageGen);
        assert_eq!("Marketing".parse::<PromptCategory>().unwrap(), PromptCategory::Marketing);
        assert!("cooking".parse::<PromptCategory>().is_err());
    }

    #[test]
    fn template_ids_are_unique() {
        let library = PromptLibrary::builtin();
        let mut ids: Vec<_> = library.templates().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), library.templates().len());
    }
}
