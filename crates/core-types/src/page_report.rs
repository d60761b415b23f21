/// First-5/first-10/first-10 non-empty heading texts, per the Content
/// Extractor's fixed policy. The caps are stability policy, not a default.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
}

/// One `th -> td` row of a Wikipedia-style infobox.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct InfoboxRow {
    pub label: String,
    pub value: String,
}

/// Typed summary of a loaded page emitted by the Content Extractor.
/// `infobox`/`table_of_contents`/`key_paragraphs` are populated only for
/// reference-style sites (Wikipedia and friends).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageReport {
    pub title: String,
    pub url: String,
    pub content_preview: String,
    pub meta_description: String,
    pub headings: Headings,
    pub publication_date: Option<String>,
    pub author: Option<String>,
    pub key_points: Vec<String>,
    pub summary: Option<String>,
    pub infobox: Option<Vec<InfoboxRow>>,
    pub table_of_contents: Option<Vec<String>>,
    pub key_paragraphs: Option<Vec<String>>,
    pub issues: Vec<String>,
    pub content_length: usize,
}

impl PageReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
