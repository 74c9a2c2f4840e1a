use crate::adapters::directory::html::{self, Element, Selector};
use crate::domain::model::{DirectoryListing, ProfessorRecord, SkippedCard};
use crate::domain::ports::{DirectoryAdapter, PageRenderer};
use crate::utils::error::{DirectoryError, MatcherError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Research text used when a card's research block is present but empty.
pub const EMPTY_RESEARCH_PLACEHOLDER: &str = "N/A";

/// Where a card-based directory keeps each field.
///
/// Defaults describe the faculty directory at
/// <https://www.cse.iitb.ac.in/people/faculty>.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLayout {
    pub card: String,
    pub name: String,
    pub link: String,
    pub research: String,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            card: "div.faculty-card".to_string(),
            name: "h3.faculty-name".to_string(),
            link: "div.faculty-info a".to_string(),
            research: "div.faculty-research-interests".to_string(),
        }
    }
}

impl CardLayout {
    pub fn validate(&self) -> Result<(), MatcherError> {
        self.compile().map(|_| ())
    }

    fn compile(&self) -> Result<CompiledLayout, MatcherError> {
        let parse = |field: &str, value: &str| {
            Selector::parse(value).map_err(|reason| MatcherError::InvalidConfigValue {
                field: format!("layout.{}", field),
                value: value.to_string(),
                reason,
            })
        };

        Ok(CompiledLayout {
            card: parse("card", &self.card)?,
            name: parse("name", &self.name)?,
            link: parse("link", &self.link)?,
            research: parse("research", &self.research)?,
        })
    }
}

#[derive(Debug, Clone)]
struct CompiledLayout {
    card: Selector,
    name: Selector,
    link: Selector,
    research: Selector,
}

/// Directory adapter for sites that list one professor per repeated card element.
pub struct CardDirectoryAdapter {
    name: String,
    layout: CompiledLayout,
    renderer: Arc<dyn PageRenderer>,
}

impl CardDirectoryAdapter {
    pub fn new(
        name: impl Into<String>,
        layout: &CardLayout,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self, MatcherError> {
        Ok(Self {
            name: name.into(),
            layout: layout.compile()?,
            renderer,
        })
    }

    /// Extracts records from rendered markup, keeping document order.
    pub fn extract_listing(
        &self,
        page: &str,
        directory_url: &Url,
    ) -> Result<DirectoryListing, DirectoryError> {
        let rendered = html::strip_non_rendered(page);
        let cards = html::select(&rendered, &self.layout.card);
        tracing::info!("Found {} professor elements.", cards.len());

        if cards.is_empty() {
            return Err(DirectoryError::NoRecordsFound {
                url: directory_url.to_string(),
            });
        }

        let mut listing = DirectoryListing::default();
        for (position, card) in cards.iter().enumerate() {
            match self.extract_card(card, directory_url) {
                Ok(record) => listing.records.push(record),
                Err(reason) => {
                    tracing::warn!("Could not parse professor element #{}: {}", position + 1, reason);
                    listing.skipped.push(SkippedCard { position, reason });
                }
            }
        }

        tracing::info!("Successfully parsed {} professors.", listing.records.len());
        Ok(listing)
    }

    fn extract_card(&self, card: &Element<'_>, directory_url: &Url) -> Result<ProfessorRecord, String> {
        let name = card
            .select_first(&self.layout.name)
            .map(|e| e.text())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| "missing professor name".to_string())?;

        let href = card
            .select_first(&self.layout.link)
            .and_then(|e| e.attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .ok_or_else(|| format!("missing profile link for {}", name))?;

        let profile_url = directory_url
            .join(&href)
            .map_err(|e| format!("invalid profile link '{}' for {}: {}", href, name, e))?;

        let research = card
            .select_first(&self.layout.research)
            .map(|e| e.text())
            .ok_or_else(|| format!("missing research interests for {}", name))?;
        let research = if research.is_empty() {
            EMPTY_RESEARCH_PLACEHOLDER.to_string()
        } else {
            research
        };

        ProfessorRecord::new(name, profile_url.to_string(), research)
    }
}

#[async_trait]
impl DirectoryAdapter for CardDirectoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, directory_url: &Url) -> Result<DirectoryListing, DirectoryError> {
        tracing::info!("Scraping directory: {}...", directory_url);

        let mut session = self.renderer.open().await?;
        let loaded = session.load(directory_url).await;
        session.close().await;

        let page = loaded?;
        self.extract_listing(&page, directory_url)
    }
}
