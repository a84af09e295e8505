use scraper::Html;
use thiserror::Error;

use crate::models::{StockSnapshot, WeatherState};

pub mod lines;
pub mod structured;

pub use lines::LineScanStrategy;
pub use structured::StructuredStrategy;

/// Anchored "name x<digits>" pattern shared by both strategies. The site has
/// used both a plain "x" and the multiplication sign as quantity markers.
pub(crate) const ITEM_LINE_PATTERN: &str = r"(?i)^(?P<name>.+?)\s*[x×]\s*(?P<qty>\d+)$";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("no extraction strategy recognized the document")]
    Unrecognized,
}

/// An already-fetched page, kept in raw form. Strategies ask for either a
/// parsed element tree or an ordered list of trimmed, non-empty text lines,
/// depending on which layout generation they target.
#[derive(Debug, Clone)]
pub enum SourceDocument {
    Bytes(Vec<u8>),
    Text(String),
}

impl SourceDocument {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SourceDocument::Bytes(bytes.into())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        SourceDocument::Text(text.into())
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            SourceDocument::Bytes(bytes) => String::from_utf8_lossy(bytes),
            SourceDocument::Text(text) => std::borrow::Cow::Borrowed(text),
        }
    }

    /// Parse the document as HTML. Plain text parses into a tree with a
    /// single text node, so this never fails.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.text())
    }

    /// Reduce the document to its visible text as an ordered list of trimmed,
    /// non-empty lines. Works for both HTML (text nodes) and plain text.
    pub fn lines(&self) -> Vec<String> {
        let html = self.html();
        let mut lines = Vec::new();
        for chunk in html.root_element().text() {
            for line in chunk.split('\n') {
                let line = line.trim();
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
            }
        }
        lines
    }
}

/// The result of one extraction run. A run that parses cleanly but finds
/// nothing is a valid result, distinguishable from "no data at all" via
/// [`Extraction::has_data`] so the scheduler can apply its retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub snapshot: StockSnapshot,
    pub weather: WeatherState,
}

impl Extraction {
    pub fn empty() -> Self {
        Self {
            snapshot: StockSnapshot::empty(),
            weather: WeatherState::default(),
        }
    }

    pub fn total_items(&self) -> usize {
        self.snapshot.total_items()
    }

    pub fn has_data(&self) -> bool {
        self.total_items() > 0 || !self.weather.is_empty()
    }
}

/// One way of reading the page. Strategies are tried in order by the
/// pipeline; each must be a pure function of the document.
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, doc: &SourceDocument) -> Result<Extraction, ExtractError>;
}

/// Ordered strategy list: structured lookup against known section ids first,
/// then the line-scan heuristic for the older free-text layout. The first
/// strategy that yields data wins; if every strategy parses but none finds
/// anything, the empty extraction is returned as a success.
pub struct ExtractPipeline {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl ExtractPipeline {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(StructuredStrategy::new()),
                Box::new(LineScanStrategy::new()),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn extract(&self, doc: &SourceDocument) -> Result<Extraction, ExtractError> {
        if doc.text().trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let mut last_empty: Option<Extraction> = None;

        for strategy in &self.strategies {
            match strategy.extract(doc) {
                Ok(extraction) if extraction.has_data() => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        items = extraction.total_items(),
                        "extraction strategy produced data"
                    );
                    return Ok(extraction);
                }
                Ok(extraction) => {
                    tracing::debug!(strategy = strategy.name(), "extraction strategy found nothing");
                    last_empty = Some(extraction);
                }
                Err(e) => {
                    tracing::debug!(strategy = strategy.name(), error = %e, "extraction strategy failed");
                }
            }
        }

        last_empty.ok_or(ExtractError::Unrecognized)
    }
}

impl Default for ExtractPipeline {
    fn default() -> Self {
        Self::new()
    }
}
