use regex::Regex;

use crate::extract::{ExtractError, ExtractStrategy, Extraction, SourceDocument, ITEM_LINE_PATTERN};
use crate::models::{Category, Item, WeatherEntry};

/// Weather section header in the free-text layout.
const WEATHER_HEADER: &str = "WEATHER";

/// Subcategory headings. Cosmetics split their section into crates and
/// loose items; each list belongs to whichever category was active when
/// the heading appeared and folds back into it after the scan.
const SUBCATEGORY_HEADERS: [&str; 2] = ["CRATES", "ITEMS"];

/// Known weather conditions, longest first so compound names win over their
/// substrings.
const WEATHER_CONDITIONS: [&str; 12] = [
    "Working Bee Swarm",
    "Meteor Shower",
    "Bee Swarm",
    "Thunderstorm",
    "Blood Moon",
    "Sandstorm",
    "Heatwave",
    "Frost",
    "Windy",
    "Night",
    "Snow",
    "Rain",
];

/// Fallback extraction for the older free-text page layout: a finite-state
/// scan over ordered, trimmed lines. Headers switch the active category,
/// item lines match "name x<digits>", and everything else is ignored.
pub struct LineScanStrategy {
    item_re: Regex,
    time_re: Regex,
    recent_marker_re: Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    None,
    Stock(Category),
    Weather,
}

impl LineScanStrategy {
    pub fn new() -> Self {
        LineScanStrategy {
            item_re: Regex::new(ITEM_LINE_PATTERN).unwrap(),
            time_re: Regex::new(r"(?i)\b(?:ago|mins?|minutes?|hours?)\b").unwrap(),
            recent_marker_re: Regex::new(r"(?i)most\s+recent").unwrap(),
        }
    }

    fn is_subcategory_header(normalized: &str) -> bool {
        SUBCATEGORY_HEADERS.contains(&normalized)
    }

    fn match_condition(line: &str) -> Option<&'static str> {
        let upper = line.to_uppercase();
        WEATHER_CONDITIONS
            .iter()
            .find(|c| upper.contains(&c.to_uppercase()))
            .copied()
    }

    /// Parse one candidate item line. Lines without a parsable quantity
    /// never contribute an item.
    fn parse_item(&self, line: &str) -> Option<Item> {
        let captures = self.item_re.captures(line.trim())?;
        let quantity = captures.name("qty")?.as_str().parse::<u32>().ok()?;
        let name = captures.name("name")?.as_str().trim();
        if name.is_empty() {
            return None;
        }
        Some(Item::new(name, quantity))
    }
}

impl Default for LineScanStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractStrategy for LineScanStrategy {
    fn name(&self) -> &'static str {
        "line-scan"
    }

    fn extract(&self, doc: &SourceDocument) -> Result<Extraction, ExtractError> {
        let lines = doc.lines();
        let mut extraction = Extraction::empty();

        let mut context = Context::None;
        // Subcategory lists are kept aside and folded into their owning
        // category once the scan finishes, in encounter order.
        let mut sub_lists: Vec<(Category, Vec<Item>)> = Vec::new();
        let mut active_sub: Option<usize> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].as_str();
            let normalized = line.to_uppercase();

            // Header matches take priority over any item interpretation.
            if normalized == WEATHER_HEADER {
                context = Context::Weather;
                active_sub = None;
                i += 1;
                continue;
            }
            if let Some(category) = Category::from_header(line) {
                context = Context::Stock(category);
                active_sub = None;
                i += 1;
                continue;
            }
            if Self::is_subcategory_header(&normalized) {
                // A subcategory only opens inside a stock section; elsewhere
                // the token is noise.
                if let Context::Stock(owner) = context {
                    sub_lists.push((owner, Vec::new()));
                    active_sub = Some(sub_lists.len() - 1);
                }
                i += 1;
                continue;
            }

            match context {
                Context::Weather => {
                    if let Some(condition) = Self::match_condition(line) {
                        let next = lines.get(i + 1).map(String::as_str);
                        if next.is_some_and(|n| self.recent_marker_re.is_match(n)) {
                            // First marked condition wins.
                            extraction
                                .weather
                                .current
                                .get_or_insert_with(|| condition.to_string());
                            i += 2;
                            continue;
                        }
                        if next.is_some_and(|n| self.time_re.is_match(n)) {
                            extraction.weather.recent.push(WeatherEntry {
                                condition: condition.to_string(),
                                time: next.map(str::to_string),
                            });
                            i += 2;
                            continue;
                        }
                        extraction.weather.recent.push(WeatherEntry {
                            condition: condition.to_string(),
                            time: None,
                        });
                    }
                }
                Context::Stock(category) => {
                    if let Some(item) = self.parse_item(line) {
                        match active_sub {
                            Some(index) => sub_lists[index].1.push(item),
                            None => extraction.snapshot.push(category, item),
                        }
                    }
                }
                Context::None => {}
            }
            i += 1;
        }

        for (owner, items) in sub_lists {
            extraction.snapshot.extend(owner, items);
        }

        Ok(extraction)
    }
}
