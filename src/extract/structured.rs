use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::extract::{ExtractError, ExtractStrategy, Extraction, SourceDocument, ITEM_LINE_PATTERN};
use crate::models::{Category, Item, WeatherEntry};

/// Extraction against the newer page layout, where each category lives in a
/// section with a stable element id and items are repeated `li.stock-item`
/// rows with name and quantity sub-elements.
pub struct StructuredStrategy {
    sections: Vec<(Category, Selector)>,
    weather_section: Selector,
    item_row: Selector,
    any_row: Selector,
    name_slot: Selector,
    quantity_slot: Selector,
    quantity_re: Regex,
    row_re: Regex,
}

impl StructuredStrategy {
    pub fn new() -> Self {
        let sections = Category::ALL
            .into_iter()
            .map(|c| {
                let selector = Selector::parse(&format!("#{}", c.section_id())).unwrap();
                (c, selector)
            })
            .collect();

        StructuredStrategy {
            sections,
            weather_section: Selector::parse("#weather").unwrap(),
            item_row: Selector::parse("li.stock-item").unwrap(),
            any_row: Selector::parse("li").unwrap(),
            name_slot: Selector::parse(".item-name").unwrap(),
            quantity_slot: Selector::parse(".item-quantity").unwrap(),
            quantity_re: Regex::new(r"(?i)x\s*(\d+)").unwrap(),
            row_re: Regex::new(ITEM_LINE_PATTERN).unwrap(),
        }
    }

    fn rows<'a>(&self, section: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let rows: Vec<_> = section.select(&self.item_row).collect();
        if rows.is_empty() {
            section.select(&self.any_row).collect()
        } else {
            rows
        }
    }

    fn slot_text(element: ElementRef<'_>) -> String {
        element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Read one stock row. Rows without a parsable quantity are dropped;
    /// quantities are never fabricated.
    fn parse_row(&self, row: ElementRef<'_>) -> Option<Item> {
        let name = row.select(&self.name_slot).next().map(Self::slot_text);
        let quantity_text = row.select(&self.quantity_slot).next().map(Self::slot_text);

        match (name, quantity_text) {
            (Some(name), Some(quantity_text)) if !name.is_empty() => {
                let quantity = self
                    .quantity_re
                    .captures(&quantity_text)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())?;
                Some(Item::new(name, quantity))
            }
            // Older markup kept "Name x<qty>" in one flat row.
            _ => {
                let text = Self::slot_text(row);
                let captures = self.row_re.captures(&text)?;
                let quantity = captures.name("qty")?.as_str().parse::<u32>().ok()?;
                Some(Item::new(captures.name("name")?.as_str().trim(), quantity))
            }
        }
    }
}

impl Default for StructuredStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, doc: &SourceDocument) -> Result<Extraction, ExtractError> {
        let html = doc.html();
        let mut extraction = Extraction::empty();

        for (category, selector) in &self.sections {
            // A missing section means an empty category, not an error.
            let Some(section) = html.select(selector).next() else {
                continue;
            };
            for row in self.rows(section) {
                if let Some(item) = self.parse_row(row) {
                    extraction.snapshot.push(*category, item);
                }
            }
        }

        if let Some(section) = html.select(&self.weather_section).next() {
            for row in self.rows(section) {
                let Some(condition) = row
                    .select(&self.name_slot)
                    .next()
                    .map(Self::slot_text)
                    .filter(|c| !c.is_empty())
                else {
                    continue;
                };
                let slot = row
                    .select(&self.quantity_slot)
                    .next()
                    .map(Self::slot_text)
                    .unwrap_or_default();

                if slot.to_lowercase().contains("most recent") {
                    // First marked condition wins if the page marks several.
                    extraction.weather.current.get_or_insert(condition);
                } else {
                    let time = if slot.is_empty() { None } else { Some(slot) };
                    extraction.weather.recent.push(WeatherEntry { condition, time });
                }
            }
        }

        Ok(extraction)
    }
}
