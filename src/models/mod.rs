use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of shop categories. Labels encountered during extraction
/// that do not resolve to one of these are ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Seeds,
    Gears,
    Eggs,
    EventShop,
    Cosmetics,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Seeds,
        Category::Gears,
        Category::Eggs,
        Category::EventShop,
        Category::Cosmetics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Seeds => "SEEDS",
            Category::Gears => "GEARS",
            Category::Eggs => "EGGS",
            Category::EventShop => "EVENT_SHOP",
            Category::Cosmetics => "COSMETICS",
        }
    }

    /// Header tokens that denote this category in the free-text page layout.
    /// The site has used both bare names and "<NAME> STOCK" headings; the
    /// event shop section was historically headed "HONEY STOCK".
    pub fn header_aliases(&self) -> &'static [&'static str] {
        match self {
            Category::Seeds => &["SEEDS", "SEEDS STOCK", "SEED STOCK"],
            Category::Gears => &["GEARS", "GEAR STOCK", "GEARS STOCK"],
            Category::Eggs => &["EGGS", "EGG STOCK", "EGGS STOCK"],
            Category::EventShop => &[
                "EVENT_SHOP",
                "EVENT SHOP",
                "EVENT SHOP STOCK",
                "EVENT STOCK",
                "HONEY STOCK",
            ],
            Category::Cosmetics => &["COSMETICS", "COSMETICS STOCK", "COSMETIC STOCK"],
        }
    }

    /// Element id of this category's section in the structured page layout.
    pub fn section_id(&self) -> &'static str {
        match self {
            Category::Seeds => "seeds-stock",
            Category::Gears => "gear-stock",
            Category::Eggs => "egg-stock",
            Category::EventShop => "event-shop-stock",
            Category::Cosmetics => "cosmetics-stock",
        }
    }

    /// Resolve a normalized header line to a category, if it matches exactly.
    pub fn from_header(line: &str) -> Option<Category> {
        let normalized = line.trim().to_uppercase();
        Category::ALL
            .into_iter()
            .find(|c| c.header_aliases().contains(&normalized.as_str()))
    }

    /// Resolve a category name as used in API paths. Case-insensitive,
    /// tolerates both `event_shop` and `event-shop`.
    pub fn from_query_name(name: &str) -> Option<Category> {
        let normalized = name.trim().to_uppercase().replace('-', "_");
        Category::ALL.into_iter().find(|c| c.label() == normalized)
    }
}

/// A single shop entry. Duplicate names within a category are kept as
/// independent entries in extraction order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// One past weather condition with its relative time, when the page gave one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeatherEntry {
    pub condition: String,
    pub time: Option<String>,
}

/// Current weather plus a newest-first history as listed on the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeatherState {
    pub current: Option<String>,
    pub recent: Vec<WeatherEntry>,
}

impl WeatherState {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.recent.is_empty()
    }
}

/// The complete categorized stock state at one point in time. Every known
/// category is always present as a key; "no data" is an empty list, so
/// consumers never need to handle missing keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockSnapshot {
    pub categories: BTreeMap<Category, Vec<Item>>,
}

impl StockSnapshot {
    pub fn empty() -> Self {
        let mut categories = BTreeMap::new();
        for category in Category::ALL {
            categories.insert(category, Vec::new());
        }
        Self { categories }
    }

    pub fn items(&self, category: Category) -> &[Item] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn push(&mut self, category: Category, item: Item) {
        self.categories.entry(category).or_default().push(item);
    }

    pub fn extend(&mut self, category: Category, items: impl IntoIterator<Item = Item>) {
        self.categories.entry(category).or_default().extend(items);
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

impl Default for StockSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// The one process-wide record served to readers, replaced as a unit by
/// successful refresh cycles. `fetched_at` is `None` only for the seed
/// record that exists before the first successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheRecord {
    pub snapshot: StockSnapshot,
    pub weather: WeatherState,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    pub fn seed() -> Self {
        Self {
            snapshot: StockSnapshot::empty(),
            weather: WeatherState::default(),
            fetched_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&Category::Seeds).unwrap(), "\"SEEDS\"");
        assert_eq!(
            serde_json::to_string(&Category::EventShop).unwrap(),
            "\"EVENT_SHOP\""
        );
    }

    #[test]
    fn test_category_from_header() {
        assert_eq!(Category::from_header("SEEDS"), Some(Category::Seeds));
        assert_eq!(Category::from_header("  gear stock "), Some(Category::Gears));
        assert_eq!(Category::from_header("HONEY STOCK"), Some(Category::EventShop));
        assert_eq!(Category::from_header("Carrot x10"), None);
        assert_eq!(Category::from_header(""), None);
    }

    #[test]
    fn test_category_from_query_name() {
        assert_eq!(Category::from_query_name("seeds"), Some(Category::Seeds));
        assert_eq!(Category::from_query_name("EVENT_SHOP"), Some(Category::EventShop));
        assert_eq!(Category::from_query_name("event-shop"), Some(Category::EventShop));
        assert_eq!(Category::from_query_name("weather"), None);
    }

    #[test]
    fn test_snapshot_always_has_all_categories() {
        let snapshot = StockSnapshot::empty();
        assert_eq!(snapshot.categories.len(), Category::ALL.len());
        for category in Category::ALL {
            assert!(snapshot.items(category).is_empty());
        }
    }

    #[test]
    fn test_snapshot_preserves_duplicates_and_order() {
        let mut snapshot = StockSnapshot::empty();
        snapshot.push(Category::Seeds, Item::new("Carrot", 10));
        snapshot.push(Category::Seeds, Item::new("Carrot", 3));
        snapshot.push(Category::Seeds, Item::new("Corn", 2));

        let items = snapshot.items(Category::Seeds);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Item::new("Carrot", 10));
        assert_eq!(items[1], Item::new("Carrot", 3));
        assert_eq!(items[2], Item::new("Corn", 2));
        assert_eq!(snapshot.total_items(), 3);
    }

    #[test]
    fn test_snapshot_serializes_with_label_keys() {
        let mut snapshot = StockSnapshot::empty();
        snapshot.push(Category::Gears, Item::new("Trowel", 1));

        let json = serde_json::to_value(&snapshot).unwrap();
        let categories = json.get("categories").unwrap();
        assert!(categories.get("GEARS").is_some());
        assert!(categories.get("EVENT_SHOP").is_some());
        assert_eq!(categories["GEARS"][0]["name"], "Trowel");
    }

    #[test]
    fn test_seed_record_has_no_timestamp() {
        let record = CacheRecord::seed();
        assert!(record.fetched_at.is_none());
        assert!(record.weather.is_empty());
        assert_eq!(record.snapshot.total_items(), 0);
    }
}
