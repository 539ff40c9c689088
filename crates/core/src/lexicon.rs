const DEFAULT_BRANDS: &[&str] = &[
    "Nike",
    "Adidas",
    "Apple",
    "Samsung",
    "Microsoft",
    "Sony",
    "LG",
    "Dell",
    "HP",
    "Lenovo",
    "Zara",
    "H&M",
    "Gucci",
    "Prada",
    "Versace",
    "Amazon",
    "Walmart",
    "Target",
    "Costco",
    "Starbucks",
    "McDonald",
    "KFC",
    "Subway",
];

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("shoes", &["shoe", "sneaker", "boot", "sandal", "footwear"]),
    (
        "clothing",
        &["shirt", "pants", "dress", "jacket", "coat", "jeans", "t-shirt"],
    ),
    (
        "electronics",
        &[
            "phone",
            "laptop",
            "computer",
            "tablet",
            "tv",
            "television",
            "monitor",
        ],
    ),
    ("food", &["pizza", "burger", "food", "meal", "coffee", "drink"]),
    ("furniture", &["chair", "table", "sofa", "bed", "desk"]),
    ("books", &["book", "novel", "magazine", "publication"]),
    ("sports", &["ball", "equipment", "gear", "fitness"]),
];

#[derive(Debug, Clone)]
struct BrandEntry {
    display: String,
    folded: String,
}

/// Known brand names in display casing, matched by case-insensitive
/// containment in declaration order.
#[derive(Debug, Clone)]
pub struct BrandLexicon {
    entries: Vec<BrandEntry>,
}

impl BrandLexicon {
    pub fn new<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = brands
            .into_iter()
            .map(Into::<String>::into)
            .filter(|brand| !brand.trim().is_empty())
            .map(|display| BrandEntry {
                folded: display.to_lowercase(),
                display,
            })
            .collect();
        Self { entries }
    }

    /// `lowered` must already be lower-cased.
    pub fn find_in(&self, lowered: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| lowered.contains(entry.folded.as_str()))
            .map(|entry| entry.display.as_str())
    }
}

impl Default for BrandLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_BRANDS.iter().copied())
    }
}

#[derive(Debug, Clone)]
struct CategoryEntry {
    name: String,
    keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryHit<'a> {
    pub category: &'a str,
    pub keyword: &'a str,
}

/// Keyword to canonical category mapping. Both the category order and the
/// keyword order inside a category decide ties.
#[derive(Debug, Clone)]
pub struct CategoryLexicon {
    entries: Vec<CategoryEntry>,
}

impl CategoryLexicon {
    pub fn new<I, K>(categories: I) -> Self
    where
        I: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = String>,
    {
        let entries = categories
            .into_iter()
            .map(|(name, keywords)| CategoryEntry {
                name,
                keywords: keywords
                    .into_iter()
                    .map(|keyword| keyword.to_lowercase())
                    .filter(|keyword| !keyword.is_empty())
                    .collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// `lowered` must already be lower-cased.
    pub fn find_in(&self, lowered: &str) -> Option<CategoryHit<'_>> {
        self.entries.iter().find_map(|entry| {
            entry
                .keywords
                .iter()
                .find(|keyword| lowered.contains(keyword.as_str()))
                .map(|keyword| CategoryHit {
                    category: entry.name.as_str(),
                    keyword: keyword.as_str(),
                })
        })
    }
}

impl Default for CategoryLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().map(|(name, keywords)| {
            (
                (*name).to_string(),
                keywords.iter().map(|keyword| (*keyword).to_string()),
            )
        }))
    }
}
