//! Fixed theme catalog for review classification.

/// A named theme with the description shown to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDef {
    /// Canonical theme name. Classification output must match exactly.
    pub name: String,
    /// Short description of what the theme covers.
    pub description: String,
}

/// The closed set of themes every review is classified into. One theme
/// is designated the fallback and absorbs anything the model misses or
/// mislabels.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<ThemeDef>,
    fallback_index: usize,
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        let themes = vec![
            ThemeDef {
                name: "Trading Experience".to_string(),
                description: "order placement, speed, charting, stock/ETF flows".to_string(),
            },
            ThemeDef {
                name: "Mutual Funds & SIP Experience".to_string(),
                description: "MF search, SIP setup, redemptions, portfolio insights".to_string(),
            },
            ThemeDef {
                name: "Payments, UPI & Settlements".to_string(),
                description: "deposits, withdrawals, UPI reliability, T+1/T+0 settlement issues"
                    .to_string(),
            },
            ThemeDef {
                name: "App Performance & Reliability".to_string(),
                description: "crashes, loading time, login issues, downtime".to_string(),
            },
            ThemeDef {
                name: "Support & Service Quality".to_string(),
                description: "issue resolution, helpdesk, ticketing experience".to_string(),
            },
        ];
        // "App Performance & Reliability" is the catch-all.
        Self { themes, fallback_index: 3 }
    }
}

impl ThemeCatalog {
    /// Build a catalog from explicit definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, contains duplicates, or
    /// the fallback index is out of range.
    pub fn new(themes: Vec<ThemeDef>, fallback_index: usize) -> Result<Self, String> {
        if themes.is_empty() {
            return Err("Theme catalog must contain at least one theme".to_string());
        }
        if fallback_index >= themes.len() {
            return Err(format!(
                "Fallback index {fallback_index} out of range for {} themes",
                themes.len()
            ));
        }
        for (i, theme) in themes.iter().enumerate() {
            if themes[..i].iter().any(|t| t.name == theme.name) {
                return Err(format!("Duplicate theme name: {}", theme.name));
            }
        }
        Ok(Self { themes, fallback_index })
    }

    /// All theme definitions in catalog order.
    #[must_use]
    pub fn themes(&self) -> &[ThemeDef] {
        &self.themes
    }

    /// Theme names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.name.as_str()).collect()
    }

    /// Whether a name matches a catalog theme exactly.
    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.themes.iter().any(|t| t.name == name)
    }

    /// Name of the fallback theme.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.themes[self.fallback_index].name
    }
}
