pub const UNCATEGORISED: &str = "Uncategorised";

/// One row of a bank statement as parsed from CSV, before DB insert.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    pub date: String,
    pub transaction_type: String,
    pub description: String,
    pub paid_out: f64,
    pub paid_in: f64,
    pub balance: f64,
}

/// Category levels shared by rules and their results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPath {
    pub main: String,
    pub sub1: Option<String>,
    pub sub2: Option<String>,
    pub sub3: Option<String>,
}

impl CategoryPath {
    pub fn uncategorised() -> Self {
        Self {
            main: UNCATEGORISED.to_string(),
            ..Default::default()
        }
    }

    /// Split a `;`-separated label ("Food; Groceries") into levels. Levels
    /// past the third sub-category are folded into `sub3`.
    pub fn parse(label: &str) -> Self {
        let mut parts = label
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let main = parts.next().unwrap_or_else(|| UNCATEGORISED.to_string());
        let sub1 = parts.next();
        let sub2 = parts.next();
        let rest: Vec<String> = parts.collect();
        let sub3 = if rest.is_empty() { None } else { Some(rest.join("; ")) };
        Self { main, sub1, sub2, sub3 }
    }

    pub fn subs(&self) -> impl Iterator<Item = &str> {
        [&self.sub1, &self.sub2, &self.sub3]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Main category followed by every non-empty sub-level, joined with "; ".
    pub fn full_label(&self) -> String {
        std::iter::once(self.main.as_str())
            .chain(self.subs())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A rule ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub type_pattern: String,
    pub description_pattern: String,
    pub category: CategoryPath,
    pub essential: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: i64,
    pub type_pattern: String,
    pub description_pattern: String,
    pub category: CategoryPath,
    pub essential: bool,
    pub notes: Option<String>,
    pub hit_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_level() {
        let p = CategoryPath::parse("Bills");
        assert_eq!(p.main, "Bills");
        assert!(p.sub1.is_none());
        assert_eq!(p.full_label(), "Bills");
    }

    #[test]
    fn test_parse_multi_level_trims() {
        let p = CategoryPath::parse(" Food ;Groceries;  Supermarket ");
        assert_eq!(p.main, "Food");
        assert_eq!(p.sub1.as_deref(), Some("Groceries"));
        assert_eq!(p.sub2.as_deref(), Some("Supermarket"));
        assert_eq!(p.full_label(), "Food; Groceries; Supermarket");
    }

    #[test]
    fn test_parse_folds_extra_levels() {
        let p = CategoryPath::parse("A;B;C;D;E");
        assert_eq!(p.sub3.as_deref(), Some("D; E"));
    }

    #[test]
    fn test_parse_empty_is_uncategorised() {
        assert_eq!(CategoryPath::parse("  ").main, UNCATEGORISED);
    }

    #[test]
    fn test_full_label_skips_blank_levels() {
        let p = CategoryPath {
            main: "Travel".into(),
            sub1: Some(String::new()),
            sub2: Some("Rail".into()),
            sub3: None,
        };
        assert_eq!(p.full_label(), "Travel; Rail");
    }
}
