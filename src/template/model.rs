//! Template grids: ordered pages of addressed cells

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in an A1-style cell address
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid cell address '{0}'")]
    Invalid(String),
}

/// Errors that can occur while loading a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse template TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate page id: {id}")]
    DuplicatePage { id: String },

    #[error("cell {cell} lies outside page '{page}' ({rows} rows x {cols} cols)")]
    CellOutOfBounds {
        page: String,
        cell: CellAddress,
        rows: u32,
        cols: u32,
    },
}

/// 1-based (row, column) position; orders row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Same column, different row
    pub fn with_row(self, row: u32) -> Self {
        Self { row, ..self }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let column: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", column, self.row)
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::Invalid(s.to_string());
        let s_trim = s.trim();
        let split = s_trim
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = s_trim.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(invalid)?;
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self { row, col })
    }
}

impl TryFrom<String> for CellAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellAddress> for String {
    fn from(addr: CellAddress) -> Self {
        addr.to_string()
    }
}

/// One page of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub cells: BTreeMap<CellAddress, String>,
}

impl Page {
    /// An empty page; dimensions grow as cells are added
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rows: 0,
            cols: 0,
            cells: BTreeMap::new(),
        }
    }

    /// Set explicit grid dimensions
    pub fn with_dimensions(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Add a cell, growing the dimensions to include it
    pub fn with_cell(mut self, cell: CellAddress, text: impl Into<String>) -> Self {
        self.rows = self.rows.max(cell.row);
        self.cols = self.cols.max(cell.col);
        self.cells.insert(cell, text.into());
        self
    }

    pub fn text(&self, cell: &CellAddress) -> Option<&str> {
        self.cells.get(cell).map(|s| s.as_str())
    }

    pub fn contains(&self, cell: &CellAddress) -> bool {
        cell.row >= 1 && cell.col >= 1 && cell.row <= self.rows && cell.col <= self.cols
    }
}

/// An ordered set of pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Template {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pages: Vec::new(),
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Load a template from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a template from a TOML string and validate it
    pub fn from_toml(content: &str) -> Result<Self, TemplateError> {
        let template: Template = toml::from_str(content)?;
        template.validate()?;
        Ok(template)
    }

    /// Page ids are unique and every cell lies within its page's grid
    pub fn validate(&self) -> Result<(), TemplateError> {
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id.as_str()) {
                return Err(TemplateError::DuplicatePage {
                    id: page.id.clone(),
                });
            }
            if let Some(cell) = page.cells.keys().find(|c| !page.contains(c)) {
                return Err(TemplateError::CellOutOfBounds {
                    page: page.id.clone(),
                    cell: *cell,
                    rows: page.rows,
                    cols: page.cols,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(addr("A1"), CellAddress::new(1, 1));
        assert_eq!(addr("B30"), CellAddress::new(30, 2));
        assert_eq!(addr("aa3"), CellAddress::new(3, 27));
    }

    #[test]
    fn test_display_address() {
        assert_eq!(CellAddress::new(8, 1).to_string(), "A8");
        assert_eq!(CellAddress::new(1, 26).to_string(), "Z1");
        assert_eq!(CellAddress::new(1, 28).to_string(), "AB1");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in ["", "12", "A", "A0", "1A", "A-1", "Ä1"] {
            assert!(bad.parse::<CellAddress>().is_err(), "{:?} should fail", bad);
        }
    }

    #[test]
    fn test_row_major_order() {
        let mut cells = vec![addr("B1"), addr("A2"), addr("A1")];
        cells.sort();
        assert_eq!(cells, vec![addr("A1"), addr("B1"), addr("A2")]);
    }

    #[test]
    fn test_template_from_toml() {
        let toml_str = r#"
id = "wq"

[[pages]]
id = "page1"
rows = 10
cols = 4

[pages.cells]
A1 = "Title"
B3 = "[#report_no]"
"#;
        let template = Template::from_toml(toml_str).expect("Should parse");
        assert_eq!(template.pages.len(), 1);
        assert_eq!(template.pages[0].text(&addr("B3")), Some("[#report_no]"));
    }

    #[test]
    fn test_cell_out_of_bounds() {
        let toml_str = r#"
id = "wq"

[[pages]]
id = "page1"
rows = 2
cols = 2

[pages.cells]
C1 = "too wide"
"#;
        let result = Template::from_toml(toml_str);
        assert!(matches!(result, Err(TemplateError::CellOutOfBounds { .. })));
    }

    #[test]
    fn test_duplicate_page() {
        let template = Template::new("t")
            .with_page(Page::new("p"))
            .with_page(Page::new("p"));
        assert!(matches!(
            template.validate(),
            Err(TemplateError::DuplicatePage { .. })
        ));
    }

    #[test]
    fn test_with_cell_grows_dimensions() {
        let page = Page::new("p").with_cell(addr("C5"), "x");
        assert_eq!((page.rows, page.cols), (5, 3));
    }
}
