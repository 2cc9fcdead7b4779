//! Workbook model: the ordered sheet list with visibility states, defined
//! names, workbook properties, and sheet-name validation.

use std::collections::HashMap;

use sheetwright_xml::doc_props::{CoreProperties, CustomProperties, ExtendedProperties};

use crate::error::{Error, Result};
use crate::sheet::Worksheet;

/// Sheet visibility. The numeric values match the legacy state encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible = 0,
    Hidden = 1,
    VeryHidden = 2,
}

impl Visibility {
    /// The `state` attribute value, or `None` for visible sheets.
    pub fn state_attr(self) -> Option<&'static str> {
        match self {
            Visibility::Visible => None,
            Visibility::Hidden => Some("hidden"),
            Visibility::VeryHidden => Some("veryHidden"),
        }
    }

    pub fn from_state_attr(state: Option<&str>) -> Self {
        match state {
            Some("hidden") => Visibility::Hidden,
            Some("veryHidden") => Visibility::VeryHidden,
            _ => Visibility::Visible,
        }
    }
}

/// One sheet entry: name, visibility, optional VBA code name, and data.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub visibility: Visibility,
    pub code_name: Option<String>,
    pub data: Worksheet,
}

/// A defined name. The reference is preserved textually; cyclic references
/// are never resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    pub name: String,
    pub reference: String,
    /// Zero-based sheet index for sheet-scoped names; `None` is global.
    pub sheet_scope: Option<u32>,
    pub comment: Option<String>,
    pub hidden: bool,
}

/// The workbook: ordered sheets plus workbook-level state.
#[derive(Debug, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub defined_names: Vec<DefinedName>,
    /// Use the 1904 date system for serials.
    pub date1904: bool,
    pub code_name: Option<String>,
    pub core_props: Option<CoreProperties>,
    pub app_props: Option<ExtendedProperties>,
    pub custom_props: Option<CustomProperties>,
    /// The number-format table: id -> format code. Custom ids are 164+.
    pub format_table: HashMap<u32, String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Append a sheet with the given name, validating it against the Excel
    /// naming rules and existing names. Returns the new sheet's data.
    pub fn add_sheet(&mut self, name: &str, dense: bool) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }
        self.sheets.push(Sheet {
            name: name.to_string(),
            visibility: Visibility::Visible,
            code_name: None,
            data: Worksheet::new(dense),
        });
        Ok(&mut self
            .sheets
            .last_mut()
            .expect("sheet was just pushed")
            .data)
    }

    /// Rename a sheet, revalidating the new name.
    pub fn rename_sheet(&mut self, from: &str, to: &str) -> Result<()> {
        validate_sheet_name(to)?;
        if from != to && self.sheets.iter().any(|s| s.name == to) {
            return Err(Error::DuplicateSheetName(to.to_string()));
        }
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.name == from)
            .ok_or_else(|| Error::Internal(format!("no sheet named '{from}'")))?;
        sheet.name = to.to_string();
        Ok(())
    }

    /// Index of the first visible sheet, used for bookViews on write.
    pub fn first_visible_index(&self) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.visibility == Visibility::Visible)
    }
}

/// Validate a sheet name against the Excel rules: non-empty, at most 31
/// characters, no leading/trailing apostrophe, not "History", and none of
/// `: \ / ? * [ ]`.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("be blank".to_string()));
    }
    if name.chars().count() > 31 {
        return Err(Error::InvalidSheetName(
            "exceed 31 characters".to_string(),
        ));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(Error::InvalidSheetName(
            "start or end with apostrophe (')".to_string(),
        ));
    }
    if name.eq_ignore_ascii_case("History") {
        return Err(Error::InvalidSheetName("be 'History'".to_string()));
    }
    if name.contains(|c| matches!(c, ':' | ']' | '[' | '*' | '?' | '/' | '\\')) {
        return Err(Error::InvalidSheetName(
            "contain : \\ / ? * [ ]".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_state_attr() {
        assert_eq!(Visibility::Visible.state_attr(), None);
        assert_eq!(Visibility::Hidden.state_attr(), Some("hidden"));
        assert_eq!(Visibility::VeryHidden.state_attr(), Some("veryHidden"));
    }

    #[test]
    fn test_visibility_from_state_attr() {
        assert_eq!(Visibility::from_state_attr(None), Visibility::Visible);
        assert_eq!(
            Visibility::from_state_attr(Some("hidden")),
            Visibility::Hidden
        );
        assert_eq!(
            Visibility::from_state_attr(Some("veryHidden")),
            Visibility::VeryHidden
        );
        assert_eq!(
            Visibility::from_state_attr(Some("nonsense")),
            Visibility::Visible
        );
    }

    #[test]
    fn test_add_sheet_and_lookup() {
        let mut wb = Workbook::new();
        wb.add_sheet("Sheet1", false).unwrap();
        wb.add_sheet("Data", true).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Data"]);
        assert!(wb.sheet("Data").unwrap().data.is_dense());
        assert!(wb.sheet("Nope").is_none());
    }

    #[test]
    fn test_add_sheet_rejects_duplicate() {
        let mut wb = Workbook::new();
        wb.add_sheet("Sheet1", false).unwrap();
        let err = wb.add_sheet("Sheet1", false).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate Sheet Name: Sheet1");
    }

    #[test]
    fn test_rename_sheet() {
        let mut wb = Workbook::new();
        wb.add_sheet("Old", false).unwrap();
        wb.rename_sheet("Old", "New").unwrap();
        assert_eq!(wb.sheet_names(), vec!["New"]);
    }

    #[test]
    fn test_rename_rejects_existing_name() {
        let mut wb = Workbook::new();
        wb.add_sheet("A", false).unwrap();
        wb.add_sheet("B", false).unwrap();
        assert!(wb.rename_sheet("A", "B").is_err());
    }

    #[test]
    fn test_first_visible_index() {
        let mut wb = Workbook::new();
        wb.add_sheet("A", false).unwrap();
        wb.add_sheet("B", false).unwrap();
        wb.sheets[0].visibility = Visibility::Hidden;
        assert_eq!(wb.first_visible_index(), Some(1));
        wb.sheets[1].visibility = Visibility::VeryHidden;
        assert_eq!(wb.first_visible_index(), None);
    }

    // ----- name validation --------------------------------------------------

    #[test]
    fn test_validate_rejects_blank() {
        let err = validate_sheet_name("").unwrap_err();
        assert_eq!(err.to_string(), "Sheet name cannot be blank");
    }

    #[test]
    fn test_validate_rejects_long_names() {
        let name = "a".repeat(32);
        assert!(validate_sheet_name(&name).is_err());
        assert!(validate_sheet_name(&"a".repeat(31)).is_ok());
    }

    #[test]
    fn test_validate_rejects_apostrophes() {
        assert!(validate_sheet_name("'lead").is_err());
        assert!(validate_sheet_name("trail'").is_err());
        assert!(validate_sheet_name("mid'dle").is_ok());
    }

    #[test]
    fn test_validate_rejects_history() {
        assert!(validate_sheet_name("History").is_err());
        assert!(validate_sheet_name("history").is_err());
        assert!(validate_sheet_name("Historya").is_ok());
    }

    #[test]
    fn test_validate_rejects_special_chars() {
        for bad in ["a:b", "a[b", "a]b", "a*b", "a?b", "a/b", "a\\b"] {
            assert!(validate_sheet_name(bad).is_err(), "expected {bad} to fail");
        }
    }

    #[test]
    fn test_defined_name_shape() {
        let dn = DefinedName {
            name: "MyRange".to_string(),
            reference: "Sheet1!$A$1:$B$2".to_string(),
            sheet_scope: Some(0),
            comment: None,
            hidden: false,
        };
        assert_eq!(dn.reference, "Sheet1!$A$1:$B$2");
    }
}
