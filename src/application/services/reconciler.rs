use tracing::{debug, warn};

use crate::application::ports::SheetStore;
use crate::config::{ColumnLayout, SheetColumn};

/// Value for one owned column; `None` means the value could not be determined
pub type FieldValue = (SheetColumn, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// An existing row was overwritten in place
    Updated { row: u32 },
    /// A new row was added; `missing` lists columns left empty
    Appended { row: u32, missing: Vec<SheetColumn> },
}

impl ReconcileOutcome {
    pub fn row(&self) -> u32 {
        match self {
            ReconcileOutcome::Updated { row } => *row,
            ReconcileOutcome::Appended { row, .. } => *row,
        }
    }

    pub fn missing(&self) -> &[SheetColumn] {
        match self {
            ReconcileOutcome::Updated { .. } => &[],
            ReconcileOutcome::Appended { missing, .. } => missing,
        }
    }
}

/// Find-or-append of one repository row.
///
/// Only the supplied columns are written. Other cells, other rows and the
/// header are never touched; nothing is ever removed.
pub struct RowReconciler<'a> {
    layout: &'a ColumnLayout,
}

impl<'a> RowReconciler<'a> {
    pub fn new(layout: &'a ColumnLayout) -> Self {
        Self { layout }
    }

    /// First data row whose identity cell equals `identity`
    pub fn find_row(&self, sheet: &dyn SheetStore, identity: &str) -> Option<u32> {
        (sheet.first_data_row()..=sheet.last_row())
            .find(|row| sheet.cell_value(*row, self.layout.identity) == identity)
    }

    pub fn reconcile(
        &self,
        sheet: &mut dyn SheetStore,
        identity: &str,
        fields: &[FieldValue],
    ) -> ReconcileOutcome {
        if let Some(row) = self.find_row(sheet, identity) {
            for (column, value) in fields {
                sheet.set_cell_value(row, self.layout.column(*column), value.as_deref().unwrap_or(""));
            }
            debug!(identity = %identity, row, columns = fields.len(), "Updated existing row");
            return ReconcileOutcome::Updated { row };
        }

        let row = sheet.append_row();
        sheet.set_cell_value(row, self.layout.identity, identity);

        let mut missing = Vec::new();
        for (column, value) in fields {
            match value {
                Some(value) => sheet.set_cell_value(row, self.layout.column(*column), value),
                None => {
                    warn!(identity = %identity, row, column = %column, "Failed to update '{}' for {}", column, identity);
                    missing.push(*column);
                }
            }
        }

        debug!(identity = %identity, row, "Appended new row");
        ReconcileOutcome::Appended { row, missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::spreadsheet::MemorySheet;

    fn sheet() -> MemorySheet {
        let mut sheet = MemorySheet::new(&[
            "Repository",
            "Package Manager",
            "Dependency Management",
            "Semantic Release",
            "GitHub Actions",
            "Integration Suite",
            "Concurrency Rule",
            "Mend",
            "Owner",
        ]);
        sheet.push_row(&["acme/alpha", "NPM", "No", "No", "Yes", "", "", "", "team-a"]);
        sheet.push_row(&["acme/beta", "Yarn", "Renovate", "Yes", "No", "", "", "", "team-b"]);
        sheet
    }

    fn value(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_update_existing_row_in_place() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();

        let outcome = reconciler.reconcile(
            &mut sheet,
            "acme/beta",
            &[(SheetColumn::PackageManager, value("NPM"))],
        );

        assert_eq!(outcome, ReconcileOutcome::Updated { row: 3 });
        assert_eq!(
            sheet.row(3),
            vec!["acme/beta", "NPM", "Renovate", "Yes", "No", "", "", "", "team-b"]
        );
        // Neighbouring row untouched
        assert_eq!(
            sheet.row(2),
            vec!["acme/alpha", "NPM", "No", "No", "Yes", "", "", "", "team-a"]
        );
    }

    #[test]
    fn test_reconcile_twice_keeps_one_row_with_latest_values() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();

        let first = reconciler.reconcile(
            &mut sheet,
            "acme/gamma",
            &[
                (SheetColumn::PackageManager, value("Yarn")),
                (SheetColumn::SemanticRelease, value("No")),
            ],
        );
        let second = reconciler.reconcile(
            &mut sheet,
            "acme/gamma",
            &[
                (SheetColumn::PackageManager, value("NPM")),
                (SheetColumn::SemanticRelease, value("Yes")),
            ],
        );

        assert_eq!(first.row(), second.row());
        assert!(matches!(second, ReconcileOutcome::Updated { .. }));
        assert_eq!(sheet.count_identity("acme/gamma"), 1);
        assert_eq!(sheet.cell_value(second.row(), 2), "NPM");
        assert_eq!(sheet.cell_value(second.row(), 4), "Yes");
        assert_eq!(sheet.cell_value(2, 9), "team-a");
        assert_eq!(sheet.cell_value(3, 9), "team-b");
    }

    #[test]
    fn test_append_reports_only_absent_columns() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();

        let outcome = reconciler.reconcile(
            &mut sheet,
            "acme/delta",
            &[
                (SheetColumn::GitHubActions, value("Yes")),
                (SheetColumn::IntegrationSuite, value("true")),
                (SheetColumn::ConcurrencyRule, None),
                (SheetColumn::Mend, None),
            ],
        );

        assert_eq!(
            outcome,
            ReconcileOutcome::Appended {
                row: 4,
                missing: vec![SheetColumn::ConcurrencyRule, SheetColumn::Mend],
            }
        );
        assert_eq!(sheet.last_row(), 4);
        assert_eq!(sheet.count_identity("acme/delta"), 1);
        assert_eq!(sheet.cell_value(4, 1), "acme/delta");
        assert_eq!(sheet.cell_value(4, 5), "Yes");
        assert_eq!(sheet.cell_value(4, 6), "true");
        assert_eq!(sheet.cell_value(4, 7), "");
        assert_eq!(sheet.cell_value(4, 9), "");
    }

    #[test]
    fn test_append_with_all_values_reports_nothing() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();

        let outcome = reconciler.reconcile(
            &mut sheet,
            "acme/epsilon",
            &[(SheetColumn::PackageManager, value("No"))],
        );

        assert!(outcome.missing().is_empty());
    }

    #[test]
    fn test_first_match_wins_for_duplicate_identities() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();
        sheet.push_row(&["acme/alpha", "Yarn"]);

        let outcome = reconciler.reconcile(
            &mut sheet,
            "acme/alpha",
            &[(SheetColumn::PackageManager, value("No"))],
        );

        assert_eq!(outcome.row(), 2);
        assert_eq!(sheet.cell_value(2, 2), "No");
        assert_eq!(sheet.cell_value(4, 2), "Yarn");
    }

    #[test]
    fn test_header_row_is_never_matched() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();

        let outcome = reconciler.reconcile(
            &mut sheet,
            "Repository",
            &[(SheetColumn::PackageManager, value("NPM"))],
        );

        assert_eq!(outcome.row(), 4);
        assert_eq!(sheet.cell_value(1, 2), "Package Manager");
    }

    #[test]
    fn test_update_clears_absent_value() {
        let layout = ColumnLayout::default();
        let reconciler = RowReconciler::new(&layout);
        let mut sheet = sheet();
        sheet.set_cell_value(2, 7, "old-group");

        let outcome = reconciler.reconcile(&mut sheet, "acme/alpha", &[(SheetColumn::ConcurrencyRule, None)]);

        assert!(outcome.missing().is_empty());
        assert_eq!(sheet.cell_value(2, 7), "");
    }
}
