use anyhow::Result;

/// Row-oriented spreadsheet storage.
///
/// Rows and columns are 1-based. Rows before `first_data_row` are headers and
/// never touched by the reconciler.
pub trait SheetStore {
    /// First row after the fixed header row(s)
    fn first_data_row(&self) -> u32;

    /// Last row holding any value (0 for an empty sheet)
    fn last_row(&self) -> u32;

    /// Cell text, empty string for blank cells
    fn cell_value(&self, row: u32, column: u32) -> String;

    fn set_cell_value(&mut self, row: u32, column: u32, value: &str);

    /// Reserve the row after the last used row and return its index
    fn append_row(&mut self) -> u32;

    /// Persist the sheet to its backing file
    fn save(&mut self) -> Result<()>;
}
