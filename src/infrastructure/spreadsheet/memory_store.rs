use anyhow::Result;

use crate::application::ports::SheetStore;

/// Sheet held in memory, one `Vec<String>` per row
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
    header_rows: u32,
    pub saves: u32,
}

impl MemorySheet {
    pub fn new(header: &[&str]) -> Self {
        Self {
            rows: vec![header.iter().map(|h| h.to_string()).collect()],
            header_rows: 1,
            saves: 0,
        }
    }

    pub fn push_row(&mut self, cells: &[&str]) {
        self.rows.push(cells.iter().map(|c| c.to_string()).collect());
    }

    pub fn row(&self, row: u32) -> Vec<String> {
        self.rows.get(row as usize - 1).cloned().unwrap_or_default()
    }

    /// Rows whose first cell equals `identity`
    pub fn count_identity(&self, identity: &str) -> usize {
        self.rows
            .iter()
            .skip(self.header_rows as usize)
            .filter(|row| row.first().map(String::as_str) == Some(identity))
            .count()
    }
}

impl SheetStore for MemorySheet {
    fn first_data_row(&self) -> u32 {
        self.header_rows + 1
    }

    fn last_row(&self) -> u32 {
        self.rows.len() as u32
    }

    fn cell_value(&self, row: u32, column: u32) -> String {
        self.rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(column as usize - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn set_cell_value(&mut self, row: u32, column: u32, value: &str) {
        let (row, column) = (row as usize - 1, column as usize - 1);
        if self.rows.len() <= row {
            self.rows.resize(row + 1, Vec::new());
        }
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.to_string();
    }

    fn append_row(&mut self) -> u32 {
        self.rows.push(Vec::new());
        self.rows.len() as u32
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}
