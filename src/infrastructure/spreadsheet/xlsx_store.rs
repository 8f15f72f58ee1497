use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::info;
use umya_spreadsheet::{reader, writer, Spreadsheet};

use crate::application::ports::SheetStore;
use crate::config::ColumnLayout;

/// Active worksheet of an `.xlsx` workbook
pub struct XlsxSheetStore {
    path: PathBuf,
    book: Spreadsheet,
    first_data_row: u32,
}

impl XlsxSheetStore {
    /// Open `path`, or start a new workbook with the layout's header row
    pub fn open_or_create(path: &Path, layout: &ColumnLayout) -> Result<Self> {
        let book = if path.exists() {
            info!(path = %path.display(), "Opening workbook");
            reader::xlsx::read(path)
                .map_err(|e| anyhow!("Failed to read workbook {}: {:?}", path.display(), e))?
        } else {
            info!(path = %path.display(), "Workbook not found, creating a new one");
            let mut book = umya_spreadsheet::new_file();
            let sheet = book.get_active_sheet_mut();
            for (column, header) in layout.headers() {
                sheet.get_cell_mut((column, layout.header_row)).set_value(header);
            }
            book
        };

        Ok(Self {
            path: path.to_path_buf(),
            book,
            first_data_row: layout.first_data_row(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetStore for XlsxSheetStore {
    fn first_data_row(&self) -> u32 {
        self.first_data_row
    }

    fn last_row(&self) -> u32 {
        self.book.get_active_sheet().get_highest_row()
    }

    fn cell_value(&self, row: u32, column: u32) -> String {
        self.book.get_active_sheet().get_value((column, row))
    }

    fn set_cell_value(&mut self, row: u32, column: u32, value: &str) {
        self.book
            .get_active_sheet_mut()
            .get_cell_mut((column, row))
            .set_value(value);
    }

    fn append_row(&mut self) -> u32 {
        (self.last_row() + 1).max(self.first_data_row)
    }

    fn save(&mut self) -> Result<()> {
        writer::xlsx::write(&self.book, &self.path)
            .map_err(|e| anyhow!("Failed to save workbook {}: {:?}", self.path.display(), e))?;
        info!(path = %self.path.display(), "Workbook saved");
        Ok(())
    }
}
