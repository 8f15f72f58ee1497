#[cfg(test)]
pub mod memory_store;
pub mod xlsx_store;

#[cfg(test)]
pub use memory_store::MemorySheet;
pub use xlsx_store::XlsxSheetStore;
