pub mod paper_reader;
pub mod sheet_ctx;

pub use paper_reader::PaperReader;
pub use sheet_ctx::{SheetCtx, SheetRole};
