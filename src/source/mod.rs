pub mod parser;
pub mod reader;
pub mod record;

pub use parser::{ParseError, RecordParser};
pub use reader::{open_source, JournalSource, LineSource, LogSource, SourceError};
pub use record::LogRecord;
