pub mod extractor;
pub mod file_emitter;
pub mod formatter;
pub mod id_import;
pub mod item_parser;
pub mod seen_store;

pub use extractor::{Extractor, ExtractorSettings, StallCounter};
pub use file_emitter::{DirectoryEmitter, FileEmitter};
pub use formatter::{suggested_file_name, MarkdownFormatter};
pub use id_import::PermalinkScanner;
pub use item_parser::ItemParser;
pub use seen_store::{JsonFileStore, KeyValueStore, MemoryStore, SeenStore};
