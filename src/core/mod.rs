// Core primitives for delimited text scanning

pub mod config;
pub mod escape;
pub mod field;
pub mod index;
pub mod masks;
pub mod parser;
pub mod projection;
pub mod search;

pub use config::{ConfigError, ParserConfig};
pub use escape::process_escape_mask;
pub use field::{unescape_field, FieldLocation};
pub use index::{FieldIndex, Row};
pub use parser::{find_first_tuple_start, DelimitedTextParser, ScanCursor, ScanOutput};
pub use projection::{AllColumns, ColumnProjection, Projection, SelectedColumns};
pub use search::{NeedleSearch, ScalarSearch, SimdSearch, WindowSearch, WINDOW};
