//! Raw data acquisition: fetching bytes, unpacking sources, splitting text.

pub mod fetch;
pub mod raw;
pub mod source;

pub use fetch::{FetchProgress, Fetcher, HttpFetcher, SilentProgress, StdoutProgress};
pub use raw::{is_missing, parse_text, ColumnRef, Delimiter, RawTable, TextFormat};
pub use source::Source;
