//! Catalog Module
//!
//! Owns the record model for the music catalog and everything needed to turn the
//! rows of the upstream spreadsheet into a clean, sorted `Catalog`.
//!
//! ## Pipeline
//! 1. **Fetch**: A `CatalogSource` returns raw 3-column rows and a modification timestamp.
//! 2. **Clean**: Cells are trimmed, rows with a blank artist or title are dropped, and
//!    letter-spaced values such as `"T L C"` are collapsed to `"TLC"`.
//! 3. **Filter**: Rows matching the configured block-list are removed.
//! 4. **Sort**: Records are ordered by artist, then title (case-insensitive) and numbered.
//!
//! ## Submodules
//! - **`types`**: `Record`, `Catalog` and the upstream payload shapes.
//! - **`normalize`**: Row cleaning, the exclusion filter and sorting.
//! - **`source`**: The `CatalogSource` trait and its Google Sheets and file implementations.

pub mod normalize;
pub mod source;
pub mod types;

pub use normalize::ExclusionFilter;
pub use source::CatalogSource;
pub use types::{Catalog, RawRow, Record};
