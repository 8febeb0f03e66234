//! Output writers for crawl results.
//!
//! # Submodules
//!
//! - [`json`]: Writes the matched article records to a timestamped JSON file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_results_20250506_083000.json
//! └── news_results_20250506_203015.json
//! ```

pub mod json;
