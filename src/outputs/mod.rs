//! Output files produced alongside the notification.
//!
//! # Submodules
//!
//! - [`json`]: Writes the aggregate report to a dated JSON file
//!
//! # Output Structure
//!
//! ```text
//! report_dir/
//! └── 2025-10-20/
//!     ├── report_083012.json
//!     └── report_171545.json
//! ```

pub mod json;
