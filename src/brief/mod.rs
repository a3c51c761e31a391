//! Decision brief structure.
//!
//! # Data Flow
//! ```text
//! Upstream model text (unmodified)
//!     → parser.rs (line state machine over the heading table)
//!     → Vec<BriefSection> in source order
//!     → caller checks for empty output and missing required headings
//! ```

pub mod parser;
pub mod sections;

pub use parser::{match_heading, missing_required, parse_brief, parse_brief_with};
pub use sections::{required_headings, BriefSection, SectionConfig, DEFAULT_SECTIONS};
