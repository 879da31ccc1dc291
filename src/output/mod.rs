//! Output module
//!
//! Formats probe results and applies them to the render regions.

mod dashboard;
mod formatter;

pub use dashboard::{Dashboard, Region, RenderSink, RenderUpdate};
pub use formatter::{OutputFormat, ResultFormatter};
