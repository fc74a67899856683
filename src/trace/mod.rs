mod formatter;

pub use formatter::{PANEL_TITLE, TraceFormatter};
