//! Output formatting for CLI.

mod highlight;
mod progress;
mod table;

pub use highlight::render_segments;
pub use progress::ProgressView;
pub use table::render_table;
