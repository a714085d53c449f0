pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, header, method_badge, muted, status, success, summary_row, timing, warn,
};
pub use progress::Spinner;
pub use table::{endpoint_table, property_table, stats_table, version_table, TableBuilder};
pub use theme::{theme, Theme};
