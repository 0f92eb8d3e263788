pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, record, success, tag_map, warn};
pub use table::{records_table, stats_table, tags_table};
pub use theme::{theme, Theme};
