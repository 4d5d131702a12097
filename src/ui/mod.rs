pub mod icons;
pub mod output;
pub mod table;

pub use icons::Icons;
pub use output::{dim, error, header, info, paint, section, success, warn, Tone};
pub use table::{columns_table, tables_table};
