//! Command implementations for extman-cli

pub mod activate;
pub mod list;
pub mod scan;

pub use activate::run_activate;
pub use list::run_list;
pub use scan::run_scan;
