//! 데이터 수집 모듈.

pub mod db_stats;
pub mod options_collect;
pub mod symbol_universe;

pub use db_stats::{format_database_stats, show_database_stats};
pub use options_collect::{collect_options, yahoo_source, OptionsCollector};
pub use symbol_universe::{resolve_symbols, SymbolSelection};
