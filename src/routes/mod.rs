mod common;
mod table;

pub use common::common_routes_with_ready;
pub use table::table_routes;
