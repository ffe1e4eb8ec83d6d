pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use schema::*;
pub use utils::{create_conn, ratio_percent, round_one_decimal, run_migrations, DbPool};
