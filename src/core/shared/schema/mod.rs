// Core (Always available)
pub mod core;
pub use self::core::*;

pub mod compliance;
pub use self::compliance::*;

pub mod bia;
pub use self::bia::*;

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    change_history,
    controls,
    evaluations,
    evidence,
    comments,
    organization_settings,
    bia_processes,
    information_assets,
);
