pub mod aggregator;
pub mod platform;
pub mod score;

pub use aggregator::{
    aggregate_dashboard, CriticalDomain, DashboardResult, DomainScore, ScoringContext,
    CRITICAL_DOMAIN_LIMIT,
};
pub use platform::{
    aggregate_platform, DomainAverage, OrganizationSnapshot, PlatformStats, SnapshotError,
};
pub use score::{calculate_score, StatusColor};
