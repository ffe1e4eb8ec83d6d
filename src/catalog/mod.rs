pub mod error;
pub mod handlers;
pub mod seed;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use error::CatalogError;
pub use handlers::*;
pub use seed::default_catalog;
pub use types::*;

/// One summary per domain, ordered by domain code.
pub fn summarize_domains(catalog: &[Control]) -> Vec<DomainSummary> {
    let mut domains: BTreeMap<&str, DomainSummary> = BTreeMap::new();
    for control in catalog {
        let summary = domains
            .entry(control.domain_code.as_str())
            .or_insert_with(|| DomainSummary {
                domain_code: control.domain_code.clone(),
                domain: control.domain.clone(),
                domain_objective: control.domain_objective.clone(),
                control_count: 0,
                baseline_count: 0,
            });
        summary.control_count += 1;
        if control.is_baseline {
            summary.baseline_count += 1;
        }
    }
    domains.into_values().collect()
}

/// Filters then pages, keeping catalog order.
pub fn filter_controls(catalog: Vec<Control>, query: &ListControlsQuery) -> Vec<Control> {
    let (skip, limit) = query.page();
    catalog
        .into_iter()
        .filter(|c| query.matches(c))
        .skip(skip)
        .take(limit)
        .collect()
}

pub fn configure_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/controls", get(handle_list_controls))
        .route("/api/controls/count", get(handle_count_controls))
        .route("/api/controls/domains", get(handle_list_domains))
        .route("/api/controls/:control_code", get(handle_get_control))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::control;

    fn catalog() -> Vec<Control> {
        let mut sg = control(1, "SG-01", "SG", true);
        sg.types.detect = true;
        sg.objectives.availability = true;
        vec![
            sg,
            control(2, "SG-02", "SG", false),
            control(3, "AM-01", "AM", true),
            control(4, "AM-02", "AM", true),
        ]
    }

    #[test]
    fn test_summarize_domains() {
        let domains = summarize_domains(&catalog());
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0].domain_code, "AM");
        assert_eq!(domains[0].control_count, 2);
        assert_eq!(domains[0].baseline_count, 2);
        assert_eq!(domains[1].domain_code, "SG");
        assert_eq!(domains[1].baseline_count, 1);
    }

    #[test]
    fn test_filter_controls() {
        let query = ListControlsQuery {
            domain_code: Some("SG".to_string()),
            ..ListControlsQuery::default()
        };
        assert_eq!(filter_controls(catalog(), &query).len(), 2);

        let query = ListControlsQuery {
            type_filter: Some(ControlTypeFilter::Detect),
            ..ListControlsQuery::default()
        };
        let found = filter_controls(catalog(), &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].control_code, "SG-01");

        let query = ListControlsQuery {
            objective_filter: Some(ObjectiveFilter::Availability),
            is_baseline: Some(false),
            ..ListControlsQuery::default()
        };
        assert!(filter_controls(catalog(), &query).is_empty());

        let query = ListControlsQuery {
            search: Some("am-0".to_string()),
            skip: Some(1),
            ..ListControlsQuery::default()
        };
        let found = filter_controls(catalog(), &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].control_code, "AM-02");
    }

    #[test]
    fn test_page_limit_is_capped() {
        let query = ListControlsQuery {
            limit: Some(5000),
            ..ListControlsQuery::default()
        };
        assert_eq!(query.page(), (0, ListControlsQuery::MAX_LIMIT));
    }
}
