use diesel::prelude::*;

use crate::core::shared::schema::compliance::controls;

use super::types::{Control, ControlObjectives, ControlTypes, FrameworkMappings, NewControl};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = controls)]
pub struct DbControl {
    pub id: i32,
    pub control_code: String,
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub section: Option<String>,
    pub control_statement: Option<String>,
    pub control_summary: Option<String>,
    pub control_description: Option<String>,
    pub is_baseline: bool,
    pub is_applicable: bool,
    pub type_deter: bool,
    pub type_avoid: bool,
    pub type_prevent: bool,
    pub type_detect: bool,
    pub type_react: bool,
    pub type_recover: bool,
    pub objective_confidentiality: bool,
    pub objective_integrity: bool,
    pub objective_availability: bool,
    pub iso27001_2013: Option<String>,
    pub pci_dss_v31: Option<String>,
    pub sp_800_53_rev4: Option<String>,
}

/// Insert form; the serial id is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = controls)]
pub struct NewDbControl {
    pub control_code: String,
    pub domain_code: String,
    pub domain: String,
    pub domain_objective: Option<String>,
    pub section: Option<String>,
    pub control_statement: Option<String>,
    pub control_summary: Option<String>,
    pub control_description: Option<String>,
    pub is_baseline: bool,
    pub is_applicable: bool,
    pub type_deter: bool,
    pub type_avoid: bool,
    pub type_prevent: bool,
    pub type_detect: bool,
    pub type_react: bool,
    pub type_recover: bool,
    pub objective_confidentiality: bool,
    pub objective_integrity: bool,
    pub objective_availability: bool,
    pub iso27001_2013: Option<String>,
    pub pci_dss_v31: Option<String>,
    pub sp_800_53_rev4: Option<String>,
}

pub fn db_control_to_control(db: DbControl) -> Control {
    Control {
        id: db.id,
        control_code: db.control_code,
        domain_code: db.domain_code,
        domain: db.domain,
        domain_objective: db.domain_objective,
        section: db.section,
        control_statement: db.control_statement,
        control_summary: db.control_summary,
        control_description: db.control_description,
        is_baseline: db.is_baseline,
        is_applicable: db.is_applicable,
        types: ControlTypes {
            deter: db.type_deter,
            avoid: db.type_avoid,
            prevent: db.type_prevent,
            detect: db.type_detect,
            react: db.type_react,
            recover: db.type_recover,
        },
        objectives: ControlObjectives {
            confidentiality: db.objective_confidentiality,
            integrity: db.objective_integrity,
            availability: db.objective_availability,
        },
        mappings: FrameworkMappings {
            iso27001_2013: db.iso27001_2013,
            pci_dss_v31: db.pci_dss_v31,
            sp_800_53_rev4: db.sp_800_53_rev4,
        },
    }
}

pub fn new_control_to_db(control: NewControl) -> NewDbControl {
    NewDbControl {
        control_code: control.control_code,
        domain_code: control.domain_code,
        domain: control.domain,
        domain_objective: control.domain_objective,
        section: control.section,
        control_statement: Some(control.description.clone()),
        control_summary: Some(control.description.clone()),
        control_description: Some(control.description),
        is_baseline: control.is_baseline,
        is_applicable: control.is_baseline,
        type_deter: control.types.deter,
        type_avoid: control.types.avoid,
        type_prevent: control.types.prevent,
        type_detect: control.types.detect,
        type_react: control.types.react,
        type_recover: control.types.recover,
        objective_confidentiality: control.objectives.confidentiality,
        objective_integrity: control.objectives.integrity,
        objective_availability: control.objectives.availability,
        iso27001_2013: control.mappings.iso27001_2013,
        pci_dss_v31: control.mappings.pci_dss_v31,
        sp_800_53_rev4: control.mappings.sp_800_53_rev4,
    }
}
