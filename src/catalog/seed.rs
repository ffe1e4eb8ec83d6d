use super::types::{ControlObjectives, ControlTypes, FrameworkMappings, NewControl};

struct SeedControl {
    code: &'static str,
    name: &'static str,
    domain_code: &'static str,
    domain: &'static str,
    description: &'static str,
    baseline: bool,
    iso: Option<&'static str>,
}

const SEED: &[SeedControl] = &[
    SeedControl {
        code: "SG-01",
        name: "Information Security Roles and Responsibilities",
        domain_code: "SG",
        domain: "Security Governance",
        description: "The Agency shall allocate information security roles and responsibilities in accordance with the information security needs of the Agency.",
        baseline: true,
        iso: Some("A.6.1.1"),
    },
    SeedControl {
        code: "SG-02",
        name: "Confidentiality Binding",
        domain_code: "SG",
        domain: "Security Governance",
        description: "The Agency shall ensure that all employees, contractors and third party users sign confidentiality/non-disclosure agreements.",
        baseline: true,
        iso: Some("A.13.2.4"),
    },
    SeedControl {
        code: "SG-03",
        name: "Segregation of Duties",
        domain_code: "SG",
        domain: "Security Governance",
        description: "The Agency shall enforce segregation of duties to reduce the risk of accidental or deliberate misuse of the Agency's information assets.",
        baseline: true,
        iso: Some("A.6.1.2"),
    },
    SeedControl {
        code: "SG-04",
        name: "Contact with Authorities",
        domain_code: "SG",
        domain: "Security Governance",
        description: "The Agency shall maintain appropriate contacts with relevant authorities for information security matters.",
        baseline: false,
        iso: Some("A.6.1.3"),
    },
    SeedControl {
        code: "AM-01",
        name: "Asset Inventory",
        domain_code: "AM",
        domain: "Asset Management",
        description: "The Agency shall maintain an accurate and up-to-date inventory of all information assets.",
        baseline: true,
        iso: Some("A.8.1.1"),
    },
    SeedControl {
        code: "AM-02",
        name: "Asset Ownership",
        domain_code: "AM",
        domain: "Asset Management",
        description: "The Agency shall assign an owner for each information asset who is responsible for its protection.",
        baseline: true,
        iso: Some("A.8.1.2"),
    },
    SeedControl {
        code: "AM-03",
        name: "Acceptable Use of Assets",
        domain_code: "AM",
        domain: "Asset Management",
        description: "The Agency shall document and disseminate rules for the acceptable use of information assets.",
        baseline: true,
        iso: Some("A.8.1.3"),
    },
    SeedControl {
        code: "AM-04",
        name: "Classification of Information",
        domain_code: "AM",
        domain: "Asset Management",
        description: "The Agency shall classify information in terms of its value, criticality and sensitivity to unauthorised disclosure or modification.",
        baseline: false,
        iso: Some("A.8.2.1"),
    },
    SeedControl {
        code: "AM-05",
        name: "Labelling of Information",
        domain_code: "AM",
        domain: "Asset Management",
        description: "The Agency shall label information in accordance with the adopted classification scheme.",
        baseline: false,
        iso: Some("A.8.2.2"),
    },
    SeedControl {
        code: "RA-01",
        name: "Risk Assessment Methodology",
        domain_code: "RA",
        domain: "Risk Management",
        description: "The Agency shall define and document a risk assessment methodology.",
        baseline: true,
        iso: Some("6.1.2"),
    },
    SeedControl {
        code: "RA-02",
        name: "Risk Treatment",
        domain_code: "RA",
        domain: "Risk Management",
        description: "The Agency shall define and apply an information security risk treatment process.",
        baseline: false,
        iso: Some("6.1.3"),
    },
];

/// The built-in NIA catalog inserted into an empty store.
pub fn default_catalog() -> Vec<NewControl> {
    SEED.iter()
        .map(|seed| NewControl {
            control_code: seed.code.to_string(),
            domain_code: seed.domain_code.to_string(),
            domain: seed.domain.to_string(),
            domain_objective: None,
            section: Some(seed.name.to_string()),
            description: seed.description.to_string(),
            is_baseline: seed.baseline,
            types: ControlTypes {
                prevent: true,
                ..ControlTypes::default()
            },
            objectives: ControlObjectives {
                confidentiality: true,
                integrity: true,
                availability: seed.domain_code == "AM",
            },
            mappings: FrameworkMappings {
                iso27001_2013: seed.iso.map(str::to_string),
                ..FrameworkMappings::default()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_codes_are_unique() {
        let catalog = default_catalog();
        let codes: HashSet<_> = catalog.iter().map(|c| c.control_code.clone()).collect();
        assert_eq!(codes.len(), catalog.len());
    }

    #[test]
    fn test_every_domain_has_a_baseline_control() {
        let catalog = default_catalog();
        let domains: HashSet<_> = catalog.iter().map(|c| c.domain_code.clone()).collect();
        for domain in domains {
            assert!(catalog
                .iter()
                .any(|c| c.domain_code == domain && c.is_baseline));
        }
    }
}
