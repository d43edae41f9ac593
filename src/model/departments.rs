//! Department resolver — static disease → care department lookup.

use std::collections::HashMap;

/// Department recommended when a disease has no explicit mapping.
pub const FALLBACK_DEPARTMENT: &str = "General Medicine";

const DEPARTMENT_TABLE: &[(&str, &str)] = &[
    ("Psoriasis", "Dermatology"),
    ("Fungal Infection", "Dermatology"),
    ("Common Cold", "General Medicine"),
    ("Acne", "Dermatology"),
    ("Hypertension", "Cardiology"),
    ("Varicose Veins", "Vascular Surgery"),
    ("Typhoid", "Infectious Diseases"),
    ("Chicken Pox", "Pediatrics"),
    ("Impetigo", "Dermatology"),
    ("Dengue", "Infectious Diseases"),
    ("Pneumonia", "Pulmonology"),
    ("Dimorphic Hemorrhoids", "Colorectal Surgery"),
    ("Arthritis", "Rheumatology"),
    ("Bronchial Asthma", "Pulmonology"),
    ("Migraine", "Neurology"),
    ("Cervical Spondylosis", "Neurology"),
    ("Jaundice", "Hepatology"),
    ("Malaria", "Infectious Diseases"),
    ("Urinary Tract Infection", "Urology"),
    ("Allergy", "Allergy and Immunology"),
    ("Gastroesophageal Reflux Disease", "Gastroenterology"),
    ("Drug Reaction", "Dermatology"),
    ("Peptic Ulcer Disease", "Gastroenterology"),
    ("Diabetes", "Endocrinology"),
];

/// Exact-match lookup from predicted disease label to department.
#[derive(Debug, Clone)]
pub struct DepartmentResolver {
    table: HashMap<&'static str, &'static str>,
}

impl DepartmentResolver {
    pub fn new() -> Self {
        Self {
            table: DEPARTMENT_TABLE.iter().copied().collect(),
        }
    }

    /// Department for `label`, or [`FALLBACK_DEPARTMENT`] if unmapped.
    pub fn resolve(&self, label: &str) -> &'static str {
        self.table.get(label).copied().unwrap_or(FALLBACK_DEPARTMENT)
    }
}

impl Default for DepartmentResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mapped_label_resolves_exactly() {
        let resolver = DepartmentResolver::new();
        for (label, department) in DEPARTMENT_TABLE {
            assert_eq!(resolver.resolve(label), *department, "wrong department for {label}");
        }
    }

    #[test]
    fn unknown_labels_fall_back() {
        let resolver = DepartmentResolver::new();
        assert_eq!(resolver.resolve("Scurvy"), FALLBACK_DEPARTMENT);
        assert_eq!(resolver.resolve(""), FALLBACK_DEPARTMENT);
        // lookup is case-sensitive
        assert_eq!(resolver.resolve("psoriasis"), FALLBACK_DEPARTMENT);
    }
}
