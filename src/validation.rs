//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Errors block id generation; warnings and info are reported only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::codec::{is_valid_code, MAX_COUNTRIES};
use crate::countries::country_name;
use crate::error::PolicyError;
use crate::policy::{PolicyInput, MAX_AGE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
    /// Set for blocking violations only.
    #[serde(skip)]
    pub error: Option<PolicyError>,
}

impl ValidationViolation {
    fn blocking(rule: &str, error: PolicyError, expected: String, actual: String, fix: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: error.to_string(),
            expected: Some(expected),
            actual: Some(actual),
            remediation: vec![fix.to_string()],
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// The first blocking error, in rule order.
    pub fn first_error(&self) -> Option<&PolicyError> {
        self.violations.iter().find_map(|v| v.error.as_ref())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity != ViolationSeverity::Error)
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct AgeRangeRule;

impl ValidationRule for AgeRangeRule {
    fn name(&self) -> &'static str { "age_range" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        let age = input.minimum_age;
        if (0..=i64::from(MAX_AGE)).contains(&age) {
            return vec![];
        }
        vec![ValidationViolation::blocking(
            self.name(),
            PolicyError::AgeOutOfRange { age },
            format!("0..={MAX_AGE}"),
            age.to_string(),
            "Use 0 to disable the age check",
        )]
    }
}

pub struct CountryCountRule;

impl ValidationRule for CountryCountRule {
    fn name(&self) -> &'static str { "country_count" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        let count = input.excluded_countries.len();
        if count <= MAX_COUNTRIES {
            return vec![];
        }
        vec![ValidationViolation::blocking(
            self.name(),
            PolicyError::TooManyCountries { count },
            format!("at most {MAX_COUNTRIES} countries"),
            format!("{count} countries"),
            "Split the exclusion list or drop low-risk entries",
        )]
    }
}

pub struct CountryCodeRule;

impl ValidationRule for CountryCodeRule {
    fn name(&self) -> &'static str { "country_code" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        input
            .excluded_countries
            .iter()
            .filter(|code| !is_valid_code(code))
            .map(|code| {
                ValidationViolation::blocking(
                    self.name(),
                    PolicyError::InvalidCode { code: code.clone() },
                    "3-letter uppercase ISO 3166-1 alpha-3 code".to_string(),
                    format!("{code:?}"),
                    "Look the code up with list_country_codes",
                )
            })
            .collect()
    }
}

pub struct SanctionsTiersRule;

impl ValidationRule for SanctionsTiersRule {
    fn name(&self) -> &'static str { "sanctions_tiers" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        let count = input.sanctions_tiers.len();
        if count == 3 {
            return vec![];
        }
        vec![ValidationViolation::blocking(
            self.name(),
            PolicyError::InvalidSanctionsTiers { count },
            "[basic, enhanced, comprehensive]".to_string(),
            format!("{count} flags"),
            "Pass exactly three booleans",
        )]
    }
}

pub struct DuplicateCountryRule;

impl ValidationRule for DuplicateCountryRule {
    fn name(&self) -> &'static str { "duplicate_country" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        let mut seen = HashSet::new();
        input
            .excluded_countries
            .iter()
            .filter(|code| !seen.insert(code.as_str()))
            .map(|code| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: format!("{code} is listed more than once"),
                expected: None,
                actual: Some(code.clone()),
                remediation: vec![
                    "Duplicates change the config id; remove them unless the deployed config has them"
                        .to_string(),
                ],
                error: None,
            })
            .collect()
    }
}

pub struct UnknownCountryRule;

impl ValidationRule for UnknownCountryRule {
    fn name(&self) -> &'static str { "unknown_country" }

    fn validate(&self, input: &PolicyInput) -> Vec<ValidationViolation> {
        input
            .excluded_countries
            .iter()
            .filter(|code| is_valid_code(code) && country_name(code).is_none())
            .map(|code| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Info,
                message: format!("{code} is not in the country table"),
                expected: None,
                actual: Some(code.clone()),
                remediation: vec![],
                error: None,
            })
            .collect()
    }
}

/// Validator orchestrates rules
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(AgeRangeRule),
                Box::new(CountryCountRule),
                Box::new(CountryCodeRule),
                Box::new(SanctionsTiersRule),
                Box::new(DuplicateCountryRule),
                Box::new(UnknownCountryRule),
            ],
        }
    }

    pub fn validate(&self, input: &PolicyInput) -> ValidationResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(input))
            .collect();

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
