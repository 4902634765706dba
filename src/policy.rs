//! Verification policy - the human-facing description of a config.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::validation::{ValidationResult, Validator};

pub const MAX_AGE: u8 = 150;

/// The three independent sanctions screening levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SanctionsTiers {
    pub basic: bool,
    pub enhanced: bool,
    pub comprehensive: bool,
}

impl SanctionsTiers {
    pub fn new(basic: bool, enhanced: bool, comprehensive: bool) -> Self {
        Self { basic, enhanced, comprehensive }
    }

    /// Flags in wire order: basic, enhanced, comprehensive.
    pub fn as_array(&self) -> [bool; 3] {
        [self.basic, self.enhanced, self.comprehensive]
    }

    pub fn any(&self) -> bool {
        self.basic || self.enhanced || self.comprehensive
    }
}

impl From<[bool; 3]> for SanctionsTiers {
    fn from(flags: [bool; 3]) -> Self {
        Self::new(flags[0], flags[1], flags[2])
    }
}

impl TryFrom<&[bool]> for SanctionsTiers {
    type Error = PolicyError;

    fn try_from(flags: &[bool]) -> Result<Self, Self::Error> {
        let flags: [bool; 3] = flags
            .try_into()
            .map_err(|_| PolicyError::InvalidSanctionsTiers { count: flags.len() })?;
        Ok(flags.into())
    }
}

/// Unvalidated policy parameters as they arrive from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInput {
    #[serde(default)]
    pub minimum_age: i64,
    #[serde(default)]
    pub excluded_countries: Vec<String>,
    #[serde(default = "default_tiers")]
    pub sanctions_tiers: Vec<bool>,
}

fn default_tiers() -> Vec<bool> {
    vec![false; 3]
}

impl Default for PolicyInput {
    fn default() -> Self {
        Self {
            minimum_age: 0,
            excluded_countries: vec![],
            sanctions_tiers: default_tiers(),
        }
    }
}

/// A validated policy. Only constructible through validation, so every
/// value of this type can be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VerificationPolicy {
    minimum_age: u8,
    excluded_countries: Vec<String>,
    sanctions: SanctionsTiers,
}

impl VerificationPolicy {
    pub fn new(
        minimum_age: i64,
        excluded_countries: Vec<String>,
        sanctions: SanctionsTiers,
    ) -> Result<Self, PolicyError> {
        Self::try_from(PolicyInput {
            minimum_age,
            excluded_countries,
            sanctions_tiers: sanctions.as_array().to_vec(),
        })
    }

    /// 0 means the age check is disabled.
    pub fn minimum_age(&self) -> u8 {
        self.minimum_age
    }

    pub fn age_check_enabled(&self) -> bool {
        self.minimum_age > 0
    }

    pub fn excluded_countries(&self) -> &[String] {
        &self.excluded_countries
    }

    pub fn countries_enabled(&self) -> bool {
        !self.excluded_countries.is_empty()
    }

    pub fn sanctions(&self) -> SanctionsTiers {
        self.sanctions
    }
}

impl VerificationPolicy {
    /// Run every rule over `input`. The full report comes back either way,
    /// so callers can surface warnings next to the built policy.
    pub fn validate(input: PolicyInput) -> (Result<Self, PolicyError>, ValidationResult) {
        let report = Validator::new().validate(&input);
        let policy = match report.first_error() {
            Some(err) => Err(err.clone()),
            None => Self::from_checked(input),
        };
        (policy, report)
    }

    fn from_checked(input: PolicyInput) -> Result<Self, PolicyError> {
        // The age rule has passed, so this conversion cannot fail.
        let minimum_age =
            u8::try_from(input.minimum_age).map_err(|_| PolicyError::AgeOutOfRange {
                age: input.minimum_age,
            })?;
        let sanctions = SanctionsTiers::try_from(input.sanctions_tiers.as_slice())?;

        Ok(Self {
            minimum_age,
            excluded_countries: input.excluded_countries,
            sanctions,
        })
    }
}

impl TryFrom<PolicyInput> for VerificationPolicy {
    type Error = PolicyError;

    fn try_from(input: PolicyInput) -> Result<Self, Self::Error> {
        Self::validate(input).0
    }
}
