//! Configuration id generation.
//!
//! The id is keccak-256 over a tightly packed 165-byte layout:
//!
//! | offset | width  | field                                        |
//! |--------|--------|----------------------------------------------|
//! | 0      | 1      | age check enabled                            |
//! | 1      | 32     | minimum age, big-endian                      |
//! | 33     | 1      | countries enabled                            |
//! | 34     | 4 × 32 | packed country words, each big-endian        |
//! | 162    | 3 × 1  | sanctions basic, enhanced, comprehensive     |
//!
//! The registry contract computes the same bytes with `abi.encodePacked`.

use url::Url;

use crate::codec::{self, WORD_COUNT};
use crate::error::PolicyError;
use crate::hashing::{ConfigId, Digest32};
use crate::policy::VerificationPolicy;

pub const ENCODED_LEN: usize = 1 + 32 + 1 + 32 * WORD_COUNT + 3;
pub const TOOLS_BASE_URL: &str = "https://tools.self.xyz/";

/// Canonical byte layout of a policy.
pub fn canonical_bytes(policy: &VerificationPolicy) -> Result<Vec<u8>, PolicyError> {
    let packed = codec::pack(policy.excluded_countries())?;

    let mut out = Vec::with_capacity(ENCODED_LEN);
    out.push(policy.age_check_enabled() as u8);
    out.extend_from_slice(&u256_be(u64::from(policy.minimum_age())));
    out.push(policy.countries_enabled() as u8);
    for i in 0..WORD_COUNT {
        out.extend_from_slice(&packed.word_be(i));
    }
    out.extend(policy.sanctions().as_array().iter().map(|f| *f as u8));

    debug_assert_eq!(out.len(), ENCODED_LEN);
    Ok(out)
}

/// Hash a policy to its configuration id. Pure; no network access.
pub fn generate(policy: &VerificationPolicy) -> Result<ConfigId, PolicyError> {
    let bytes = canonical_bytes(policy)?;
    let id = Digest32::of(&bytes);
    tracing::debug!(config_id = %id, "generated config id");
    Ok(id)
}

fn u256_be(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Link to the hosted tool with the policy pre-filled, for deploying a
/// config that is not on-chain yet. Parameters are only emitted when set.
pub fn deploy_url(policy: &VerificationPolicy) -> String {
    let mut params = Vec::new();
    if policy.age_check_enabled() {
        params.push(format!("age={}", policy.minimum_age()));
    }
    if policy.countries_enabled() {
        params.push(format!("countries={}", policy.excluded_countries().join(",")));
    }
    let sanctions = policy.sanctions();
    if sanctions.any() {
        let flags: Vec<_> = sanctions.as_array().iter().map(|f| f.to_string()).collect();
        params.push(format!("ofac={}", flags.join(",")));
    }

    if params.is_empty() {
        return TOOLS_BASE_URL.to_string();
    }
    match Url::parse(TOOLS_BASE_URL) {
        Ok(mut url) => {
            url.set_query(Some(&params.join("&")));
            url.to_string()
        }
        Err(_) => format!("{TOOLS_BASE_URL}?{}", params.join("&")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SanctionsTiers;

    fn policy(age: i64, countries: &[&str], tiers: [bool; 3]) -> VerificationPolicy {
        VerificationPolicy::new(
            age,
            countries.iter().map(|c| c.to_string()).collect(),
            tiers.into(),
        )
        .unwrap()
    }

    #[test]
    fn test_layout_widths() {
        let bytes = canonical_bytes(&policy(18, &["USA", "GBR"], [true, false, true])).unwrap();
        assert_eq!(bytes.len(), 165);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[32], 18);
        assert!(bytes[1..32].iter().all(|b| *b == 0));
        assert_eq!(bytes[33], 1);
        // first country word, big-endian: "USAGBR" read low-byte-first
        assert_eq!(&bytes[34 + 26..34 + 32], &[0x52, 0x42, 0x47, 0x41, 0x53, 0x55]);
        assert!(bytes[66..162].iter().all(|b| *b == 0));
        assert_eq!(&bytes[162..], &[1, 0, 1]);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            generate(&policy(0, &[], [false; 3])).unwrap().to_hex(),
            "0xb26cf7b8241189fc0e21080899fcb88ff11b8d1e58eb1eded5db28ebdcb0e718"
        );
        assert_eq!(
            generate(&policy(18, &[], [false; 3])).unwrap().to_hex(),
            "0x77d2258f6fb2a379d1075d4d82df07c3452f22a1660f54e7ac34f5b5fc3e05bc"
        );
    }

    #[test]
    fn test_deploy_url_params() {
        assert_eq!(deploy_url(&policy(0, &[], [false; 3])), "https://tools.self.xyz/");
        assert_eq!(
            deploy_url(&policy(18, &["IRN", "PRK"], [true, false, false])),
            "https://tools.self.xyz/?age=18&countries=IRN,PRK&ofac=true,false,false"
        );
        assert_eq!(
            deploy_url(&VerificationPolicy::new(21, vec![], SanctionsTiers::default()).unwrap()),
            "https://tools.self.xyz/?age=21"
        );
    }
}
