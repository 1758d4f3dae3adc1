//! Promo and gift-certificate codes.
//!
//! Codes use an unambiguous uppercase alphabet (no `O`/`0`/`I`/`1`) so they
//! survive being read over the phone or typed from a printed card.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters allowed in generated codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Prefix for wheel-prize promo codes.
const PROMO_PREFIX: &str = "SWEET";

/// Prefix for gift certificate codes.
const CERT_PREFIX: &str = "SD";

/// Errors that can occur when parsing a code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// Wrong prefix or group layout.
    #[error("malformed code")]
    Malformed,
    /// A character outside the code alphabet.
    #[error("code contains an invalid character")]
    BadCharacter,
}

fn random_block(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET.get(idx).copied().map_or('X', char::from)
        })
        .collect()
}

fn block_is_valid(block: &str, len: usize) -> bool {
    block.len() == len && block.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// A promo code granted by the fortune wheel, e.g. `SWEET-7KQ2M`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    /// Length of the random block after the prefix.
    const BLOCK_LEN: usize = 5;

    /// Generate a fresh promo code.
    #[must_use]
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self(format!(
            "{PROMO_PREFIX}-{}",
            random_block(rng, Self::BLOCK_LEN)
        ))
    }

    /// Parse a code entered by a customer. Lowercase input is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] if the prefix, layout, or characters are wrong.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let normalized = s.trim().to_uppercase();
        let block = normalized
            .strip_prefix(PROMO_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or(CodeError::Malformed)?;

        if block.len() != Self::BLOCK_LEN {
            return Err(CodeError::Malformed);
        }
        if !block_is_valid(block, Self::BLOCK_LEN) {
            return Err(CodeError::BadCharacter);
        }

        Ok(Self(normalized))
    }

    /// The code as stored and displayed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A gift certificate code, e.g. `SD-MK4T-9QWE-R2YB`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CertificateCode(String);

impl CertificateCode {
    /// Number of 4-character groups after the prefix.
    const GROUPS: usize = 3;
    /// Characters per group.
    const GROUP_LEN: usize = 4;

    /// Generate a fresh certificate code.
    #[must_use]
    pub fn generate(rng: &mut impl Rng) -> Self {
        let groups: Vec<String> = (0..Self::GROUPS)
            .map(|_| random_block(rng, Self::GROUP_LEN))
            .collect();
        Self(format!("{CERT_PREFIX}-{}", groups.join("-")))
    }

    /// Parse a code entered by a customer. Lowercase input is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] if the prefix, layout, or characters are wrong.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let normalized = s.trim().to_uppercase();
        let rest = normalized
            .strip_prefix(CERT_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or(CodeError::Malformed)?;

        let groups: Vec<&str> = rest.split('-').collect();
        if groups.len() != Self::GROUPS {
            return Err(CodeError::Malformed);
        }
        for group in &groups {
            if group.len() != Self::GROUP_LEN {
                return Err(CodeError::Malformed);
            }
            if !block_is_valid(group, Self::GROUP_LEN) {
                return Err(CodeError::BadCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// The code as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form for lists and logs: only the last group is visible,
    /// e.g. `SD-****-****-R2YB`.
    #[must_use]
    pub fn masked(&self) -> String {
        match self.0.rsplit_once('-') {
            Some((_, last)) => format!("{CERT_PREFIX}-****-****-{last}"),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for CertificateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_promo_generate_parses_back() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = PromoCode::generate(&mut rng);
            assert_eq!(PromoCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_promo_parse_accepts_lowercase() {
        let code = PromoCode::parse("sweet-abcde").unwrap();
        assert_eq!(code.as_str(), "SWEET-ABCDE");
    }

    #[test]
    fn test_promo_parse_rejects_garbage() {
        assert!(PromoCode::parse("").is_err());
        assert!(PromoCode::parse("SWEET-").is_err());
        assert!(PromoCode::parse("SWEET-ABC").is_err());
        assert!(PromoCode::parse("CANDY-ABCDE").is_err());
        // 0 and O are excluded from the alphabet
        assert_eq!(
            PromoCode::parse("SWEET-AB0DE"),
            Err(CodeError::BadCharacter)
        );
    }

    #[test]
    fn test_certificate_generate_parses_back() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let code = CertificateCode::generate(&mut rng);
            assert_eq!(CertificateCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_certificate_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = CertificateCode::generate(&mut rng);
        let parts: Vec<&str> = code.as_str().split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts.first().copied(), Some("SD"));
        assert!(parts.iter().skip(1).all(|g| g.len() == 4));
    }

    #[test]
    fn test_certificate_parse_rejects_bad_layout() {
        assert!(CertificateCode::parse("SD-ABCD-EFGH").is_err());
        assert!(CertificateCode::parse("SD-ABCD-EFGH-JKLM-NPQR").is_err());
        assert!(CertificateCode::parse("XX-ABCD-EFGH-JKLM").is_err());
        assert!(CertificateCode::parse("SD-AB!D-EFGH-JKLM").is_err());
    }

    #[test]
    fn test_certificate_masked_keeps_last_group() {
        let code = CertificateCode::parse("SD-MK4T-9QWE-R2YB").unwrap();
        assert_eq!(code.masked(), "SD-****-****-R2YB");
    }
}
