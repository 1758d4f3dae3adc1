//! Robokassa payment helper.
//!
//! No HTTP calls: Robokassa interaction is a redirect to a signed payment
//! URL, plus verification of the signed `ResultURL` callback. Signatures
//! use the SHA-256 algorithm variant (selected in the merchant panel).
//!
//! - Payment URL signature: `sha256(login:out_sum:inv_id:password1)`
//! - ResultURL signature:   `sha256(out_sum:inv_id:password2)`

use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use url::Url;

use sweet_delights_core::{Money, OrderId};

use crate::config::RobokassaConfig;

/// Payment page endpoint.
const PAYMENT_URL: &str = "https://auth.robokassa.ru/Merchant/Index.aspx";

/// Robokassa payment URL builder and callback verifier.
#[derive(Clone)]
pub struct RobokassaClient {
    merchant_login: String,
    password_1: secrecy::SecretString,
    password_2: secrecy::SecretString,
    test_mode: bool,
}

impl RobokassaClient {
    /// Create a new Robokassa helper from config.
    #[must_use]
    pub fn new(config: &RobokassaConfig) -> Self {
        Self {
            merchant_login: config.merchant_login.clone(),
            password_1: config.password_1.clone(),
            password_2: config.password_2.clone(),
            test_mode: config.test_mode,
        }
    }

    /// Build the signed payment URL for an order.
    ///
    /// `out_sum` must be the order's payable total; the signature pins it.
    ///
    /// # Panics
    ///
    /// Never; the endpoint literal is a valid URL.
    #[must_use]
    pub fn payment_url(&self, inv_id: OrderId, out_sum: Money, description: &str) -> Url {
        let out_sum = out_sum.to_payment_string();
        let signature = sha256_hex(&format!(
            "{}:{}:{}:{}",
            self.merchant_login,
            out_sum,
            inv_id,
            self.password_1.expose_secret()
        ));

        let mut url = Url::parse(PAYMENT_URL).expect("payment endpoint literal parses");
        url.query_pairs_mut()
            .append_pair("MerchantLogin", &self.merchant_login)
            .append_pair("OutSum", &out_sum)
            .append_pair("InvId", &inv_id.to_string())
            .append_pair("Description", description)
            .append_pair("SignatureValue", &signature);
        if self.test_mode {
            url.query_pairs_mut().append_pair("IsTest", "1");
        }

        url
    }

    /// Verify a `ResultURL` callback signature.
    ///
    /// `out_sum` arrives as the literal string Robokassa echoes back; it
    /// must be hashed verbatim, not reformatted.
    #[must_use]
    pub fn verify_result(&self, out_sum: &str, inv_id: OrderId, signature: &str) -> bool {
        let expected = self.result_signature(out_sum, inv_id);
        // Robokassa sends the hex in arbitrary case
        expected.eq_ignore_ascii_case(signature)
    }

    /// The response body Robokassa expects from a handled `ResultURL`.
    #[must_use]
    pub fn result_ack(inv_id: OrderId) -> String {
        format!("OK{inv_id}")
    }

    fn result_signature(&self, out_sum: &str, inv_id: OrderId) -> String {
        sha256_hex(&format!(
            "{}:{}:{}",
            out_sum,
            inv_id,
            self.password_2.expose_secret()
        ))
    }
}

impl std::fmt::Debug for RobokassaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobokassaClient")
            .field("merchant_login", &self.merchant_login)
            .field("test_mode", &self.test_mode)
            .finish_non_exhaustive()
    }
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        // writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(test_mode: bool) -> RobokassaClient {
        RobokassaClient {
            merchant_login: "sweet-delights".to_owned(),
            password_1: SecretString::from("pw-one-8Gk2mQ"),
            password_2: SecretString::from("pw-two-4Xn9rT"),
            test_mode,
        }
    }

    #[test]
    fn test_sha256_hex_shape() {
        let hex = sha256_hex("anything");
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex, hex.to_lowercase());
        // deterministic
        assert_eq!(hex, sha256_hex("anything"));
        assert_ne!(hex, sha256_hex("anything else"));
    }

    #[test]
    fn test_payment_url_carries_signed_params() {
        let url = client(false).payment_url(OrderId::new(1042), Money::from_rubles(1499), "Order");

        assert_eq!(url.host_str(), Some("auth.robokassa.ru"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("MerchantLogin"), "sweet-delights");
        assert_eq!(get("OutSum"), "1499.00");
        assert_eq!(get("InvId"), "1042");
        assert_eq!(get("SignatureValue").len(), 64);
        assert!(!pairs.iter().any(|(k, _)| k == "IsTest"));
    }

    #[test]
    fn test_payment_url_test_mode_flag() {
        let url = client(true).payment_url(OrderId::new(1), Money::from_rubles(10), "Order");
        assert!(url.query_pairs().any(|(k, v)| k == "IsTest" && v == "1"));
    }

    #[test]
    fn test_verify_result_roundtrip() {
        let client = client(false);
        let inv_id = OrderId::new(1042);
        let signature = client.result_signature("1499.00", inv_id);

        assert!(client.verify_result("1499.00", inv_id, &signature));
        // hex case must not matter
        assert!(client.verify_result("1499.00", inv_id, &signature.to_uppercase()));
    }

    #[test]
    fn test_verify_result_rejects_tampering() {
        let client = client(false);
        let inv_id = OrderId::new(1042);
        let signature = client.result_signature("1499.00", inv_id);

        // changed amount, changed invoice, garbage signature
        assert!(!client.verify_result("9999.00", inv_id, &signature));
        assert!(!client.verify_result("1499.00", OrderId::new(1), &signature));
        assert!(!client.verify_result("1499.00", inv_id, "deadbeef"));
    }

    #[test]
    fn test_result_ack_format() {
        assert_eq!(RobokassaClient::result_ack(OrderId::new(77)), "OK77");
    }
}
