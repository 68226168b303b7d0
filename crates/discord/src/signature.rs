//! Ed25519 request signature gate.
//!
//! The platform signs `timestamp ‖ raw_body` with the application's key and
//! sends the signature and timestamp as headers. Verification happens before
//! any body parsing; a failure is terminal for the request.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("public key is not 32 bytes of hex")]
    MalformedKey,
    #[error("signature header is not 64 bytes of hex")]
    MalformedSignature,
    #[error("request signature did not verify")]
    Invalid,
}

/// Holds the application's verifying key; constructed once at bootstrap.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key_hex.trim()).map_err(|_| SignatureError::MalformedKey)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::MalformedKey)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::MalformedKey)?;
        Ok(Self { key })
    }

    /// Verifies `signature_hex` over `timestamp ‖ body`.
    pub fn verify(
        &self,
        timestamp: &str,
        body: &[u8],
        signature_hex: &str,
    ) -> Result<(), SignatureError> {
        let bytes =
            hex::decode(signature_hex.trim()).map_err(|_| SignatureError::MalformedSignature)?;
        let bytes: [u8; 64] =
            bytes.try_into().map_err(|_| SignatureError::MalformedSignature)?;
        let signature = Signature::from_bytes(&bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify(&message, &signature).map_err(|_| SignatureError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::{SignatureError, SignatureVerifier};

    fn keypair() -> (SigningKey, SignatureVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(signing.verifying_key().to_bytes()))
                .expect("valid key");
        (signing, verifier)
    }

    fn sign(signing: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing.sign(&message).to_bytes())
    }

    #[test]
    fn accepts_a_correctly_signed_request() {
        let (signing, verifier) = keypair();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing, "1700000000", body);

        assert_eq!(verifier.verify("1700000000", body, &signature), Ok(()));
    }

    #[test]
    fn rejects_signature_over_different_timestamp_or_body() {
        let (signing, verifier) = keypair();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing, "1700000000", body);

        assert_eq!(
            verifier.verify("1700000001", body, &signature),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            verifier.verify("1700000000", br#"{"type":2}"#, &signature),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn rejects_signatures_from_a_different_key() {
        let (_, verifier) = keypair();
        let other = SigningKey::from_bytes(&[9u8; 32]);
        let body = b"payload";
        let forged = sign(&other, "1700000000", body);

        assert_eq!(verifier.verify("1700000000", body, &forged), Err(SignatureError::Invalid));
    }

    #[test]
    fn rejects_malformed_hex_inputs() {
        let (_, verifier) = keypair();
        assert_eq!(
            verifier.verify("ts", b"body", "zz-not-hex"),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verifier.verify("ts", b"body", &"ab".repeat(10)),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            SignatureVerifier::from_hex("deadbeef").unwrap_err(),
            SignatureError::MalformedKey
        );
    }
}
