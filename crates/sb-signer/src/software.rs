//! Software signer backed by aws-lc-rs.
//!
//! Holds private keys in process memory. This is the deployment story for
//! server-side batch signing with file-based keys, and doubles as a
//! realistic stand-in for hardware signers in tests. Keys are registered
//! together with their certificate metadata; no certificate parsing or
//! validation happens here.

use async_trait::async_trait;
use aws_lc_rs::digest::{digest, SHA256};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    self, EcdsaKeyPair, RsaKeyPair, ECDSA_P384_SHA384_ASN1_SIGNING,
};
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use sb_core::event::{Event, EventType};
use sb_core::DigestAlgorithm;

use crate::certificate::{Certificate, CertificateFilter};
use crate::error::{SignerError, SignerResult};
use crate::preauth::Preauthorization;
use crate::provider::LocalSigner;

enum SigningKey {
    Ecdsa(EcdsaKeyPair),
    Rsa(RsaKeyPair),
}

struct KeyEntry {
    certificate: Certificate,
    key: SigningKey,
}

/// In-process signer over PKCS#8 keys.
#[derive(Default)]
pub struct SoftwareSigner {
    keys: RwLock<Vec<KeyEntry>>,
}

impl SoftwareSigner {
    /// Creates an empty signer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ECDSA P-384 key from PKCS#8 DER bytes.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the key cannot be parsed.
    pub fn add_ecdsa_key(&self, certificate: Certificate, pkcs8_der: &[u8]) -> SignerResult<()> {
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, pkcs8_der)
            .map_err(|e| SignerError::InvalidKey(format!("invalid ECDSA PKCS#8 key: {e}")))?;
        self.keys.write().push(KeyEntry {
            certificate,
            key: SigningKey::Ecdsa(key_pair),
        });
        Ok(())
    }

    /// Registers an RSA key from PKCS#8 DER bytes.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the key cannot be parsed.
    pub fn add_rsa_key(&self, certificate: Certificate, pkcs8_der: &[u8]) -> SignerResult<()> {
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8_der)
            .map_err(|e| SignerError::InvalidKey(format!("invalid RSA PKCS#8 key: {e}")))?;
        self.keys.write().push(KeyEntry {
            certificate,
            key: SigningKey::Rsa(key_pair),
        });
        Ok(())
    }

    /// Generates a fresh ECDSA P-384 key with synthetic certificate
    /// metadata and registers it, returning the certificate.
    ///
    /// Intended for demos and tests where no real certificate exists.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::Signing` if key generation fails.
    pub fn generate_ecdsa(&self, subject: impl Into<String>) -> SignerResult<Certificate> {
        let document = EcdsaKeyPair::generate_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, &SystemRandom::new())
            .map_err(|e| SignerError::Signing(format!("key generation failed: {e}")))?;

        let now = Utc::now();
        let certificate = Certificate {
            thumbprint: hex_thumbprint(document.as_ref()),
            subject: subject.into(),
            issuer: "sigbatch software CA".to_string(),
            not_before: now,
            not_after: now + Duration::days(365),
        };
        self.add_ecdsa_key(certificate.clone(), document.as_ref())?;
        Ok(certificate)
    }
}

#[async_trait]
impl LocalSigner for SoftwareSigner {
    async fn list_certificates(
        &self,
        filter: &CertificateFilter,
    ) -> SignerResult<Vec<Certificate>> {
        Ok(self
            .keys
            .read()
            .iter()
            .map(|entry| entry.certificate.clone())
            .filter(|certificate| filter.matches(certificate))
            .collect())
    }

    async fn preauthorize(&self, thumbprint: &str, count: u32) -> SignerResult<Preauthorization> {
        let known = self
            .keys
            .read()
            .iter()
            .any(|entry| entry.certificate.thumbprint == thumbprint);
        if !known {
            return Err(SignerError::CertificateNotFound(thumbprint.to_string()));
        }

        // A software store has no user to prompt; consent is implicit.
        Event::builder(EventType::Preauthorized)
            .certificate(thumbprint)
            .detail("operations", count.to_string())
            .build()
            .emit();
        Ok(Preauthorization::new(thumbprint, count))
    }

    async fn sign(
        &self,
        authorization: &Preauthorization,
        data: &[u8],
        algorithm: DigestAlgorithm,
    ) -> SignerResult<Vec<u8>> {
        if data.is_empty() {
            return Err(SignerError::InvalidData("nothing to sign".to_string()));
        }

        let keys = self.keys.read();
        let entry = keys
            .iter()
            .find(|entry| entry.certificate.thumbprint == authorization.thumbprint())
            .ok_or_else(|| {
                SignerError::CertificateNotFound(authorization.thumbprint().to_string())
            })?;

        // The aws-lc-rs key pair APIs hash the message themselves, so the
        // data is passed whole; an authorization slot is only consumed
        // once the request is known to be signable.
        let rng = SystemRandom::new();
        match &entry.key {
            SigningKey::Ecdsa(key_pair) => {
                // ECDSA keys are registered against the P-384/SHA-384 scheme.
                if algorithm != DigestAlgorithm::Sha384 {
                    return Err(SignerError::UnsupportedAlgorithm(format!(
                        "ECDSA P-384 keys sign with sha-384, not {algorithm}"
                    )));
                }
                authorization.consume()?;
                let signature = key_pair
                    .sign(&rng, data)
                    .map_err(|e| SignerError::Signing(format!("ECDSA signing failed: {e}")))?;
                Ok(signature.as_ref().to_vec())
            }
            SigningKey::Rsa(key_pair) => {
                let padding = match algorithm {
                    DigestAlgorithm::Sha256 => &signature::RSA_PKCS1_SHA256,
                    DigestAlgorithm::Sha384 => &signature::RSA_PKCS1_SHA384,
                    DigestAlgorithm::Sha512 => &signature::RSA_PKCS1_SHA512,
                };
                authorization.consume()?;
                let mut raw = vec![0u8; key_pair.public_modulus_len()];
                key_pair
                    .sign(padding, &rng, data, &mut raw)
                    .map_err(|e| SignerError::Signing(format!("RSA signing failed: {e}")))?;
                Ok(raw)
            }
        }
    }
}

/// Hex-encoded SHA-256 thumbprint over the given bytes.
fn hex_thumbprint(data: &[u8]) -> String {
    let hash = digest(&SHA256, data);
    hash.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_certificate_is_listed() {
        let signer = SoftwareSigner::new();
        let certificate = signer.generate_ecdsa("Test Signer").unwrap();

        let listed = signer
            .list_certificates(&CertificateFilter::any())
            .await
            .unwrap();
        assert_eq!(listed, vec![certificate]);
    }

    #[tokio::test]
    async fn preauthorize_unknown_certificate_fails() {
        let signer = SoftwareSigner::new();
        let error = signer.preauthorize("missing", 3).await.unwrap_err();
        assert!(matches!(error, SignerError::CertificateNotFound(_)));
    }

    #[tokio::test]
    async fn sign_consumes_authorization() {
        let signer = SoftwareSigner::new();
        let certificate = signer.generate_ecdsa("Test Signer").unwrap();
        let auth = signer
            .preauthorize(&certificate.thumbprint, 1)
            .await
            .unwrap();

        let data = b"payload to sign";
        let raw = signer
            .sign(&auth, data, DigestAlgorithm::Sha384)
            .await
            .unwrap();
        assert!(!raw.is_empty());
        assert_eq!(auth.remaining(), 0);

        let error = signer
            .sign(&auth, data, DigestAlgorithm::Sha384)
            .await
            .unwrap_err();
        assert!(matches!(error, SignerError::AuthorizationExhausted(1)));
    }

    #[tokio::test]
    async fn signature_verifies_against_the_data_as_message() {
        use aws_lc_rs::signature::{KeyPair, UnparsedPublicKey, ECDSA_P384_SHA384_ASN1};

        let pkcs8 =
            EcdsaKeyPair::generate_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, &SystemRandom::new())
                .unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_ASN1_SIGNING, pkcs8.as_ref()).unwrap();

        let now = Utc::now();
        let certificate = Certificate {
            thumbprint: "cafe".to_string(),
            subject: "Verify Signer".to_string(),
            issuer: "Test CA".to_string(),
            not_before: now,
            not_after: now + Duration::days(1),
        };
        let signer = SoftwareSigner::new();
        signer
            .add_ecdsa_key(certificate.clone(), pkcs8.as_ref())
            .unwrap();
        let auth = signer
            .preauthorize(&certificate.thumbprint, 1)
            .await
            .unwrap();

        let data = b"backend-assembled signature input";
        let raw = signer
            .sign(&auth, data, DigestAlgorithm::Sha384)
            .await
            .unwrap();

        // The scheme hashes the data exactly once: the raw signature must
        // verify with the data itself as the message.
        let public_key =
            UnparsedPublicKey::new(&ECDSA_P384_SHA384_ASN1, key_pair.public_key().as_ref());
        public_key.verify(data, &raw).unwrap();
    }

    #[tokio::test]
    async fn mismatched_ecdsa_algorithm_is_rejected() {
        let signer = SoftwareSigner::new();
        let certificate = signer.generate_ecdsa("Test Signer").unwrap();
        let auth = signer
            .preauthorize(&certificate.thumbprint, 1)
            .await
            .unwrap();

        let error = signer
            .sign(&auth, b"payload", DigestAlgorithm::Sha256)
            .await
            .unwrap_err();
        assert!(matches!(error, SignerError::UnsupportedAlgorithm(_)));
        // The slot is only consumed once the request is signable
        assert_eq!(auth.remaining(), 1);
    }

    #[tokio::test]
    async fn empty_data_is_rejected_before_consuming_a_slot() {
        let signer = SoftwareSigner::new();
        let certificate = signer.generate_ecdsa("Test Signer").unwrap();
        let auth = signer
            .preauthorize(&certificate.thumbprint, 1)
            .await
            .unwrap();

        let error = signer
            .sign(&auth, &[], DigestAlgorithm::Sha384)
            .await
            .unwrap_err();
        assert!(matches!(error, SignerError::InvalidData(_)));
        assert_eq!(auth.remaining(), 1);
    }
}
