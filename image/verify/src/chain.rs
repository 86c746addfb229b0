/*++

Licensed under the Apache-2.0 license.

File Name:

    chain.rs

Abstract:

    PPK -> SPK -> partition chain of trust.

--*/

use sboot_drivers::{cprint_digest, cprintln, HashEngine, SignatureEngine};
use sboot_error::{SbootError, SbootResult};
use sboot_image_types::*;

/// Proof that the SPK of `cert` is signed by its PPK
///
/// Only `ChainOfTrustVerifier::verify_spk` creates this token.
#[derive(Debug)]
pub struct SpkVerified<'c> {
    cert: &'c AuthCertificate,
}

impl<'c> SpkVerified<'c> {
    /// Certificate whose SPK was verified
    pub fn cert(&self) -> &'c AuthCertificate {
        self.cert
    }
}

/// Proof that a partition digest is signed by a verified SPK
#[derive(Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Authenticated;

/// Chain of Trust Verifier
pub struct ChainOfTrustVerifier<'a> {
    hash: &'a mut dyn HashEngine,
    rsa: &'a mut dyn SignatureEngine,

    /// Algorithm of the certificate digests
    alg: HashAlgorithm,

    /// Provisioned SHA3-384 digest of the PPK
    ppk_digest: Option<&'a Digest>,
}

impl<'a> ChainOfTrustVerifier<'a> {
    /// Create a new instance `ChainOfTrustVerifier`
    ///
    /// # Arguments
    ///
    /// * `hash` - Hash engine
    /// * `rsa` - RSA engine
    /// * `alg` - Digest algorithm used by the certificates
    /// * `ppk_digest` - Provisioned PPK digest, if any
    pub fn new(
        hash: &'a mut dyn HashEngine,
        rsa: &'a mut dyn SignatureEngine,
        alg: HashAlgorithm,
        ppk_digest: Option<&'a Digest>,
    ) -> Self {
        Self {
            hash,
            rsa,
            alg,
            ppk_digest,
        }
    }

    /// Verify the SPK of `cert` against its PPK
    ///
    /// # Returns
    ///
    /// * `SpkVerified` - Token required by `verify_partition`
    pub fn verify_spk<'c>(&mut self, cert: &'c AuthCertificate) -> SbootResult<SpkVerified<'c>> {
        self.verify_ppk(cert)?;

        let digest = self.spk_digest(cert)?;
        self.verify_signature(
            cert.spk_signature(),
            cert.ppk(),
            &digest,
            SbootError::SPK_SIGNATURE_INVALID,
        )?;

        Ok(SpkVerified { cert })
    }

    /// Verify the partition signature over `digest` with the verified SPK
    pub fn verify_partition(
        &mut self,
        spk: &SpkVerified<'_>,
        digest: &Digest,
    ) -> SbootResult<Authenticated> {
        let cert = spk.cert();
        self.verify_signature(
            cert.partition_signature(),
            cert.spk(),
            digest,
            SbootError::PARTITION_SIGNATURE_INVALID,
        )?;
        Ok(Authenticated)
    }

    /// Digest signed by the partition signature: `payload || cert[..partition_signature]`
    pub fn partition_digest(
        &mut self,
        payload: &[u8],
        cert: &AuthCertificate,
    ) -> SbootResult<Digest> {
        let signed = cert
            .bytes(AuthCertificate::signed_range())
            .ok_or(SbootError::CERT_INVALID_LENGTH)?;
        digest_parts(self.hash, self.alg, &[payload, signed])
    }

    fn verify_ppk(&mut self, cert: &AuthCertificate) -> SbootResult<()> {
        let Some(expected) = self.ppk_digest else {
            return Ok(());
        };
        let ppk = cert
            .bytes(AuthCertificate::ppk_range())
            .ok_or(SbootError::CERT_INVALID_LENGTH)?;
        let actual = self
            .hash
            .digest(HashAlgorithm::Sha3_384, ppk)
            .map_err(|_| SbootError::CERT_DIGEST_FAILURE)?;
        if actual.as_bytes() != expected.as_bytes() {
            cprintln!("[auth] PPK digest mismatch");
            cprint_digest!("[auth]", "expected", expected.as_bytes());
            cprint_digest!("[auth]", "actual", actual.as_bytes());
            Err(SbootError::PPK_DIGEST_MISMATCH)?;
        }
        Ok(())
    }

    fn spk_digest(&mut self, cert: &AuthCertificate) -> SbootResult<Digest> {
        let selector = cert
            .bytes(AuthCertificate::selector_range())
            .ok_or(SbootError::CERT_INVALID_LENGTH)?;
        let ppk = cert
            .bytes(AuthCertificate::ppk_range())
            .ok_or(SbootError::CERT_INVALID_LENGTH)?;
        let spk = cert
            .bytes(AuthCertificate::spk_range())
            .ok_or(SbootError::CERT_INVALID_LENGTH)?;

        digest_parts(self.hash, self.alg, &[selector, ppk, spk])
    }

    fn verify_signature(
        &mut self,
        signature: &RsaBlock,
        key: &RsaPublicKey,
        digest: &Digest,
        err: SbootError,
    ) -> SbootResult<()> {
        let expected =
            pkcs1_v15_encode(self.alg, digest.as_bytes()).ok_or(SbootError::CERT_DIGEST_FAILURE)?;
        let actual = self
            .rsa
            .rsa_decrypt(signature, key)
            .map_err(|_| SbootError::CERT_RSA_DECRYPT_FAILURE)?;

        let diff = expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff != 0 {
            cprintln!("[auth] Signature padding or digest mismatch");
            cprint_digest!("[auth]", "digest", digest.as_bytes());
            Err(err)?;
        }
        Ok(())
    }
}

fn digest_parts(
    hash: &mut dyn HashEngine,
    alg: HashAlgorithm,
    parts: &[&[u8]],
) -> SbootResult<Digest> {
    let mut run = || -> SbootResult<Digest> {
        hash.start(alg)?;
        for part in parts {
            hash.update(part)?;
        }
        hash.finish()
    };
    run().map_err(|_| SbootError::CERT_DIGEST_FAILURE)
}

/// Absorb the certificate bytes covered by the partition signature
pub fn absorb_signed_cert(hash: &mut dyn HashEngine, cert: &AuthCertificate) -> SbootResult<()> {
    let signed = cert
        .bytes(AuthCertificate::signed_range())
        .ok_or(SbootError::CERT_INVALID_LENGTH)?;
    hash.update(signed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hash engine returning a digest of the byte count absorbed
    #[derive(Default)]
    struct TestHash {
        absorbed: usize,
        alg: HashAlgorithm,
    }

    impl TestHash {
        fn digest_for(alg: HashAlgorithm, absorbed: usize) -> Digest {
            let mut digest = Digest::new(alg);
            digest.as_bytes_mut()[..8].copy_from_slice(&(absorbed as u64).to_be_bytes());
            digest
        }
    }

    impl HashEngine for TestHash {
        fn start(&mut self, alg: HashAlgorithm) -> SbootResult<()> {
            self.alg = alg;
            self.absorbed = 0;
            Ok(())
        }

        fn update(&mut self, data: &[u8]) -> SbootResult<()> {
            self.absorbed += data.len();
            Ok(())
        }

        fn running_digest(&mut self) -> SbootResult<Digest> {
            Ok(Self::digest_for(self.alg, self.absorbed))
        }

        fn finish(&mut self) -> SbootResult<Digest> {
            self.running_digest()
        }
    }

    /// RSA engine returning the block stored for the signature's first byte
    #[derive(Default)]
    struct TestRsa {
        blocks: Vec<(u8, RsaBlock)>,
        calls: usize,
    }

    impl SignatureEngine for TestRsa {
        fn rsa_decrypt(
            &mut self,
            signature: &RsaBlock,
            _key: &RsaPublicKey,
        ) -> SbootResult<RsaBlock> {
            self.calls += 1;
            self.blocks
                .iter()
                .find(|(id, _)| *id == signature[0])
                .map(|(_, block)| *block)
                .ok_or(SbootError::DRIVER_RSA_INVALID_KEY)
        }
    }

    const KEYS_LEN: usize = 8 + 2 * 1088;
    const SPK_SIG_ID: u8 = 1;
    const PART_SIG_ID: u8 = 2;

    fn cert() -> AuthCertificate {
        let mut cert = AuthCertificate::default();
        let mut sig = [0u8; RSA_KEY_BYTE_SIZE];
        sig[0] = SPK_SIG_ID;
        cert.set_spk_signature(sig);
        sig[0] = PART_SIG_ID;
        cert.set_partition_signature(sig);
        cert
    }

    fn padded(absorbed: usize) -> RsaBlock {
        let digest = TestHash::digest_for(HashAlgorithm::Sha3_384, absorbed);
        pkcs1_v15_encode(HashAlgorithm::Sha3_384, digest.as_bytes()).unwrap()
    }

    #[test]
    fn test_spk_and_partition_signature() {
        let mut hash = TestHash::default();
        let mut rsa = TestRsa::default();
        rsa.blocks.push((SPK_SIG_ID, padded(KEYS_LEN)));
        rsa.blocks.push((PART_SIG_ID, padded(100 + 0xCC0)));

        let cert = cert();
        let mut verifier =
            ChainOfTrustVerifier::new(&mut hash, &mut rsa, HashAlgorithm::Sha3_384, None);
        let spk = verifier.verify_spk(&cert).unwrap();
        let digest = verifier.partition_digest(&[0u8; 100], &cert).unwrap();
        assert_eq!(verifier.verify_partition(&spk, &digest), Ok(Authenticated));
    }

    #[test]
    fn test_spk_signature_single_byte_flip() {
        let mut hash = TestHash::default();
        let mut rsa = TestRsa::default();
        let mut block = padded(KEYS_LEN);
        block[300] ^= 0x01;
        rsa.blocks.push((SPK_SIG_ID, block));

        let cert = cert();
        let mut verifier =
            ChainOfTrustVerifier::new(&mut hash, &mut rsa, HashAlgorithm::Sha3_384, None);
        assert_eq!(
            verifier.verify_spk(&cert).err(),
            Some(SbootError::SPK_SIGNATURE_INVALID)
        );
    }

    #[test]
    fn test_partition_signature_invalid() {
        let mut hash = TestHash::default();
        let mut rsa = TestRsa::default();
        rsa.blocks.push((SPK_SIG_ID, padded(KEYS_LEN)));
        rsa.blocks.push((PART_SIG_ID, padded(100 + 0xCC0)));

        let cert = cert();
        let mut verifier =
            ChainOfTrustVerifier::new(&mut hash, &mut rsa, HashAlgorithm::Sha3_384, None);
        let spk = verifier.verify_spk(&cert).unwrap();
        let digest = verifier.partition_digest(&[0u8; 101], &cert).unwrap();
        assert_eq!(
            verifier.verify_partition(&spk, &digest).err(),
            Some(SbootError::PARTITION_SIGNATURE_INVALID)
        );
    }

    #[test]
    fn test_rsa_failure() {
        let mut hash = TestHash::default();
        let mut rsa = TestRsa::default();
        let cert = cert();
        let mut verifier =
            ChainOfTrustVerifier::new(&mut hash, &mut rsa, HashAlgorithm::Sha3_384, None);
        assert_eq!(
            verifier.verify_spk(&cert).err(),
            Some(SbootError::CERT_RSA_DECRYPT_FAILURE)
        );
    }

    #[test]
    fn test_ppk_pin_checked_first() {
        let mut hash = TestHash::default();
        let mut rsa = TestRsa::default();
        rsa.blocks.push((SPK_SIG_ID, padded(KEYS_LEN)));
        let cert = cert();

        let pinned = TestHash::digest_for(HashAlgorithm::Sha3_384, 1088);
        let mut verifier = ChainOfTrustVerifier::new(
            &mut hash,
            &mut rsa,
            HashAlgorithm::Sha3_384,
            Some(&pinned),
        );
        assert!(verifier.verify_spk(&cert).is_ok());

        let wrong = TestHash::digest_for(HashAlgorithm::Sha3_384, 1087);
        let mut verifier =
            ChainOfTrustVerifier::new(&mut hash, &mut rsa, HashAlgorithm::Sha3_384, Some(&wrong));
        assert_eq!(
            verifier.verify_spk(&cert).err(),
            Some(SbootError::PPK_DIGEST_MISMATCH)
        );
        assert_eq!(rsa.calls, 1);
    }
}
