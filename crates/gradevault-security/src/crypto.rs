//! Field-level encryption
//!
//! Sensitive scalar fields are stored as `ivBase64:ciphertextBase64` with a
//! fresh random IV per encryption call, AES-CBC with PKCS#7 padding. An
//! encrypted column is named `<logical>_encrypted`; decryption populates the
//! parallel `<logical>` key and never overwrites the ciphertext in place.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use base64::Engine;
use rand::RngCore;
use serde_json::Value;
use tracing::warn;

use gradevault_common::error::{CryptoError, Error, Result};
use gradevault_common::types::{Record, ENCRYPTED_SUFFIX};

const IV_SIZE: usize = 16;

/// Placeholder substituted for a field that failed to decrypt, so one corrupt
/// record does not abort an entire listing
pub const DECRYPTION_FAILED_PLACEHOLDER: &str = "**decryption failed**";

use base64::engine::general_purpose::STANDARD as B64_ENGINE;

/// Symmetric field cipher, built once from the startup key
pub struct FieldCipher {
    key: CipherKey,
}

// The aes crate fixes the key size in the type, so the validated key is held
// behind a per-size variant.
enum CipherKey {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

impl FieldCipher {
    /// Build a cipher from raw key material. Rejects any length other than
    /// 16/24/32 bytes so misconfiguration fails at startup.
    pub fn new(key: &[u8]) -> Result<Self> {
        let key = match key.len() {
            16 => {
                let mut k = [0u8; 16];
                k.copy_from_slice(key);
                CipherKey::Aes128(k)
            }
            24 => {
                let mut k = [0u8; 24];
                k.copy_from_slice(key);
                CipherKey::Aes192(k)
            }
            32 => {
                let mut k = [0u8; 32];
                k.copy_from_slice(key);
                CipherKey::Aes256(k)
            }
            len => return Err(Error::Crypto(CryptoError::InvalidKey(len))),
        };
        Ok(Self { key })
    }

    /// Encrypt a plaintext field. Blank input returns `None` by contract.
    ///
    /// A fresh IV is generated per call, so encrypting the same plaintext
    /// twice yields different ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        if plaintext.trim().is_empty() {
            return None;
        }

        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = match &self.key {
            CipherKey::Aes128(key) => cbc::Encryptor::<Aes128>::new(key.into(), &iv.into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            CipherKey::Aes192(key) => cbc::Encryptor::<Aes192>::new(key.into(), &iv.into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            CipherKey::Aes256(key) => cbc::Encryptor::<Aes256>::new(key.into(), &iv.into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
        };

        Some(format!(
            "{}:{}",
            B64_ENGINE.encode(iv),
            B64_ENGINE.encode(ciphertext)
        ))
    }

    /// Decrypt an `iv:ciphertext` field. Pure: the same input always yields
    /// the same plaintext or fails with `DecryptionError`.
    pub fn decrypt(&self, field: &str) -> Result<String> {
        let parts: Vec<&str> = field.split(':').collect();
        if parts.len() != 2 {
            return Err(decryption_failed("malformed field, expected iv:ciphertext"));
        }

        let iv = B64_ENGINE
            .decode(parts[0])
            .map_err(|_| decryption_failed("IV is not valid base64"))?;
        let ciphertext = B64_ENGINE
            .decode(parts[1])
            .map_err(|_| decryption_failed("ciphertext is not valid base64"))?;

        let iv: [u8; IV_SIZE] = iv
            .as_slice()
            .try_into()
            .map_err(|_| decryption_failed("IV must be 16 bytes"))?;

        let plaintext = match &self.key {
            CipherKey::Aes128(key) => cbc::Decryptor::<Aes128>::new(key.into(), &iv.into())
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
            CipherKey::Aes192(key) => cbc::Decryptor::<Aes192>::new(key.into(), &iv.into())
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
            CipherKey::Aes256(key) => cbc::Decryptor::<Aes256>::new(key.into(), &iv.into())
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext),
        }
        .map_err(|_| decryption_failed("bad padding"))?;

        String::from_utf8(plaintext).map_err(|_| decryption_failed("plaintext is not UTF-8"))
    }

    /// Decrypt every `*_encrypted` column of a record in place.
    ///
    /// Each decrypted value lands under the suffix-stripped key; per-field
    /// failures substitute [`DECRYPTION_FAILED_PLACEHOLDER`] instead of
    /// propagating, and the ciphertext column is left untouched.
    pub fn decrypt_record(&self, record: &mut Record) {
        let encrypted: Vec<(String, String)> = record
            .iter()
            .filter_map(|(key, value)| {
                let logical = key.strip_suffix(ENCRYPTED_SUFFIX)?;
                if logical.is_empty() {
                    return None;
                }
                let ciphertext = value.as_str()?;
                Some((logical.to_string(), ciphertext.to_string()))
            })
            .collect();

        for (logical, ciphertext) in encrypted {
            let plaintext = match self.decrypt(&ciphertext) {
                Ok(plaintext) => plaintext,
                Err(e) => {
                    warn!(column = %logical, error = %e, "field decryption failed, substituting placeholder");
                    DECRYPTION_FAILED_PLACEHOLDER.to_string()
                }
            };
            record.insert(logical, Value::String(plaintext));
        }
    }

    /// Decrypt every `*_encrypted` column of each record in a listing
    pub fn decrypt_records(&self, records: &mut [Record]) {
        for record in records {
            self.decrypt_record(record);
        }
    }
}

fn decryption_failed(msg: &str) -> Error {
    Error::Crypto(CryptoError::DecryptionFailed(msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cipher() -> FieldCipher {
        FieldCipher::new(&[7u8; 16]).unwrap()
    }

    #[test]
    fn test_key_length_validated() {
        assert!(FieldCipher::new(&[0u8; 16]).is_ok());
        assert!(FieldCipher::new(&[0u8; 24]).is_ok());
        assert!(FieldCipher::new(&[0u8; 32]).is_ok());
        assert!(matches!(
            FieldCipher::new(&[0u8; 20]),
            Err(Error::Crypto(CryptoError::InvalidKey(20)))
        ));
    }

    #[test]
    fn test_roundtrip() {
        let cipher = cipher();
        for plaintext in ["91.5", "hello world", "Ünïcodé 成绩 ✓"] {
            let field = cipher.encrypt(plaintext).unwrap();
            assert_eq!(cipher.decrypt(&field).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let cipher = cipher();
        let a = cipher.encrypt("91.5").unwrap();
        let b = cipher.encrypt("91.5").unwrap();
        // Required property: same plaintext twice yields different ciphertext
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn test_blank_input_encrypts_to_nothing() {
        let cipher = cipher();
        assert!(cipher.encrypt("").is_none());
        assert!(cipher.encrypt("   ").is_none());
    }

    #[test]
    fn test_malformed_field_fails() {
        let cipher = cipher();
        for field in ["no-separator", "a:b:c", "!!!:AAAA", "AAAAAAAAAAAAAAAAAAAAAA==:!!!"] {
            assert!(matches!(
                cipher.decrypt(field),
                Err(Error::Crypto(CryptoError::DecryptionFailed(_)))
            ));
        }
    }

    #[test]
    fn test_wrong_key_fails_not_garbage() {
        let a = FieldCipher::new(&[1u8; 16]).unwrap();
        let b = FieldCipher::new(&[2u8; 16]).unwrap();
        let field = a.encrypt("secret").unwrap();
        // CBC with PKCS#7: wrong key almost always surfaces as a padding error
        assert!(b.decrypt(&field).is_err() || b.decrypt(&field).unwrap() != "secret");
    }

    #[test]
    fn test_decrypt_record_populates_logical_key() {
        let cipher = cipher();
        let field = cipher.encrypt("95").unwrap();

        let mut record = Record::new();
        record.insert("record_id".to_string(), json!(1));
        record.insert("score_encrypted".to_string(), json!(field.clone()));

        cipher.decrypt_record(&mut record);
        assert_eq!(record["score"], "95");
        // Ciphertext column never overwritten in place
        assert_eq!(record["score_encrypted"], field);
    }

    #[test]
    fn test_decrypt_record_substitutes_placeholder() {
        let cipher = cipher();
        let mut record = Record::new();
        record.insert("score_encrypted".to_string(), json!("corrupted"));

        cipher.decrypt_record(&mut record);
        assert_eq!(record["score"], DECRYPTION_FAILED_PLACEHOLDER);
        assert_eq!(record["score_encrypted"], "corrupted");
    }

    #[test]
    fn test_decrypt_records_survives_one_corrupt_row() {
        let cipher = cipher();
        let good = cipher.encrypt("88").unwrap();

        let mut rows = vec![Record::new(), Record::new()];
        rows[0].insert("score_encrypted".to_string(), json!(good));
        rows[1].insert("score_encrypted".to_string(), json!("bad:field"));

        cipher.decrypt_records(&mut rows);
        assert_eq!(rows[0]["score"], "88");
        assert_eq!(rows[1]["score"], DECRYPTION_FAILED_PLACEHOLDER);
    }
}
