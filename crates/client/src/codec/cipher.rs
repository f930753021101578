//! Symmetric content encryption.
//!
//! AES-256-CBC with PKCS7 padding. The key is derived once per cipher from
//! the schema namespace and a configured salt via PBKDF2-HMAC-SHA1, so both
//! ends derive the same key without exchanging it. Each encryption draws a
//! fresh random IV; the output frames the IV ahead of the ciphertext
//! (4-byte little-endian IV length, IV, ciphertext) and base64-encodes the
//! whole buffer.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;

use gamebus_domain::SCHEMA_NAMESPACE;

use crate::error::ClientError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const PBKDF2_ROUNDS: u32 = 1000;

pub(crate) struct ContentCipher {
    key: [u8; KEY_LEN],
}

impl ContentCipher {
    pub(crate) fn new(salt: &str) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<sha1::Sha1>(
            SCHEMA_NAMESPACE.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            &mut key,
        );
        Self { key }
    }

    pub(crate) fn encrypt(&self, plaintext: &str) -> Result<String, ClientError> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let encryptor = Aes256CbcEnc::new_from_slices(&self.key, &iv)
            .map_err(|e| ClientError::auth(format!("invalid cipher parameters: {e}")))?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut framed = Vec::with_capacity(4 + IV_LEN + ciphertext.len());
        framed.extend_from_slice(&(IV_LEN as u32).to_le_bytes());
        framed.extend_from_slice(&iv);
        framed.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(framed))
    }

    pub(crate) fn decrypt(&self, content: &str) -> Result<String, ClientError> {
        let framed = BASE64
            .decode(content.trim())
            .map_err(|e| ClientError::decode(format!("invalid base64 ciphertext: {e}")))?;

        if framed.len() < 4 {
            return Err(ClientError::decode("ciphertext missing IV length"));
        }
        let mut raw_len = [0u8; 4];
        raw_len.copy_from_slice(&framed[..4]);
        let iv_len = u32::from_le_bytes(raw_len) as usize;

        if iv_len != IV_LEN || framed.len() < 4 + iv_len {
            return Err(ClientError::decode("ciphertext IV frame is malformed"));
        }
        let (iv, ciphertext) = framed[4..].split_at(iv_len);

        let decryptor = Aes256CbcDec::new_from_slices(&self.key, iv)
            .map_err(|e| ClientError::decode(format!("invalid cipher parameters: {e}")))?;
        let plaintext = decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| ClientError::decode("decryption failed"))?;

        String::from_utf8(plaintext)
            .map_err(|e| ClientError::decode(format!("decrypted content is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_then_decrypt_round_trips() {
        let cipher = ContentCipher::new("abc");
        let ciphertext = cipher.encrypt("hello world").expect("encrypt");
        assert_eq!(cipher.decrypt(&ciphertext).expect("decrypt"), "hello world");
    }

    #[test]
    fn test_same_plaintext_yields_distinct_ciphertexts() {
        let cipher = ContentCipher::new("abc");
        let first = cipher.encrypt("payload").expect("encrypt");
        let second = cipher.encrypt("payload").expect("encrypt");

        // random IV per encryption
        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).expect("decrypt"), "payload");
        assert_eq!(cipher.decrypt(&second).expect("decrypt"), "payload");
    }

    #[test]
    fn test_wrong_salt_fails_to_decrypt() {
        let ciphertext = ContentCipher::new("abc").encrypt("payload").expect("encrypt");
        let other = ContentCipher::new("different-salt");
        // padding validation almost always rejects the wrong key; if it
        // slips through, the recovered bytes cannot match the plaintext
        match other.decrypt(&ciphertext) {
            Err(_) => {}
            Ok(recovered) => assert_ne!(recovered, "payload"),
        }
    }

    #[test]
    fn test_malformed_ciphertext_is_a_decode_error() {
        let cipher = ContentCipher::new("abc");
        assert!(matches!(
            cipher.decrypt("%%%not-base64%%%"),
            Err(ClientError::Decode(_))
        ));
        assert!(cipher.decrypt(&BASE64.encode([0u8; 2])).is_err());
    }
}
