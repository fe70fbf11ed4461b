use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use loco_rs::prelude::*;
use rand::RngCore;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::api_credential::ApiCredential;
use crate::services::errors::VaultError;

const NONCE_LEN: usize = 12;

pub struct EncryptedPayload {
    pub ciphertext_b64: String,
    pub iv_b64: String,
    pub tag_b64: String,
}

/// Masked, non-sensitive view of a stored credential, safe to return from a list endpoint.
#[derive(Serialize)]
pub struct MaskedCredential {
    pub id: Uuid,
    pub provider_name: String,
    pub masked_key: String,
    pub created_at: chrono::NaiveDateTime,
    pub last_used_at: Option<chrono::NaiveDateTime>,
}

/// Decrypted key/secret pair for internal use by the enrichment activity only.
pub struct DecryptedCredential {
    pub key: String,
    pub secret: String,
}

#[derive(Clone)]
pub struct CredentialVault {
    master_key: [u8; 32],
}

impl CredentialVault {
    pub fn new(master_key: &[u8]) -> Result<Self, VaultError> {
        let master_key: [u8; 32] =
            master_key.try_into().map_err(|_| VaultError::InvalidMasterKeyLength)?;
        Ok(Self { master_key })
    }

    /// `HKDF-SHA256(masterKey, salt=SHA256(workspaceId), info=workspaceId, length=32)`.
    pub fn derive_workspace_key(&self, workspace_id: Uuid) -> [u8; 32] {
        let workspace_bytes = workspace_id.as_bytes();
        let salt = Sha256::digest(workspace_bytes);

        let hk = Hkdf::<Sha256>::new(Some(&salt), &self.master_key);
        let mut okm = [0u8; 32];
        hk.expand(workspace_bytes, &mut okm).expect("32 bytes is a valid HKDF-SHA256 output length");
        okm
    }

    /// Encrypts with a random 12-byte IV, then immediately decrypts and compares to the
    /// plaintext (write-verify); a mismatch is a fatal internal error, not a recoverable one.
    pub fn encrypt(&self, plaintext: &[u8], key: &[u8; 32]) -> Result<EncryptedPayload, VaultError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext_with_tag = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| VaultError::WriteVerifyFailed)?;

        let tag_start = ciphertext_with_tag.len() - 16;
        let (ciphertext, tag) = ciphertext_with_tag.split_at(tag_start);

        let payload = EncryptedPayload {
            ciphertext_b64: BASE64.encode(ciphertext),
            iv_b64: BASE64.encode(nonce_bytes),
            tag_b64: BASE64.encode(tag),
        };

        let verify = self.decrypt(&payload.ciphertext_b64, &payload.iv_b64, &payload.tag_b64, key)?;
        if verify != plaintext {
            return Err(VaultError::WriteVerifyFailed);
        }

        Ok(payload)
    }

    pub fn decrypt(
        &self,
        ciphertext_b64: &str,
        iv_b64: &str,
        tag_b64: &str,
        key: &[u8; 32],
    ) -> Result<Vec<u8>, VaultError> {
        let ciphertext = BASE64.decode(ciphertext_b64).map_err(|_| VaultError::MalformedCiphertext)?;
        let iv = BASE64.decode(iv_b64).map_err(|_| VaultError::MalformedCiphertext)?;
        let tag = BASE64.decode(tag_b64).map_err(|_| VaultError::MalformedCiphertext)?;

        if iv.len() != NONCE_LEN {
            return Err(VaultError::MalformedCiphertext);
        }

        let mut combined = ciphertext;
        combined.extend_from_slice(&tag);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        let nonce = Nonce::from_slice(&iv);

        cipher.decrypt(nonce, combined.as_ref()).map_err(|_| VaultError::DecryptionFailed)
    }

    fn pack_secret(payload: &EncryptedPayload) -> String {
        format!("{}:{}:{}", payload.iv_b64, payload.tag_b64, payload.ciphertext_b64)
    }

    fn unpack_secret(packed: &str) -> Result<(String, String, String), VaultError> {
        let mut parts = packed.splitn(3, ':');
        let iv = parts.next().ok_or(VaultError::MalformedCiphertext)?.to_string();
        let tag = parts.next().ok_or(VaultError::MalformedCiphertext)?.to_string();
        let ciphertext = parts.next().ok_or(VaultError::MalformedCiphertext)?.to_string();
        Ok((iv, tag, ciphertext))
    }

    /// Strings of length <= 4 are returned unchanged; otherwise `"****" + last 4 chars`.
    pub fn mask(value: &str) -> String {
        let len = value.chars().count();
        if len <= 4 {
            value.to_string()
        } else {
            let tail: String = value.chars().skip(len - 4).collect();
            format!("****{tail}")
        }
    }

    pub async fn store(
        &self,
        db: &DatabaseConnection,
        workspace_id: Uuid,
        provider_name: &str,
        key: &str,
        secret: &str,
        created_by: Uuid,
    ) -> Result<ApiCredential> {
        let workspace_key = self.derive_workspace_key(workspace_id);

        let encrypted_key = self.encrypt(key.as_bytes(), &workspace_key).map_err(loco_rs::Error::from)?;
        let encrypted_secret =
            self.encrypt(secret.as_bytes(), &workspace_key).map_err(loco_rs::Error::from)?;

        let packed_secret = Self::pack_secret(&encrypted_secret);

        let credential = ApiCredential::create(
            db,
            workspace_id,
            provider_name,
            encrypted_key.ciphertext_b64,
            packed_secret,
            encrypted_key.iv_b64,
            encrypted_key.tag_b64,
            created_by,
        )
        .await?;

        tracing::info!(
            event = "credential_created",
            credential_id = %credential.id,
            workspace_id = %workspace_id,
            provider_name = %provider_name,
            "credential stored"
        );

        Ok(credential)
    }

    pub async fn list(&self, db: &DatabaseConnection, workspace_id: Uuid) -> Result<Vec<MaskedCredential>> {
        let credentials = ApiCredential::list_by_workspace(db, workspace_id).await?;
        let workspace_key = self.derive_workspace_key(workspace_id);

        let mut masked = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let key_plaintext = self
                .decrypt(&credential.encrypted_key, &credential.iv, &credential.auth_tag, &workspace_key)
                .map_err(loco_rs::Error::from)?;
            let key_str = String::from_utf8_lossy(&key_plaintext).to_string();

            masked.push(MaskedCredential {
                id: credential.id,
                provider_name: credential.provider_name,
                masked_key: Self::mask(&key_str),
                created_at: credential.created_at,
                last_used_at: credential.last_used_at,
            });
        }

        Ok(masked)
    }

    /// Internal-only decrypt path used by the enrichment activity; updates `lastUsedAt`.
    pub async fn decrypt_credential(
        &self,
        db: &DatabaseConnection,
        workspace_id: Uuid,
        credential_id: Uuid,
    ) -> Result<DecryptedCredential, VaultError> {
        let credential = ApiCredential::find_by_id(db, credential_id)
            .await
            .map_err(|_| VaultError::NotFound)?
            .ok_or(VaultError::NotFound)?;

        let workspace_key = self.derive_workspace_key(workspace_id);

        let key_plaintext =
            self.decrypt(&credential.encrypted_key, &credential.iv, &credential.auth_tag, &workspace_key)?;

        let (secret_iv, secret_tag, secret_ciphertext) = Self::unpack_secret(&credential.encrypted_secret)?;
        let secret_plaintext = self.decrypt(&secret_ciphertext, &secret_iv, &secret_tag, &workspace_key)?;

        ApiCredential::touch_last_used(db, credential_id).await.map_err(|_| VaultError::NotFound)?;

        tracing::info!(
            event = "credential_decrypted",
            credential_id = %credential_id,
            workspace_id = %workspace_id,
            "credential decrypted"
        );

        Ok(DecryptedCredential {
            key: String::from_utf8_lossy(&key_plaintext).to_string(),
            secret: String::from_utf8_lossy(&secret_plaintext).to_string(),
        })
    }

    pub async fn delete_credential(&self, db: &DatabaseConnection, id: Uuid) -> Result<()> {
        let credential = ApiCredential::find_by_id(db, id)
            .await?
            .ok_or_else(|| loco_rs::Error::string("Credential not found"))?;

        ApiCredential::delete(db, id).await?;

        tracing::info!(
            event = "credential_deleted",
            credential_id = %id,
            workspace_id = %credential.workspace_id,
            "credential deleted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> CredentialVault {
        CredentialVault::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn rejects_master_key_of_wrong_length() {
        assert!(CredentialVault::new(&[0u8; 16]).is_err());
    }

    #[test]
    fn round_trips_encryption() {
        let vault = vault();
        let key = vault.derive_workspace_key(Uuid::new_v4());
        let payload = vault.encrypt(b"sk-live-abc123", &key).unwrap();
        let plaintext = vault.decrypt(&payload.ciphertext_b64, &payload.iv_b64, &payload.tag_b64, &key).unwrap();
        assert_eq!(plaintext, b"sk-live-abc123");
    }

    #[test]
    fn ivs_are_not_reused() {
        let vault = vault();
        let key = vault.derive_workspace_key(Uuid::new_v4());
        let a = vault.encrypt(b"same-plaintext", &key).unwrap();
        let b = vault.encrypt(b"same-plaintext", &key).unwrap();
        assert_ne!(a.iv_b64, b.iv_b64);
    }

    #[test]
    fn workspace_keys_are_distinct() {
        let vault = vault();
        let k1 = vault.derive_workspace_key(Uuid::new_v4());
        let k2 = vault.derive_workspace_key(Uuid::new_v4());
        assert_ne!(k1, k2);
    }

    #[test]
    fn masking_rules() {
        assert_eq!(CredentialVault::mask("abcd"), "abcd");
        assert_eq!(CredentialVault::mask("abcde"), "****bcde");
        assert_eq!(CredentialVault::mask("sk-live-1234567890"), "****7890");
    }

    #[test]
    fn tampered_tag_fails_decryption() {
        let vault = vault();
        let key = vault.derive_workspace_key(Uuid::new_v4());
        let payload = vault.encrypt(b"secret-value", &key).unwrap();
        let bad_tag = BASE64.encode([0u8; 16]);
        let result = vault.decrypt(&payload.ciphertext_b64, &payload.iv_b64, &bad_tag, &key);
        assert!(result.is_err());
    }
}
