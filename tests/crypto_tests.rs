//! Integration tests for the OtpVault crypto module and vault envelope.

use otpvault::crypto::{decrypt, derive_key, encrypt, generate_salt, VaultKey, SALT_LEN};
use otpvault::errors::OtpVaultError;
use otpvault::vault::format::{self, MIN_ENVELOPE_LEN};

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derive_is_deterministic() {
    let salt = [7u8; SALT_LEN];
    let k1 = derive_key(b"Str0ng!Pass", &salt).expect("derive 1");
    let k2 = derive_key(b"Str0ng!Pass", &salt).expect("derive 2");
    assert_eq!(k1, k2);
}

#[test]
fn different_salts_give_different_keys() {
    let s1 = generate_salt();
    let s2 = generate_salt();
    assert_ne!(s1, s2, "two random salts should differ");

    let k1 = derive_key(b"Str0ng!Pass", &s1).unwrap();
    let k2 = derive_key(b"Str0ng!Pass", &s2).unwrap();
    assert_ne!(k1, k2);
}

#[test]
fn different_passwords_give_different_keys() {
    let salt = generate_salt();
    let k1 = derive_key(b"Str0ng!Pass", &salt).unwrap();
    let k2 = derive_key(b"Str0ng!Pasz", &salt).unwrap();
    assert_ne!(k1, k2);
}

#[test]
fn empty_password_and_short_salt_are_rejected() {
    assert!(derive_key(b"", &[0u8; SALT_LEN]).is_err());
    assert!(derive_key(b"pw", &[0u8; SALT_LEN - 1]).is_err());
}

// ---------------------------------------------------------------------------
// Authenticated encryption
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = br#"{"format_version":1,"records":[]}"#;

    let ciphertext = encrypt(&key, plaintext).expect("encrypt should succeed");
    assert!(ciphertext.len() > plaintext.len());

    let recovered = decrypt(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = [0xCDu8; 32];
    let ct1 = encrypt(&key, b"same").unwrap();
    let ct2 = encrypt(&key, b"same").unwrap();
    assert_ne!(ct1, ct2, "each encryption must use a fresh nonce");
}

#[test]
fn flipping_any_bit_fails_authentication() {
    let key = [0x11u8; 32];
    let ciphertext = encrypt(&key, b"JBSWY3DPEHPK3PXP").unwrap();

    for byte in 0..ciphertext.len() {
        for bit in 0..8 {
            let mut tampered = ciphertext.clone();
            tampered[byte] ^= 1 << bit;
            assert!(
                matches!(decrypt(&key, &tampered), Err(OtpVaultError::Authentication)),
                "bit {bit} of byte {byte} went undetected"
            );
        }
    }
}

#[test]
fn wrong_key_is_authentication_error() {
    let ciphertext = encrypt(&[0x11u8; 32], b"secret").unwrap();
    assert!(matches!(
        decrypt(&[0x22u8; 32], &ciphertext),
        Err(OtpVaultError::Authentication)
    ));
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[test]
fn envelope_is_salt_then_ciphertext() {
    let key = VaultKey::derive(b"Str0ng!Pass", generate_salt()).unwrap();
    let sealed = format::seal(&key, b"hello").unwrap();

    assert_eq!(&sealed[..SALT_LEN], key.salt());
    assert_eq!(sealed.len(), MIN_ENVELOPE_LEN + b"hello".len());
}

#[test]
fn truncated_envelope_is_corrupt_store() {
    let key = VaultKey::derive(b"Str0ng!Pass", generate_salt()).unwrap();
    let sealed = format::seal(&key, b"").unwrap();
    assert_eq!(sealed.len(), MIN_ENVELOPE_LEN);

    assert!(matches!(
        format::open(&sealed[..MIN_ENVELOPE_LEN - 1], b"Str0ng!Pass"),
        Err(OtpVaultError::CorruptStore(_))
    ));
}

#[test]
fn tampered_salt_is_authentication_error() {
    let key = VaultKey::derive(b"Str0ng!Pass", generate_salt()).unwrap();
    let mut sealed = format::seal(&key, b"payload").unwrap();
    sealed[0] ^= 0x80;

    assert!(matches!(
        format::open(&sealed, b"Str0ng!Pass"),
        Err(OtpVaultError::Authentication)
    ));
}

#[test]
fn vault_key_debug_hides_key_material() {
    let key = VaultKey::derive(b"Str0ng!Pass", [3u8; SALT_LEN]).unwrap();
    let debug = format!("{key:?}");
    let hex: String = key.as_bytes().iter().map(|b| format!("{b:02x}")).collect();
    assert!(!debug.contains(&hex));
}
