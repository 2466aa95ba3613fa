//! ROM image loading and validation.
//!
//! Exactly one image is accepted: the US release in big-endian (`.z64`) byte
//! order, identified by its SHA-1. When the length is right but the digest is
//! not, the first word is checked for the other common dump byte orders so
//! the error can say what the file actually is.

use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::error::{BridgeError, Result};

pub const US_ROM_SHA1: &str = "9bef1128717f958171a4afac3ed78ee2bb4e86ce";
pub const US_ROM_LEN: usize = 8 * 1024 * 1024;

const Z64_MAGIC: [u8; 4] = [0x80, 0x37, 0x12, 0x40];
const V64_MAGIC: [u8; 4] = [0x37, 0x80, 0x40, 0x12];
const N64_MAGIC: [u8; 4] = [0x40, 0x12, 0x37, 0x80];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomByteOrder {
    BigEndian,
    ByteSwapped,
    LittleEndian,
    Unknown,
}

impl RomByteOrder {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.get(..4) {
            Some(head) if head == Z64_MAGIC.as_slice() => Self::BigEndian,
            Some(head) if head == V64_MAGIC.as_slice() => Self::ByteSwapped,
            Some(head) if head == N64_MAGIC.as_slice() => Self::LittleEndian,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomValidator {
    pub expected_len: usize,
    /// Lowercase hex digest.
    pub expected_sha1: String,
}

impl RomValidator {
    pub fn new(expected_len: usize, expected_sha1: &str) -> Self {
        Self {
            expected_len,
            expected_sha1: expected_sha1.to_ascii_lowercase(),
        }
    }

    pub fn us() -> Self {
        Self::new(US_ROM_LEN, US_ROM_SHA1)
    }

    pub fn validate(&self, bytes: &[u8]) -> std::result::Result<(), String> {
        if bytes.len() != self.expected_len {
            return Err(format!(
                "expected {} bytes, found {}",
                self.expected_len,
                bytes.len()
            ));
        }

        let actual = sha1_hex(bytes);
        if actual != self.expected_sha1 {
            let hint = match RomByteOrder::detect(bytes) {
                RomByteOrder::ByteSwapped => {
                    " (file is a byte-swapped .v64 dump; convert it to big-endian .z64)"
                }
                RomByteOrder::LittleEndian => {
                    " (file is a little-endian .n64 dump; convert it to big-endian .z64)"
                }
                RomByteOrder::BigEndian | RomByteOrder::Unknown => "",
            };
            return Err(format!(
                "SHA-1 {} does not match the supported image {}{}",
                actual, self.expected_sha1, hint
            ));
        }
        Ok(())
    }
}

impl Default for RomValidator {
    fn default() -> Self {
        Self::us()
    }
}

#[derive(Debug, Clone)]
pub struct RomImage {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl RomImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub fn load_rom(path: &Path, validator: &RomValidator) -> Result<RomImage> {
    let bytes = fs::read(path).map_err(|source| BridgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    validator
        .validate(&bytes)
        .map_err(|reason| BridgeError::InvalidAsset {
            path: path.to_path_buf(),
            reason,
        })?;
    log::info!("ROM {} validated", path.display());
    Ok(RomImage {
        path: path.to_path_buf(),
        bytes,
    })
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "msb_rom_test_{}_{}_{}.z64",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn fake_rom(len: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        bytes[..4].copy_from_slice(&Z64_MAGIC);
        bytes
    }

    #[test]
    fn sha1_of_known_input() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn accepts_exactly_the_expected_digest() {
        let rom = fake_rom(4096);
        let validator = RomValidator::new(rom.len(), &sha1_hex(&rom));
        assert!(validator.validate(&rom).is_ok());

        let mut tampered = rom.clone();
        tampered[100] ^= 0x01;
        let err = validator.validate(&tampered).expect_err("one flipped bit must fail");
        assert!(err.contains("SHA-1"));
    }

    #[test]
    fn rejects_wrong_length_before_hashing() {
        let rom = fake_rom(4096);
        let validator = RomValidator::new(4096, &sha1_hex(&rom));
        let err = validator.validate(&rom[..4000]).expect_err("short ROM must fail");
        assert!(err.contains("expected 4096 bytes"));
    }

    #[test]
    fn byte_swapped_dump_gets_a_hint() {
        let mut rom = fake_rom(64);
        let validator = RomValidator::new(rom.len(), &sha1_hex(&rom));
        for pair in rom.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
        assert_eq!(RomByteOrder::detect(&rom), RomByteOrder::ByteSwapped);
        let err = validator.validate(&rom).expect_err("swapped ROM must fail");
        assert!(err.contains(".v64"));
    }

    #[test]
    fn uppercase_expected_digest_is_normalised() {
        let rom = fake_rom(128);
        let validator = RomValidator::new(rom.len(), &sha1_hex(&rom).to_ascii_uppercase());
        assert!(validator.validate(&rom).is_ok());
    }

    #[test]
    fn load_rom_reports_invalid_asset() {
        let path = temp_file_path("bad");
        fs::write(&path, fake_rom(256)).expect("write temp rom");
        let err = load_rom(&path, &RomValidator::us()).expect_err("fake ROM is not the US image");
        assert!(matches!(err, BridgeError::InvalidAsset { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_rom_missing_file_is_io_error() {
        let path = temp_file_path("missing");
        let err = load_rom(&path, &RomValidator::us()).expect_err("missing file must fail");
        assert!(matches!(err, BridgeError::Io { .. }));
    }

    #[test]
    fn load_rom_returns_bytes_on_success() {
        let path = temp_file_path("good");
        let rom = fake_rom(512);
        fs::write(&path, &rom).expect("write temp rom");
        let validator = RomValidator::new(rom.len(), &sha1_hex(&rom));
        let image = load_rom(&path, &validator).expect("matching ROM should load");
        assert_eq!(image.bytes(), rom.as_slice());
        assert_eq!(image.path(), path.as_path());
        let _ = fs::remove_file(path);
    }
}
