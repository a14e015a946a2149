//! 12-byte document identifiers.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::{OdmError, Result};

/// Primary key of a stored document.
///
/// Layout: 4-byte big-endian timestamp (seconds), 3-byte machine hash,
/// 2-byte process id, 3-byte counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a new ObjectId
    ///
    /// # Example
    /// ```rust
    /// use monodoc_common::ObjectId;
    ///
    /// let a = ObjectId::new().unwrap();
    /// let b = ObjectId::new().unwrap();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Result<Self> {
        static MACHINE: OnceLock<[u8; 3]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let seconds = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| OdmError::Io(format!("system clock before epoch: {e}")))?
            .as_secs() as u32;

        let machine = MACHINE.get_or_init(|| {
            let mut hasher = Sha1::new();
            match std::env::var("HOSTNAME").or_else(|_| std::env::var("COMPUTERNAME")) {
                Ok(host) => hasher.update(host.as_bytes()),
                Err(_) => {
                    hasher.update(std::process::id().to_be_bytes());
                    hasher.update(b"monodoc");
                }
            }
            let digest = hasher.finalize();
            [digest[0], digest[1], digest[2]]
        });

        let counter = COUNTER.get_or_init(|| {
            let mut seed = [0u8; 4];
            let start = match OsRng.try_fill_bytes(&mut seed) {
                Ok(()) => u32::from_be_bytes(seed),
                Err(_) => std::process::id() ^ 0x5eed_0dd5,
            };
            AtomicU32::new(start & 0x00ff_ffff)
        });
        let count = counter.fetch_add(1, Ordering::SeqCst) & 0x00ff_ffff;
        let pid = (std::process::id() & 0xffff) as u16;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..7].copy_from_slice(machine);
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..]);

        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Seconds since the epoch encoded in the id.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let decoded =
            hex::decode(s).map_err(|e| OdmError::Parse(format!("invalid ObjectId {s:?}: {e}")))?;
        let bytes: [u8; 12] = decoded.try_into().map_err(|_| {
            OdmError::Parse(format!("invalid ObjectId {s:?}: expected 24 hex digits"))
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
