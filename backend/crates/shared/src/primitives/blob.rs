use bson::Binary;
use bson::spec::BinarySubtype;

use super::PrimitiveAdapter;
use crate::error::decode::DecodeError;

/// Opaque bytes, stored as a generic binary value and sent as base64.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BinaryBlob(Vec<u8>);

impl BinaryBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PrimitiveAdapter for BinaryBlob {
    type Storage = Binary;

    fn to_storage(&self) -> Binary {
        Binary {
            subtype: BinarySubtype::Generic,
            bytes: self.0.clone(),
        }
    }

    fn from_storage(raw: Binary) -> Result<Self, DecodeError> {
        if raw.subtype != BinarySubtype::Generic {
            return Err(DecodeError::MalformedBlob {
                reason: format!("unsupported binary subtype {:?}", raw.subtype),
            });
        }
        Ok(Self(raw.bytes))
    }

    fn to_wire(&self) -> String {
        platform::crypto::to_base64(&self.0)
    }

    fn from_wire(text: &str) -> Result<Self, DecodeError> {
        platform::crypto::from_base64(text)
            .map(Self)
            .map_err(|e| DecodeError::MalformedBlob {
                reason: e.to_string(),
            })
    }
}

impl From<Vec<u8>> for BinaryBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
