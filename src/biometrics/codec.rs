use crate::core::error::CodecError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Number of components in an enrolled or presented vector
pub const VECTOR_DIMENSIONS: usize = 128;

/// Raw size of a fingerprint blob: two big-endian bytes per component
pub const FINGERPRINT_BYTES: usize = VECTOR_DIMENSIONS * 2;

/// A 128-dimensional biometric fingerprint
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BiometricVector([u16; VECTOR_DIMENSIONS]);

impl BiometricVector {
    pub fn from_components(components: [u16; VECTOR_DIMENSIONS]) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u16; VECTOR_DIMENSIONS] {
        &self.0
    }

    /// Pack consecutive byte pairs big-endian into components
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != FINGERPRINT_BYTES {
            return Err(CodecError::WrongLength {
                actual: bytes.len(),
            });
        }

        let mut components = [0u16; VECTOR_DIMENSIONS];
        for (component, pair) in components.iter_mut().zip(bytes.chunks_exact(2)) {
            *component = u16::from_be_bytes([pair[0], pair[1]]);
        }

        Ok(Self(components))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|c| c.to_be_bytes()).collect()
    }

    /// Base64 form, as stored in user documents and sent by kiosks
    pub fn encode(&self) -> String {
        BASE64.encode(self.to_bytes())
    }
}

/// Decode a base64-encoded 256-byte fingerprint blob
///
/// Surrounding whitespace is ignored. Anything that does not decode to exactly
/// 256 bytes is rejected with the observed byte length.
pub fn decode(encoded: &str) -> Result<BiometricVector, CodecError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;

    BiometricVector::from_bytes(&bytes)
}
