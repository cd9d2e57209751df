//! Payload masking.
//!
//! Masking XORs payload byte `i` with `key[i % 4]`. The transform is its own
//! inverse, so the same function masks and unmasks.

use super::wire_format::MASK_KEY_SIZE;
use crate::error::Result;

/// Apply the XOR mask in place.
///
/// Works on whole 4-byte words with the key tiled into a `u32`, then
/// finishes the tail byte by byte. Equivalent to the plain byte loop.
///
/// # Example
///
/// ```
/// use wsframe::protocol::apply_mask;
///
/// let key = [0x37, 0xfa, 0x21, 0x3d];
/// let mut data = *b"Hello";
/// apply_mask(&mut data, key);
/// assert_eq!(data, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
/// apply_mask(&mut data, key);
/// assert_eq!(&data, b"Hello");
/// ```
pub fn apply_mask(payload: &mut [u8], key: [u8; MASK_KEY_SIZE]) {
    let tiled = u32::from_ne_bytes(key);
    let mut words = payload.chunks_exact_mut(MASK_KEY_SIZE);
    for word in &mut words {
        let masked = u32::from_ne_bytes([word[0], word[1], word[2], word[3]]) ^ tiled;
        word.copy_from_slice(&masked.to_ne_bytes());
    }
    // The tail starts on a multiple of 4, so its index is already `i % 4`.
    for (byte, k) in words.into_remainder().iter_mut().zip(key) {
        *byte ^= k;
    }
}

/// Draw a fresh masking key from the OS random source.
///
/// Fails with `RandomnessUnavailable` instead of falling back to a weak key.
pub fn generate_mask_key() -> Result<[u8; MASK_KEY_SIZE]> {
    fill_mask_key(getrandom::fill)
}

/// Build a masking key from `fill`, propagating its failure.
pub(crate) fn fill_mask_key<F>(fill: F) -> Result<[u8; MASK_KEY_SIZE]>
where
    F: FnOnce(&mut [u8]) -> std::result::Result<(), getrandom::Error>,
{
    let mut key = [0u8; MASK_KEY_SIZE];
    fill(&mut key)?;
    Ok(key)
}
