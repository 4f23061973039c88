//! # Chunk Packing
//!
//! Compact text encoding of block volumes for storage and for handing chunks
//! between the main tick and background tasks.
//!
//! ## Formats
//!
//! The decoded byte length identifies the encoding, so no header is stored:
//!
//! | decoded length | encoding |
//! |---|---|
//! | `volume / 2` | 4 bits per voxel, even voxel in the low nibble |
//! | `volume / 8` | legacy 1 bit per voxel (solid/air), LSB first |
//! | `volume` | 1 byte per voxel, used when an id does not fit in a nibble |
//!
//! The byte string is then encoded as standard base64.

use base64::{engine::general_purpose::STANDARD, Engine};
use bitvec::{order::Lsb0, slice::BitSlice};

use crate::engine_state::voxels::block::{block_type::BlockId, BlockTypeSize};
use crate::error::CodecError;

use super::{Chunk, CHUNK_VOLUME};

/// Packed byte length of a 4-bit volume.
pub const fn packed_nibble_len(volume: usize) -> usize {
    volume.div_ceil(2)
}

/// Packed byte length of a legacy 1-bit volume.
pub const fn packed_bit_len(volume: usize) -> usize {
    volume.div_ceil(8)
}

/// Packs a chunk into its base64 text form.
pub fn pack(chunk: &Chunk) -> String {
    pack_volume(chunk.as_raw())
}

/// Unpacks a chunk produced by [`pack`] or by the legacy 1-bit encoder.
pub fn unpack(encoded: &str) -> Result<Chunk, CodecError> {
    let packed = decode_base64(encoded)?;
    let len = packed.len();
    let blocks = expand(packed, CHUNK_VOLUME)?;
    Chunk::from_raw(blocks).ok_or(CodecError::UnrecognizedLength {
        len,
        volume: CHUNK_VOLUME,
    })
}

/// Packs an arbitrary voxel buffer.
///
/// Buffers whose ids all fit in 4 bits are packed two voxels per byte; anything
/// wider falls back to one byte per voxel.
pub fn pack_volume(blocks: &[BlockTypeSize]) -> String {
    if blocks.iter().any(|raw| *raw > 0x0f) {
        return STANDARD.encode(blocks);
    }

    let mut packed = vec![0u8; packed_nibble_len(blocks.len())];
    for (i, raw) in blocks.iter().enumerate() {
        let value = raw & 0x0f;
        if i & 1 == 1 {
            packed[i >> 1] |= value << 4;
        } else {
            packed[i >> 1] |= value;
        }
    }
    STANDARD.encode(packed)
}

/// Unpacks a voxel buffer of `volume` voxels, detecting the encoding from the
/// decoded length.
pub fn unpack_volume(encoded: &str, volume: usize) -> Result<Vec<BlockTypeSize>, CodecError> {
    expand(decode_base64(encoded)?, volume)
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))
}

/// Expands decoded bytes into exactly `volume` voxels.
fn expand(packed: Vec<u8>, volume: usize) -> Result<Vec<BlockTypeSize>, CodecError> {
    if packed.len() == packed_nibble_len(volume) {
        let blocks = (0..volume)
            .map(|i| (packed[i >> 1] >> ((i & 1) * 4)) & 0x0f)
            .collect();
        Ok(blocks)
    } else if packed.len() == packed_bit_len(volume) {
        let bits = BitSlice::<u8, Lsb0>::from_slice(&packed);
        let solid = BlockId::GrassBlock.raw();
        let blocks = bits
            .iter()
            .take(volume)
            .map(|bit| if *bit { solid } else { BlockId::Air.raw() })
            .collect();
        Ok(blocks)
    } else if packed.len() == volume {
        Ok(packed)
    } else {
        Err(CodecError::UnrecognizedLength {
            len: packed.len(),
            volume,
        })
    }
}
