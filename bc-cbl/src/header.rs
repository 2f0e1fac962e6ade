// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::crc::crc8;
use crate::errors::Error;
use crate::signer::CblSigner;
use bc_primitives::{eq_ct, sha3_512, Checksum, CHECKSUM_LEN};
use bc_whitening::{TUPLE_MAX_SIZE, TUPLE_MIN_SIZE};
use byteorder::{BigEndian, ByteOrder};

pub const MAGIC_BYTE: u8 = 0xBC;
pub const VERSION_BYTE: u8 = 1;
/// JavaScript's `Number.MAX_SAFE_INTEGER`, preserved as the length ceiling
/// so behavior matches the source ecosystem's arithmetic.
pub const MAX_SAFE_INTEGER: u64 = (1u64 << 53) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CblBlockType {
    ConstituentBlockList = 1,
    ExtendedCbl = 2,
    EncryptedCbl = 3,
    EncryptedExtendedCbl = 4,
}

impl CblBlockType {
    pub fn from_byte(b: u8) -> Result<Self, Error> {
        match b {
            1 => Ok(CblBlockType::ConstituentBlockList),
            2 => Ok(CblBlockType::ExtendedCbl),
            3 => Ok(CblBlockType::EncryptedCbl),
            4 => Ok(CblBlockType::EncryptedExtendedCbl),
            other => Err(Error::UnknownBlockType(other)),
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(
            self,
            CblBlockType::ExtendedCbl | CblBlockType::EncryptedExtendedCbl
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedMeta {
    pub file_name: String,
    pub mime_type: String,
}

/// Computed byte offsets for one header instance. Fields are laid out
/// contiguously with no gap, overlap, or padding (spec §8 invariant 4):
/// `offset(field_{i+1}) == offset(field_i) + size(field_i)`.
struct Layout {
    creator_id: (usize, usize),
    date_created: (usize, usize),
    address_count: (usize, usize),
    tuple_size: (usize, usize),
    original_data_length: (usize, usize),
    original_data_checksum: (usize, usize),
    is_extended: (usize, usize),
    file_name_length: Option<(usize, usize)>,
    file_name: Option<(usize, usize)>,
    mime_type_length: Option<(usize, usize)>,
    mime_type: Option<(usize, usize)>,
    signature: (usize, usize),
    header_size: usize,
}

impl Layout {
    fn compute(id_size: usize, extended: Option<&ExtendedMeta>) -> Layout {
        let mut cursor = 4usize; // structured prefix: magic, block type, version, crc8
        let mut field = |size: usize, cursor: &mut usize| -> (usize, usize) {
            let off = *cursor;
            *cursor += size;
            (off, size)
        };

        let creator_id = field(id_size, &mut cursor);
        let date_created = field(8, &mut cursor);
        let address_count = field(4, &mut cursor);
        let tuple_size = field(1, &mut cursor);
        let original_data_length = field(8, &mut cursor);
        let original_data_checksum = field(CHECKSUM_LEN, &mut cursor);
        let is_extended = field(1, &mut cursor);

        let (file_name_length, file_name, mime_type_length, mime_type) = match extended {
            Some(meta) => {
                let fnl = field(2, &mut cursor);
                let fname = field(meta.file_name.as_bytes().len(), &mut cursor);
                let mtl = field(1, &mut cursor);
                let mtype = field(meta.mime_type.as_bytes().len(), &mut cursor);
                (Some(fnl), Some(fname), Some(mtl), Some(mtype))
            }
            None => (None, None, None, None),
        };

        let signature = field(64, &mut cursor);

        Layout {
            creator_id,
            date_created,
            address_count,
            tuple_size,
            original_data_length,
            original_data_checksum,
            is_extended,
            file_name_length,
            file_name,
            mime_type_length,
            mime_type,
            signature,
            header_size: cursor,
        }
    }
}

/// Parameters for [`make_header`].
pub struct MakeHeaderParams<'a> {
    pub block_type: CblBlockType,
    pub date_created_ms: u64,
    pub address_count: u32,
    pub original_data_length: u64,
    pub original_data_checksum: Checksum,
    pub address_list: &'a [u8],
    pub block_size: usize,
    pub id_size: usize,
    pub tuple_size: u8,
    pub extended: Option<ExtendedMeta>,
}

/// Builds a signed CBL header (structured prefix through signature, NOT
/// including the address list). Returns the header bytes and the computed
/// signature. See spec §4.6 and §3.
pub fn make_header<S: CblSigner>(
    signer: &S,
    params: MakeHeaderParams,
) -> Result<(Vec<u8>, [u8; 64]), Error> {
    if !(TUPLE_MIN_SIZE..=TUPLE_MAX_SIZE).contains(&(params.tuple_size as usize)) {
        return Err(Error::InvalidTupleSize(params.tuple_size as usize));
    }
    if params.original_data_length > MAX_SAFE_INTEGER {
        return Err(Error::FileTooLarge(params.original_data_length));
    }

    let capacity_block_kind = if params.extended.is_some() {
        bc_block::BlockKind::ExtendedCbl
    } else {
        bc_block::BlockKind::ConstituentBlockList
    };
    let capacity_params = bc_block::CapacityParams {
        block_size: bc_block::BlockSize::from_bytes(params.block_size)?,
        block_kind: capacity_block_kind,
        encryption: bc_block::CapacityEncryptionMode::None,
        recipient_count: None,
        cbl_meta: params.extended.as_ref().map(|e| bc_block::CblMeta {
            file_name: Some(e.file_name.clone()),
            mime_type: Some(e.mime_type.clone()),
        }),
        id_size: params.id_size,
    };
    let capacity = bc_block::capacity(&capacity_params)?;
    let address_capacity = bc_block::address_capacity(capacity.available_capacity);
    if params.address_count as usize > address_capacity {
        return Err(Error::AddressCountExceedsCapacity {
            address_count: params.address_count,
            capacity: address_capacity,
        });
    }

    let creator_id = signer.creator_id();
    if creator_id.len() != params.id_size {
        return Err(Error::BufferTooShort {
            needed: params.id_size,
            actual: creator_id.len(),
        });
    }

    let layout = Layout::compute(params.id_size, params.extended.as_ref());
    let mut header = vec![0u8; layout.header_size];

    header[0] = MAGIC_BYTE;
    header[1] = params.block_type as u8;
    header[2] = VERSION_BYTE;
    header[3] = crc8(&header[0..3]);

    write_field(&mut header, layout.creator_id, &creator_id);
    let mut date_buf = [0u8; 8];
    BigEndian::write_u64(&mut date_buf, params.date_created_ms);
    write_field(&mut header, layout.date_created, &date_buf);

    let mut count_buf = [0u8; 4];
    BigEndian::write_u32(&mut count_buf, params.address_count);
    write_field(&mut header, layout.address_count, &count_buf);

    write_field(&mut header, layout.tuple_size, &[params.tuple_size]);

    let mut odl_buf = [0u8; 8];
    BigEndian::write_u64(&mut odl_buf, params.original_data_length);
    write_field(&mut header, layout.original_data_length, &odl_buf);

    write_field(
        &mut header,
        layout.original_data_checksum,
        params.original_data_checksum.as_bytes(),
    );

    write_field(
        &mut header,
        layout.is_extended,
        &[params.extended.is_some() as u8],
    );

    if let Some(meta) = &params.extended {
        let fname = meta.file_name.as_bytes();
        let mtype = meta.mime_type.as_bytes();
        let mut fnl_buf = [0u8; 2];
        BigEndian::write_u16(&mut fnl_buf, fname.len() as u16);
        write_field(&mut header, layout.file_name_length.unwrap(), &fnl_buf);
        write_field(&mut header, layout.file_name.unwrap(), fname);
        write_field(&mut header, layout.mime_type_length.unwrap(), &[mtype.len() as u8]);
        write_field(&mut header, layout.mime_type.unwrap(), mtype);
    }

    let mut to_sign = header[0..layout.signature.0].to_vec();
    to_sign.extend_from_slice(params.address_list);
    let signature = signer.sign(&to_sign);
    write_field(&mut header, layout.signature, &signature);

    Ok((header, signature))
}

fn write_field(buf: &mut [u8], (offset, size): (usize, usize), data: &[u8]) {
    debug_assert_eq!(data.len(), size);
    buf[offset..offset + size].copy_from_slice(data);
}

fn read_field(buf: &[u8], (offset, size): (usize, usize)) -> Result<&[u8], Error> {
    buf.get(offset..offset + size)
        .ok_or(Error::BufferTooShort {
            needed: offset + size,
            actual: buf.len(),
        })
}

/// A fully decoded CBL header, read from a block-sized buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CblHeader {
    pub block_type: CblBlockType,
    pub creator_id: Vec<u8>,
    pub date_created_ms: u64,
    pub address_count: u32,
    pub tuple_size: u8,
    pub original_data_length: u64,
    pub original_data_checksum: Checksum,
    pub extended: Option<ExtendedMeta>,
    pub signature: [u8; 64],
    pub header_size: usize,
}

/// Decodes a CBL header from `buf`. Rejects buffers whose structured prefix
/// fails the magic byte or CRC-8 check.
pub fn decode_header(buf: &[u8], id_size: usize) -> Result<CblHeader, Error> {
    if buf.len() < 4 {
        return Err(Error::BufferTooShort {
            needed: 4,
            actual: buf.len(),
        });
    }
    if buf[0] != MAGIC_BYTE {
        return Err(Error::BadMagicByte(buf[0]));
    }
    let expected_crc = crc8(&buf[0..3]);
    if buf[3] != expected_crc {
        return Err(Error::CrcMismatch {
            expected: expected_crc,
            actual: buf[3],
        });
    }
    let block_type = CblBlockType::from_byte(buf[1])?;

    // First pass without extended fields to find `isExtended`.
    let probe = Layout::compute(id_size, None);
    let is_extended_byte = read_field(buf, probe.is_extended)?[0];
    let is_extended = is_extended_byte != 0;

    let extended = if is_extended {
        let fnl_off = probe.is_extended.0 + probe.is_extended.1;
        let fnl = BigEndian::read_u16(read_field(buf, (fnl_off, 2))?) as usize;
        let fname_off = fnl_off + 2;
        let file_name = String::from_utf8(read_field(buf, (fname_off, fnl))?.to_vec())
            .map_err(|_| Error::InvalidFileName)?;
        let mtl_off = fname_off + fnl;
        let mtl = read_field(buf, (mtl_off, 1))?[0] as usize;
        let mtype_off = mtl_off + 1;
        let mime_type = String::from_utf8(read_field(buf, (mtype_off, mtl))?.to_vec())
            .map_err(|_| Error::InvalidFileName)?;
        Some(ExtendedMeta {
            file_name,
            mime_type,
        })
    } else {
        None
    };

    let layout = Layout::compute(id_size, extended.as_ref());
    let creator_id = read_field(buf, layout.creator_id)?.to_vec();
    let date_created_ms = BigEndian::read_u64(read_field(buf, layout.date_created)?);
    let address_count = BigEndian::read_u32(read_field(buf, layout.address_count)?);
    let tuple_size = read_field(buf, layout.tuple_size)?[0];
    let original_data_length = BigEndian::read_u64(read_field(buf, layout.original_data_length)?);
    let original_data_checksum =
        Checksum::from_slice(read_field(buf, layout.original_data_checksum)?)
            .expect("checksum field is exactly CHECKSUM_LEN bytes");
    let mut signature = [0u8; 64];
    signature.copy_from_slice(read_field(buf, layout.signature)?);

    Ok(CblHeader {
        block_type,
        creator_id,
        date_created_ms,
        address_count,
        tuple_size,
        original_data_length,
        original_data_checksum,
        extended,
        signature,
        header_size: layout.header_size,
    })
}

/// Recomputes the expected signature over `header_excluding_signature ||
/// address_list` and compares it to the stored one via constant-time
/// equality.
pub fn validate_signature<S: CblSigner>(full_block: &[u8], signer: &S, id_size: usize) -> Result<bool, Error> {
    let header = decode_header(full_block, id_size)?;
    let address_list_start = header.header_size;
    let address_list_end = address_list_start + header.address_count as usize * CHECKSUM_LEN;
    let address_list = full_block
        .get(address_list_start..address_list_end)
        .ok_or(Error::BufferTooShort {
            needed: address_list_end,
            actual: full_block.len(),
        })?;

    let signature_offset = header.header_size - 64;
    let mut to_sign = full_block[0..signature_offset].to_vec();
    to_sign.extend_from_slice(address_list);

    Ok(signer.verify(&header.creator_id, &to_sign, &header.signature))
}

/// Computes SHA3-512 over arbitrary data; exposed for callers that need to
/// derive `originalDataChecksum` without importing `bc-primitives` directly.
pub fn checksum(data: &[u8]) -> Checksum {
    sha3_512(data)
}

pub fn eq_checksums(a: &Checksum, b: &Checksum) -> bool {
    eq_ct(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner {
        id: Vec<u8>,
    }

    impl CblSigner for FixedSigner {
        fn creator_id(&self) -> Vec<u8> {
            self.id.clone()
        }

        fn sign(&self, data: &[u8]) -> [u8; 64] {
            let digest = sha3_512(data);
            *digest.as_bytes()
        }

        fn verify(&self, _creator_id: &[u8], data: &[u8], signature: &[u8; 64]) -> bool {
            let expected = self.sign(data);
            eq_ct(&expected, signature)
        }
    }

    fn signer() -> FixedSigner {
        FixedSigner { id: vec![0u8; 16] }
    }

    #[test]
    fn s3_header_layout_offsets_match_spec() {
        let layout = Layout::compute(16, None);
        assert_eq!(layout.creator_id, (4, 16));
        assert_eq!(layout.date_created, (20, 8));
        assert_eq!(layout.address_count, (28, 4));
        assert_eq!(layout.tuple_size, (32, 1));
        assert_eq!(layout.original_data_length, (33, 8));
        assert_eq!(layout.original_data_checksum, (41, 64));
        assert_eq!(layout.is_extended, (105, 1));
        assert_eq!(layout.signature, (106, 64));
        assert_eq!(layout.header_size, 170);
    }

    #[test]
    fn layout_is_gapless_and_overlap_free() {
        let meta = ExtendedMeta {
            file_name: "a.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        let layout = Layout::compute(16, Some(&meta));
        let fields = [
            layout.creator_id,
            layout.date_created,
            layout.address_count,
            layout.tuple_size,
            layout.original_data_length,
            layout.original_data_checksum,
            layout.is_extended,
            layout.file_name_length.unwrap(),
            layout.file_name.unwrap(),
            layout.mime_type_length.unwrap(),
            layout.mime_type.unwrap(),
            layout.signature,
        ];
        let mut cursor = 4;
        for (offset, size) in fields {
            assert_eq!(offset, cursor);
            cursor += size;
        }
        assert_eq!(cursor, layout.header_size);
    }

    #[test]
    fn make_header_then_decode_round_trips() {
        let signer = signer();
        let addresses = vec![0xABu8; 3 * CHECKSUM_LEN];
        let params = MakeHeaderParams {
            block_type: CblBlockType::ConstituentBlockList,
            date_created_ms: 1_700_000_000_000,
            address_count: 3,
            original_data_length: 1000,
            original_data_checksum: sha3_512(b"payload"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 3,
            extended: None,
        };
        let (header_bytes, signature) = make_header(&signer, params).unwrap();

        let mut full = header_bytes.clone();
        full.extend_from_slice(&addresses);

        let decoded = decode_header(&full, 16).unwrap();
        assert_eq!(decoded.address_count, 3);
        assert_eq!(decoded.tuple_size, 3);
        assert_eq!(decoded.signature, signature);
        assert!(validate_signature(&full, &signer, 16).unwrap());
    }

    #[test]
    fn flipping_a_header_bit_breaks_signature_validation() {
        let signer = signer();
        let addresses = vec![0xABu8; 2 * CHECKSUM_LEN];
        let params = MakeHeaderParams {
            block_type: CblBlockType::ConstituentBlockList,
            date_created_ms: 1,
            address_count: 2,
            original_data_length: 10,
            original_data_checksum: sha3_512(b"x"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 3,
            extended: None,
        };
        let (header_bytes, _sig) = make_header(&signer, params).unwrap();
        let mut full = header_bytes;
        full.extend_from_slice(&addresses);
        assert!(validate_signature(&full, &signer, 16).unwrap());

        full[10] ^= 0x01;
        assert!(!validate_signature(&full, &signer, 16).unwrap());
    }

    #[test]
    fn flipping_an_address_list_bit_breaks_signature_validation() {
        let signer = signer();
        let addresses = vec![0xABu8; 2 * CHECKSUM_LEN];
        let params = MakeHeaderParams {
            block_type: CblBlockType::ConstituentBlockList,
            date_created_ms: 1,
            address_count: 2,
            original_data_length: 10,
            original_data_checksum: sha3_512(b"x"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 3,
            extended: None,
        };
        let (header_bytes, _sig) = make_header(&signer, params).unwrap();
        let mut full = header_bytes;
        full.extend_from_slice(&addresses);

        let last = full.len() - 1;
        full[last] ^= 0x01;
        assert!(!validate_signature(&full, &signer, 16).unwrap());
    }

    #[test]
    fn rejects_invalid_tuple_size() {
        let signer = signer();
        let addresses = vec![0u8; CHECKSUM_LEN];
        let params = MakeHeaderParams {
            block_type: CblBlockType::ConstituentBlockList,
            date_created_ms: 1,
            address_count: 1,
            original_data_length: 10,
            original_data_checksum: sha3_512(b"x"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 9,
            extended: None,
        };
        assert_eq!(make_header(&signer, params), Err(Error::InvalidTupleSize(9)));
    }

    #[test]
    fn rejects_address_count_over_capacity() {
        let signer = signer();
        let addresses = vec![0u8; 100 * CHECKSUM_LEN];
        let params = MakeHeaderParams {
            block_type: CblBlockType::ConstituentBlockList,
            date_created_ms: 1,
            address_count: 100,
            original_data_length: 10,
            original_data_checksum: sha3_512(b"x"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 3,
            extended: None,
        };
        assert!(matches!(
            make_header(&signer, params),
            Err(Error::AddressCountExceedsCapacity { .. })
        ));
    }

    #[test]
    fn extended_header_round_trips_filename_and_mime() {
        let signer = signer();
        let addresses = vec![0xCDu8; CHECKSUM_LEN];
        let meta = ExtendedMeta {
            file_name: "a.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        let params = MakeHeaderParams {
            block_type: CblBlockType::ExtendedCbl,
            date_created_ms: 42,
            address_count: 1,
            original_data_length: 256,
            original_data_checksum: sha3_512(b"attachment"),
            address_list: &addresses,
            block_size: bc_block::BlockSize::Message.bytes(),
            id_size: 16,
            tuple_size: 3,
            extended: Some(meta.clone()),
        };
        let (header_bytes, _sig) = make_header(&signer, params).unwrap();
        let mut full = header_bytes;
        full.extend_from_slice(&addresses);

        let decoded = decode_header(&full, 16).unwrap();
        assert_eq!(decoded.extended, Some(meta));
        assert!(validate_signature(&full, &signer, 16).unwrap());
    }

    #[test]
    fn decode_rejects_bad_magic_byte() {
        let mut buf = vec![0u8; 200];
        buf[0] = 0x00;
        assert!(matches!(decode_header(&buf, 16), Err(Error::BadMagicByte(0))));
    }

    #[test]
    fn decode_rejects_crc_mismatch() {
        let mut buf = vec![0u8; 200];
        buf[0] = MAGIC_BYTE;
        buf[1] = 1;
        buf[2] = VERSION_BYTE;
        buf[3] = 0xFF;
        assert!(matches!(decode_header(&buf, 16), Err(Error::CrcMismatch { .. })));
    }
}
