// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::crc::crc8;
use crate::errors::Error;
use crate::header::{
    checksum, decode_header, eq_checksums, make_header, validate_signature, CblBlockType,
    ExtendedMeta, MakeHeaderParams, MAGIC_BYTE,
};
use crate::magnet::MagnetUrl;
use crate::signer::CblSigner;
use bc_block::{BlockSize, CapacityEncryptionMode, CapacityParams};
use bc_primitives::{Checksum, CHECKSUM_LEN};
use bc_whitening::{unwhiten, whiten, RandomBlockPool};
use log::{debug, trace};
use rand::RngCore;

/// Sink side of the block store, as seen by the assembler (spec §4.9
/// `put`). Content-addressed and idempotent: inserting identical bytes
/// twice returns the same checksum and does not re-allocate.
pub trait BlockSink {
    fn put(&self, payload: Vec<u8>) -> Checksum;
}

/// Source side of the block store, as seen by the assembler (spec §4.9 `get`).
pub trait BlockSource {
    fn get(&self, checksum: &Checksum) -> Option<Vec<u8>>;
}

pub struct StoreParams<'a, S: CblSigner> {
    pub payload: &'a [u8],
    pub block_size: BlockSize,
    pub signer: &'a S,
    pub id_size: usize,
    pub tuple_size: u8,
    pub extended: Option<ExtendedMeta>,
    pub date_created_ms: u64,
}

pub struct StoreResult {
    pub magnet_url: MagnetUrl,
    pub primary_cbl_checksum: Checksum,
    /// Every block id created by this store operation: data/random
    /// whitening partners plus every CBL block in the (possibly
    /// CBL-of-CBLs) tree. Does not include FEC parity ids; those are
    /// layered on by `bc-store`/`bc-fec`.
    pub block_ids: Vec<Checksum>,
    /// The whitened data-block checksums only, one per original payload
    /// chunk, in order. This is "the data block set of a CBL" that
    /// `bc-fec` parity is computed over; it excludes random whitening
    /// partners and CBL-tree blocks.
    pub data_block_ids: Vec<Checksum>,
}

/// Splits `params.payload` into block-sized chunks, whitens each one, and
/// assembles a (possibly multi-level) signed CBL tree. See spec §4.7.
pub fn store_cbl_with_whitening<St, S>(
    store: &St,
    params: StoreParams<S>,
) -> Result<StoreResult, Error>
where
    St: BlockSink + RandomBlockPool,
    S: CblSigner,
{
    let block_len = params.block_size.bytes();
    let original_data_length = params.payload.len() as u64;
    let original_data_checksum = checksum(params.payload);

    let mut block_ids = Vec::new();
    let mut data_block_ids = Vec::new();
    let mut addresses: Vec<Checksum> = Vec::new();

    for chunk in params.payload.chunks(block_len) {
        let mut padded = chunk.to_vec();
        if padded.len() < block_len {
            let mut fill = vec![0u8; block_len - padded.len()];
            rand::thread_rng().fill_bytes(&mut fill);
            padded.extend_from_slice(&fill);
        }
        let tuple = whiten(&padded, params.tuple_size as usize, store)?;
        let whitened_checksum = store.put(tuple.whitened_payload);
        trace!("assembler: stored whitened data block {whitened_checksum}");
        block_ids.push(whitened_checksum);
        data_block_ids.push(whitened_checksum);
        addresses.push(whitened_checksum);
        for random_checksum in &tuple.tuple[1..] {
            block_ids.push(*random_checksum);
            addresses.push(*random_checksum);
        }
    }

    let non_extended_capacity = address_capacity_for(params.block_size, params.id_size, false, None);

    let (primary_checksum, mut cbl_ids) = fold_into_cbl_tree(
        store,
        params.signer,
        addresses,
        non_extended_capacity,
        params.id_size,
        params.block_size,
        params.tuple_size,
        original_data_length,
        original_data_checksum,
        params.extended.clone(),
        params.date_created_ms,
    )?;
    block_ids.append(&mut cbl_ids);

    let magnet_url = MagnetUrl {
        primary_cbl_checksum: Some(primary_checksum),
        sibling_cbl_checksums: Vec::new(),
        parity_checksums: Vec::new(),
        is_encrypted: false,
        file_name: params.extended.as_ref().map(|e| e.file_name.clone()),
        original_data_length: Some(original_data_length),
    };

    debug!(
        "assembler: stored payload of {original_data_length} bytes as CBL {primary_checksum}"
    );

    Ok(StoreResult {
        magnet_url,
        primary_cbl_checksum: primary_checksum,
        block_ids,
        data_block_ids,
    })
}

fn address_capacity_for(
    block_size: BlockSize,
    id_size: usize,
    extended: bool,
    meta: Option<&ExtendedMeta>,
) -> usize {
    let block_kind = if extended {
        bc_block::BlockKind::ExtendedCbl
    } else {
        bc_block::BlockKind::ConstituentBlockList
    };
    let params = CapacityParams {
        block_size,
        block_kind,
        encryption: CapacityEncryptionMode::None,
        recipient_count: None,
        cbl_meta: meta.map(|m| bc_block::CblMeta {
            file_name: Some(m.file_name.clone()),
            mime_type: Some(m.mime_type.clone()),
        }),
        id_size,
    };
    let capacity = bc_block::capacity(&params).expect("block size accommodates a CBL header");
    bc_block::address_capacity(capacity.available_capacity)
}

#[allow(clippy::too_many_arguments)]
fn fold_into_cbl_tree<St, S>(
    store: &St,
    signer: &S,
    mut current: Vec<Checksum>,
    non_extended_capacity: usize,
    id_size: usize,
    block_size: BlockSize,
    tuple_size: u8,
    original_data_length: u64,
    original_data_checksum: Checksum,
    extended: Option<ExtendedMeta>,
    date_created_ms: u64,
) -> Result<(Checksum, Vec<Checksum>), Error>
where
    St: BlockSink,
    S: CblSigner,
{
    let mut all_cbl_ids = Vec::new();
    loop {
        let top_capacity = address_capacity_for(block_size, id_size, extended.is_some(), extended.as_ref());
        if current.len() <= top_capacity {
            let checksum = build_one_cbl(
                store,
                signer,
                &current,
                extended.clone(),
                original_data_length,
                original_data_checksum,
                tuple_size,
                block_size,
                id_size,
                date_created_ms,
            )?;
            all_cbl_ids.push(checksum);
            return Ok((checksum, all_cbl_ids));
        }

        let mut next_level = Vec::new();
        for group in current.chunks(non_extended_capacity) {
            let checksum = build_one_cbl(
                store,
                signer,
                group,
                None,
                original_data_length,
                original_data_checksum,
                tuple_size,
                block_size,
                id_size,
                date_created_ms,
            )?;
            all_cbl_ids.push(checksum);
            next_level.push(checksum);
        }
        current = next_level;
    }
}

#[allow(clippy::too_many_arguments)]
fn build_one_cbl<St, S>(
    store: &St,
    signer: &S,
    addresses: &[Checksum],
    extended: Option<ExtendedMeta>,
    original_data_length: u64,
    original_data_checksum: Checksum,
    tuple_size: u8,
    block_size: BlockSize,
    id_size: usize,
    date_created_ms: u64,
) -> Result<Checksum, Error>
where
    St: BlockSink,
    S: CblSigner,
{
    let mut address_bytes = Vec::with_capacity(addresses.len() * CHECKSUM_LEN);
    for a in addresses {
        address_bytes.extend_from_slice(a.as_bytes());
    }

    let block_type = match extended {
        Some(_) => CblBlockType::ExtendedCbl,
        None => CblBlockType::ConstituentBlockList,
    };

    let params = MakeHeaderParams {
        block_type,
        date_created_ms,
        address_count: addresses.len() as u32,
        original_data_length,
        original_data_checksum,
        address_list: &address_bytes,
        block_size: block_size.bytes(),
        id_size,
        tuple_size,
        extended,
    };
    let (header_bytes, _signature) = make_header(signer, params)?;

    let mut full = header_bytes;
    full.extend_from_slice(&address_bytes);
    if full.len() < block_size.bytes() {
        let mut fill = vec![0u8; block_size.bytes() - full.len()];
        rand::thread_rng().fill_bytes(&mut fill);
        full.extend_from_slice(&fill);
    }

    Ok(store.put(full))
}

/// Reconstructs the payload named by a top-level CBL checksum. See spec §4.7
/// retrieval and §4.8 for the FEC recovery this builds on (recovery itself
/// lives one layer up, in `bc-store`, since it needs the parity store).
pub fn retrieve_cbl<St, S>(store: &St, signer: &S, primary: &Checksum, id_size: usize) -> Result<Vec<u8>, Error>
where
    St: BlockSource,
    S: CblSigner,
{
    let (original_length, original_checksum, mut data) = retrieve_level(store, signer, primary, id_size)?;
    data.truncate(original_length as usize);
    let actual = checksum(&data);
    if !eq_checksums(&actual, &original_checksum) {
        return Err(Error::ChecksumMismatch);
    }
    Ok(data)
}

fn retrieve_level<St, S>(
    store: &St,
    signer: &S,
    block_checksum: &Checksum,
    id_size: usize,
) -> Result<(u64, Checksum, Vec<u8>), Error>
where
    St: BlockSource,
    S: CblSigner,
{
    let bytes = store
        .get(block_checksum)
        .ok_or_else(|| Error::MissingBlock(block_checksum.to_hex()))?;
    let header = decode_header(&bytes, id_size)?;
    if !validate_signature(&bytes, signer, id_size)? {
        return Err(Error::SignatureInvalid);
    }

    let address_list_start = header.header_size;
    let address_list_end = address_list_start + header.address_count as usize * CHECKSUM_LEN;
    let address_bytes = bytes
        .get(address_list_start..address_list_end)
        .ok_or(Error::BufferTooShort {
            needed: address_list_end,
            actual: bytes.len(),
        })?;
    let addresses: Vec<Checksum> = address_bytes
        .chunks(CHECKSUM_LEN)
        .map(|c| Checksum::from_slice(c).expect("chunk is exactly CHECKSUM_LEN bytes"))
        .collect();

    if addresses.is_empty() {
        return Ok((header.original_data_length, header.original_data_checksum, Vec::new()));
    }

    let first_is_cbl = store
        .get(&addresses[0])
        .map(|b| is_cbl_block(&b))
        .unwrap_or(false);

    let mut out = Vec::new();
    if first_is_cbl {
        for address in &addresses {
            let (_len, _checksum, chunk) = retrieve_level(store, signer, address, id_size)?;
            out.extend_from_slice(&chunk);
        }
    } else {
        let tuple_size = header.tuple_size as usize;
        for tuple in addresses.chunks(tuple_size) {
            let mut fetched = Vec::with_capacity(tuple.len());
            for member in tuple {
                let bytes = store
                    .get(member)
                    .ok_or_else(|| Error::MissingBlock(member.to_hex()))?;
                fetched.push(bytes);
            }
            let recovered = unwhiten(&fetched)?;
            out.extend_from_slice(&recovered);
        }
    }

    Ok((header.original_data_length, header.original_data_checksum, out))
}

fn is_cbl_block(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[0] == MAGIC_BYTE && crc8(&bytes[0..3]) == bytes[3]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_primitives::sha3_512;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct TestStore {
        blocks: RefCell<HashMap<Vec<u8>, Vec<u8>>>,
    }

    impl TestStore {
        fn new() -> Self {
            TestStore {
                blocks: RefCell::new(HashMap::new()),
            }
        }
    }

    impl BlockSink for TestStore {
        fn put(&self, payload: Vec<u8>) -> Checksum {
            let c = sha3_512(&payload);
            self.blocks.borrow_mut().insert(c.as_bytes().to_vec(), payload);
            c
        }
    }

    impl BlockSource for TestStore {
        fn get(&self, checksum: &Checksum) -> Option<Vec<u8>> {
            self.blocks.borrow().get(checksum.as_bytes().as_slice()).cloned()
        }
    }

    impl RandomBlockPool for TestStore {
        fn try_reuse(&self, _block_size: usize) -> Option<Vec<u8>> {
            None
        }

        fn insert_random(&self, bytes: Vec<u8>) -> Checksum {
            self.put(bytes)
        }
    }

    struct FixedSigner {
        id: Vec<u8>,
    }

    impl CblSigner for FixedSigner {
        fn creator_id(&self) -> Vec<u8> {
            self.id.clone()
        }
        fn sign(&self, data: &[u8]) -> [u8; 64] {
            *sha3_512(data).as_bytes()
        }
        fn verify(&self, _creator_id: &[u8], data: &[u8], signature: &[u8; 64]) -> bool {
            bc_primitives::eq_ct(&self.sign(data), signature)
        }
    }

    #[test]
    fn s1_byte_exact_round_trip() {
        let store = TestStore::new();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();

        let result = store_cbl_with_whitening(
            &store,
            StoreParams {
                payload: &payload,
                block_size: BlockSize::Small,
                signer: &signer,
                id_size: 16,
                tuple_size: 3,
                extended: None,
                date_created_ms: 1,
            },
        )
        .unwrap();

        let recovered = retrieve_cbl(&store, &signer, &result.primary_cbl_checksum, 16).unwrap();
        assert_eq!(recovered, payload);
        assert_eq!(recovered.len(), 1000);
        assert!(bc_primitives::eq(&sha3_512(&recovered), &sha3_512(&payload)));
    }

    #[test]
    fn retrieval_fails_on_missing_block() {
        let store = TestStore::new();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload = vec![7u8; 10];
        let result = store_cbl_with_whitening(
            &store,
            StoreParams {
                payload: &payload,
                block_size: BlockSize::Small,
                signer: &signer,
                id_size: 16,
                tuple_size: 3,
                extended: None,
                date_created_ms: 1,
            },
        )
        .unwrap();

        // corrupt the store by deleting one whitened block.
        let victim = result.block_ids[0];
        store.blocks.borrow_mut().remove(victim.as_bytes().as_slice());

        assert!(retrieve_cbl(&store, &signer, &result.primary_cbl_checksum, 16).is_err());
    }

    #[test]
    fn extended_cbl_round_trips_with_filename() {
        let store = TestStore::new();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload = vec![9u8; 256];
        let meta = ExtendedMeta {
            file_name: "a.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        let result = store_cbl_with_whitening(
            &store,
            StoreParams {
                payload: &payload,
                block_size: BlockSize::Small,
                signer: &signer,
                id_size: 16,
                tuple_size: 3,
                extended: Some(meta),
                date_created_ms: 1,
            },
        )
        .unwrap();
        assert_eq!(result.magnet_url.file_name.as_deref(), Some("a.pdf"));
        let recovered = retrieve_cbl(&store, &signer, &result.primary_cbl_checksum, 16).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn cbl_of_cbls_round_trips_for_large_payloads() {
        let store = TestStore::new();
        let signer = FixedSigner { id: vec![0u8; 16] };
        // Force a CBL-of-CBLs by using the smallest block size with enough
        // data blocks to exceed one CBL's address capacity.
        let block_size = BlockSize::Message;
        let capacity = address_capacity_for(block_size, 16, false, None);
        let data_blocks_needed = capacity + 5;
        let payload = vec![3u8; data_blocks_needed * block_size.bytes()];

        let result = store_cbl_with_whitening(
            &store,
            StoreParams {
                payload: &payload,
                block_size,
                signer: &signer,
                id_size: 16,
                tuple_size: 3,
                extended: None,
                date_created_ms: 1,
            },
        )
        .unwrap();

        let recovered = retrieve_cbl(&store, &signer, &result.primary_cbl_checksum, 16).unwrap();
        assert_eq!(recovered, payload);
    }
}
