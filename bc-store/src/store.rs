// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::config::StoreConfig;
use crate::errors::Error;
use bc_cbl::{CblSigner, ExtendedMeta, MagnetUrl};
use bc_fec::DurabilityLevel;
use bc_primitives::{sha3_512, Checksum};
use bc_whitening::RandomBlockPool;
use log::{debug, trace, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct StoreCblOptions {
    pub block_size: bc_block::BlockSize,
    pub tuple_size: u8,
    pub extended: Option<ExtendedMeta>,
    pub durability: DurabilityLevel,
    pub date_created_ms: u64,
}

pub struct StoreCblResult {
    pub magnet_url: MagnetUrl,
    pub primary_cbl_checksum: Checksum,
    pub block_ids: Vec<Checksum>,
    pub parity_block_ids: Option<Vec<Checksum>>,
    pub is_encrypted: bool,
}

/// Content-addressed, in-memory block store. Thread-safe and cheaply
/// cloneable: every field is an `Arc`, mirroring the source ecosystem's
/// `MemoryDB` pattern, so handles can be shared across worker threads.
#[derive(Clone, Default)]
pub struct MemoryBlockStore {
    config: StoreConfig,
    blocks: Arc<RwLock<HashMap<Checksum, Vec<u8>>>>,
    /// Random-kind blocks currently unclaimed and available for whitening reuse.
    random_pool: Arc<RwLock<Vec<Checksum>>>,
    /// block id -> set of CBL checksums that currently hold it as a partner.
    referenced_by: Arc<RwLock<HashMap<Checksum, HashSet<Checksum>>>>,
    /// CBL checksum -> every block id it owns (data, random, parity, sub-CBLs).
    cbl_partners: Arc<RwLock<HashMap<Checksum, HashSet<Checksum>>>>,
    /// CBL checksum -> (ordered data block ids, parity block ids), used to
    /// drive FEC recovery on a cache miss.
    data_block_groups: Arc<RwLock<HashMap<Checksum, (Vec<Checksum>, Vec<Checksum>)>>>,
    /// data block id -> the CBL whose durability group it belongs to.
    block_to_group: Arc<RwLock<HashMap<Checksum, Checksum>>>,
}

impl MemoryBlockStore {
    pub fn new(config: StoreConfig) -> Self {
        MemoryBlockStore {
            config,
            ..Default::default()
        }
    }

    pub fn has(&self, checksum: &Checksum) -> bool {
        self.blocks.read().contains_key(checksum)
    }

    pub fn get(&self, checksum: &Checksum) -> Option<Vec<u8>> {
        if let Some(bytes) = self.blocks.read().get(checksum).cloned() {
            return Some(bytes);
        }
        self.try_recover(checksum)
    }

    /// Idempotent content-addressed insert (spec §4.9): the same payload
    /// always yields the same checksum and is only stored once.
    pub fn put(&self, payload: Vec<u8>) -> Checksum {
        let checksum = sha3_512(&payload);
        self.blocks.write().entry(checksum).or_insert(payload);
        checksum
    }

    pub fn delete(&self, checksum: &Checksum) -> Result<(), Error> {
        if let Some(refs) = self.referenced_by.read().get(checksum) {
            if !refs.is_empty() {
                warn!("store: refusing to delete {checksum}, still referenced by a live CBL");
                return Err(Error::BlockInUse(checksum.to_hex()));
            }
        }
        let removed = self.blocks.write().remove(checksum).is_some();
        if !removed {
            return Err(Error::NotFound(checksum.to_hex()));
        }
        self.random_pool.write().retain(|c| c != checksum);
        Ok(())
    }

    /// Every random-kind block currently free for whitening reuse.
    pub fn list_random_pool(&self) -> Vec<Checksum> {
        self.random_pool.read().clone()
    }

    pub fn store_cbl_with_whitening<S: CblSigner>(
        &self,
        payload: &[u8],
        signer: &S,
        options: StoreCblOptions,
    ) -> Result<StoreCblResult, Error> {
        let result = bc_cbl::store_cbl_with_whitening(
            self,
            bc_cbl::StoreParams {
                payload,
                block_size: options.block_size,
                signer,
                id_size: self.config.id_size,
                tuple_size: options.tuple_size,
                extended: options.extended,
                date_created_ms: options.date_created_ms,
            },
        )?;

        self.register_partners(result.primary_cbl_checksum, &result.block_ids);

        let parity_block_ids = self.generate_and_store_parity(&result.data_block_ids, options.durability)?;
        if let Some(parity_ids) = &parity_block_ids {
            self.register_partners(result.primary_cbl_checksum, parity_ids);
        }
        self.data_block_groups.write().insert(
            result.primary_cbl_checksum,
            (result.data_block_ids.clone(), parity_block_ids.clone().unwrap_or_default()),
        );
        {
            let mut block_to_group = self.block_to_group.write();
            for id in &result.data_block_ids {
                block_to_group.insert(*id, result.primary_cbl_checksum);
            }
        }

        let mut magnet_url = result.magnet_url;
        magnet_url.parity_checksums = parity_block_ids.clone().unwrap_or_default();

        debug!(
            "store: registered CBL {} with {} block(s), {} parity shard(s)",
            result.primary_cbl_checksum,
            result.block_ids.len(),
            parity_block_ids.as_ref().map(|p| p.len()).unwrap_or(0)
        );

        Ok(StoreCblResult {
            magnet_url,
            primary_cbl_checksum: result.primary_cbl_checksum,
            block_ids: result.block_ids,
            parity_block_ids,
            is_encrypted: false,
        })
    }

    pub fn retrieve_cbl<S: CblSigner>(&self, signer: &S, primary: &Checksum) -> Result<Vec<u8>, Error> {
        Ok(bc_cbl::retrieve_cbl(self, signer, primary, self.config.id_size)?)
    }

    /// Parses a magnet URL and confirms its primary CBL checksum is one
    /// this store actually knows about, so a stale or foreign magnet link
    /// fails fast instead of only surfacing as a later retrieve miss.
    pub fn parse_magnet_url(&self, magnet: &str) -> Result<MagnetUrl, Error> {
        let parsed = MagnetUrl::parse(magnet)?;
        if let Some(primary) = parsed.primary_cbl_checksum {
            if !self.cbl_partners.read().contains_key(&primary) {
                return Err(Error::UnknownCbl(primary.to_hex()));
            }
        }
        Ok(parsed)
    }

    /// Releases a CBL's claim on its blocks, making any no-longer-referenced
    /// partner eligible for [`delete`](Self::delete) again.
    pub fn forget_cbl(&self, primary: &Checksum) {
        let owned = self.cbl_partners.write().remove(primary);
        if let Some(block_ids) = owned {
            let mut referenced = self.referenced_by.write();
            for id in block_ids {
                if let Some(set) = referenced.get_mut(&id) {
                    set.remove(primary);
                }
            }
        }
        self.data_block_groups.write().remove(primary);
        self.block_to_group.write().retain(|_, cbl| cbl != primary);
    }

    fn register_partners(&self, cbl: Checksum, block_ids: &[Checksum]) {
        let mut partners = self.cbl_partners.write();
        let mut referenced = self.referenced_by.write();
        let entry = partners.entry(cbl).or_default();
        for id in block_ids {
            entry.insert(*id);
            referenced.entry(*id).or_default().insert(cbl);
        }
    }

    fn generate_and_store_parity(
        &self,
        data_block_ids: &[Checksum],
        durability: DurabilityLevel,
    ) -> Result<Option<Vec<Checksum>>, Error> {
        let parity_count = durability.parity_count(self.config.high_durability_parity);
        if parity_count == 0 {
            return Ok(None);
        }
        let data_blocks: Vec<Vec<u8>> = data_block_ids
            .iter()
            .map(|c| self.get(c).expect("data block just written must exist"))
            .collect();
        let parity_shards = bc_fec::generate_parity(&data_blocks, parity_count)?;
        let ids = parity_shards.into_iter().map(|shard| self.put(shard)).collect();
        Ok(Some(ids))
    }

    /// Reconstructs `checksum` via Reed-Solomon if it belongs to a
    /// durability group with enough surviving shards (spec §4.8). Recovered
    /// shards are written back so future lookups are free.
    fn try_recover(&self, checksum: &Checksum) -> Option<Vec<u8>> {
        let cbl = *self.block_to_group.read().get(checksum)?;
        let (data_ids, parity_ids) = self.data_block_groups.read().get(&cbl)?.clone();

        let mut shards: Vec<Option<Vec<u8>>> = Vec::with_capacity(data_ids.len() + parity_ids.len());
        {
            let blocks = self.blocks.read();
            for id in data_ids.iter().chain(parity_ids.iter()) {
                shards.push(blocks.get(id).cloned());
            }
        }

        let recovered = bc_fec::reconstruct(data_ids.len(), parity_ids.len(), shards).ok()?;
        trace!("store: recovered {} data shard(s) for CBL {cbl} via parity", recovered.len());

        let mut blocks = self.blocks.write();
        for (id, bytes) in data_ids.iter().zip(recovered.into_iter()) {
            blocks.entry(*id).or_insert(bytes);
        }
        blocks.get(checksum).cloned()
    }
}

impl RandomBlockPool for MemoryBlockStore {
    fn try_reuse(&self, block_size: usize) -> Option<Vec<u8>> {
        let mut pool = self.random_pool.write();
        let blocks = self.blocks.read();
        let position = pool
            .iter()
            .position(|c| blocks.get(c).map(|b| b.len()) == Some(block_size))?;
        let checksum = pool.remove(position);
        blocks.get(&checksum).cloned()
    }

    fn insert_random(&self, bytes: Vec<u8>) -> Checksum {
        let checksum = self.put(bytes);
        self.random_pool.write().push(checksum);
        checksum
    }
}

impl bc_cbl::BlockSink for MemoryBlockStore {
    fn put(&self, payload: Vec<u8>) -> Checksum {
        MemoryBlockStore::put(self, payload)
    }
}

impl bc_cbl::BlockSource for MemoryBlockStore {
    fn get(&self, checksum: &Checksum) -> Option<Vec<u8>> {
        MemoryBlockStore::get(self, checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_cbl::CblSigner as _;
    use bc_primitives::eq_ct;

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
            eq_ct(&self.sign(data), signature)
        }
    }

    fn store() -> MemoryBlockStore {
        MemoryBlockStore::new(StoreConfig {
            id_size: 16,
            high_durability_parity: 2,
        })
    }

    #[test]
    fn put_is_idempotent_and_content_addressed() {
        let store = store();
        let a = store.put(b"hello".to_vec());
        let b = store.put(b"hello".to_vec());
        assert_eq!(a, b);
        assert_eq!(store.blocks.read().len(), 1);
    }

    #[test]
    fn get_after_put_round_trips() {
        let store = store();
        let checksum = store.put(b"payload".to_vec());
        assert_eq!(store.get(&checksum), Some(b"payload".to_vec()));
        assert!(store.has(&checksum));
    }

    #[test]
    fn delete_removes_only_named_block() {
        let store = store();
        let a = store.put(b"a".to_vec());
        let b = store.put(b"b".to_vec());
        store.delete(&a).unwrap();
        assert!(!store.has(&a));
        assert!(store.has(&b));
    }

    #[test]
    fn delete_of_missing_block_fails() {
        let store = store();
        let ghost = sha3_512(b"never stored");
        assert!(matches!(store.delete(&ghost), Err(Error::NotFound(_))));
    }

    #[test]
    fn s1_store_and_retrieve_round_trips() {
        let store = store();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();

        let result = store
            .store_cbl_with_whitening(
                &payload,
                &signer,
                StoreCblOptions {
                    block_size: bc_block::BlockSize::Small,
                    tuple_size: 3,
                    extended: None,
                    durability: DurabilityLevel::Ephemeral,
                    date_created_ms: 1,
                },
            )
            .unwrap();

        let recovered = store.retrieve_cbl(&signer, &result.primary_cbl_checksum).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn standard_durability_survives_one_lost_data_block() {
        let store = store();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload = vec![42u8; bc_block::BlockSize::Small.bytes() * 3];

        let result = store
            .store_cbl_with_whitening(
                &payload,
                &signer,
                StoreCblOptions {
                    block_size: bc_block::BlockSize::Small,
                    tuple_size: 3,
                    extended: None,
                    durability: DurabilityLevel::Standard,
                    date_created_ms: 1,
                },
            )
            .unwrap();
        assert_eq!(result.parity_block_ids.as_ref().unwrap().len(), 1);

        // destroy one whitened data block directly in the backing map,
        // bypassing delete()'s in-use refusal, to simulate real data loss.
        let victim = store.data_block_groups.read().get(&result.primary_cbl_checksum).unwrap().0[0];
        store.blocks.write().remove(&victim);

        let recovered = store.retrieve_cbl(&signer, &result.primary_cbl_checksum).unwrap();
        assert_eq!(recovered, payload);
    }

    #[test]
    fn delete_refuses_live_whitening_partner_until_cbl_forgotten() {
        let store = store();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let payload = vec![1u8; 100];
        let result = store
            .store_cbl_with_whitening(
                &payload,
                &signer,
                StoreCblOptions {
                    block_size: bc_block::BlockSize::Small,
                    tuple_size: 3,
                    extended: None,
                    durability: DurabilityLevel::Ephemeral,
                    date_created_ms: 1,
                },
            )
            .unwrap();

        let partner = result.block_ids[0];
        assert!(matches!(store.delete(&partner), Err(Error::BlockInUse(_))));
        // refusal is monotonic: repeating the same delete fails the same way.
        assert!(matches!(store.delete(&partner), Err(Error::BlockInUse(_))));

        store.forget_cbl(&result.primary_cbl_checksum);
        assert!(store.delete(&partner).is_ok());
    }

    #[test]
    fn random_pool_reuse_consumes_the_entry() {
        let store = store();
        let checksum = store.insert_random(vec![9u8; 64]);
        assert_eq!(store.list_random_pool(), vec![checksum]);
        let reused = store.try_reuse(64);
        assert_eq!(reused, Some(vec![9u8; 64]));
        assert!(store.list_random_pool().is_empty());
    }

    #[test]
    fn parse_magnet_url_rejects_a_cbl_this_store_never_wrote() {
        let store = store();
        let signer = FixedSigner { id: vec![0u8; 16] };
        let result = store
            .store_cbl_with_whitening(
                b"payload",
                &signer,
                StoreCblOptions {
                    block_size: bc_block::BlockSize::Small,
                    tuple_size: 3,
                    extended: None,
                    durability: DurabilityLevel::Ephemeral,
                    date_created_ms: 1,
                },
            )
            .unwrap();

        let known = store.parse_magnet_url(&result.magnet_url.encode().unwrap()).unwrap();
        assert_eq!(known.primary_cbl_checksum, Some(result.primary_cbl_checksum));

        let mut foreign = result.magnet_url.clone();
        foreign.primary_cbl_checksum = Some(sha3_512(b"never stored"));
        assert!(matches!(store.parse_magnet_url(&foreign.encode().unwrap()), Err(Error::UnknownCbl(_))));
    }
}
