// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use bc_primitives::{sha3_512, xor_ct_many, Checksum};
use log::trace;
use rand::RngCore;

/// Lower bound on how many blocks participate in one whitening operation
/// (the data block itself plus at least this many randoms).
pub const TUPLE_MIN_SIZE: usize = 3;
/// Upper bound on whitening tuple size.
pub const TUPLE_MAX_SIZE: usize = 5;
/// Tuple size used when a caller does not specify one.
pub const DEFAULT_TUPLE_SIZE: usize = 3;

pub fn validate_tuple_size(t: usize) -> Result<(), Error> {
    if (TUPLE_MIN_SIZE..=TUPLE_MAX_SIZE).contains(&t) {
        Ok(())
    } else {
        Err(Error::InvalidTupleSize(t))
    }
}

/// Source of random-kind blocks for whitening: the block store sits behind
/// this trait so `bc-whitening` never depends on `bc-store` directly.
pub trait RandomBlockPool {
    /// Returns the payload of an existing `Random`-kind block of the given
    /// size, if the pool has one to reuse.
    fn try_reuse(&self, block_size: usize) -> Option<Vec<u8>>;
    /// Registers freshly generated random bytes as a `Random`-kind block
    /// and returns its checksum.
    fn insert_random(&self, bytes: Vec<u8>) -> Checksum;
}

/// The outcome of whitening one data block: the whitened payload plus the
/// ordered tuple of checksums `(W, R_1, .., R_{t-1})` the CBL must record.
pub struct WhitenedTuple {
    pub whitened_payload: Vec<u8>,
    /// `tuple[0]` is the whitened block's checksum; the rest are randoms,
    /// in the order they were combined.
    pub tuple: Vec<Checksum>,
}

/// Whitens one data block against `tuple_size - 1` random partners, drawn
/// from `pool` by reuse where possible and freshly generated otherwise.
pub fn whiten<P: RandomBlockPool>(
    data: &[u8],
    tuple_size: usize,
    pool: &P,
) -> Result<WhitenedTuple, Error> {
    validate_tuple_size(tuple_size)?;
    let block_size = data.len();

    let mut randoms: Vec<Vec<u8>> = Vec::with_capacity(tuple_size - 1);
    let mut random_checksums: Vec<Checksum> = Vec::with_capacity(tuple_size - 1);
    for _ in 0..tuple_size - 1 {
        let bytes = match pool.try_reuse(block_size) {
            Some(existing) => {
                trace!("whitening: reused random block from pool");
                existing
            }
            None => {
                trace!("whitening: generating fresh random block");
                let mut buf = vec![0u8; block_size];
                rand::thread_rng().fill_bytes(&mut buf);
                let checksum = pool.insert_random(buf.clone());
                random_checksums.push(checksum);
                randoms.push(buf);
                continue;
            }
        };
        let checksum = sha3_512(&bytes);
        random_checksums.push(checksum);
        randoms.push(bytes);
    }

    let mut refs: Vec<&[u8]> = Vec::with_capacity(tuple_size);
    refs.push(data);
    refs.extend(randoms.iter().map(|r| r.as_slice()));
    let whitened_payload = xor_ct_many(refs)?;
    let whitened_checksum = sha3_512(&whitened_payload);

    let mut tuple = Vec::with_capacity(tuple_size);
    tuple.push(whitened_checksum);
    tuple.extend(random_checksums);

    Ok(WhitenedTuple {
        whitened_payload,
        tuple,
    })
}

/// Reverses whitening: `fetched[0]` must be the whitened block's payload
/// and the rest the payloads of its partner randoms, in any order.
pub fn unwhiten(fetched: &[Vec<u8>]) -> Result<Vec<u8>, Error> {
    if fetched.is_empty() {
        return Err(Error::EmptyTuple);
    }
    let refs: Vec<&[u8]> = fetched.iter().map(|b| b.as_slice()).collect();
    Ok(xor_ct_many(refs)?)
}
