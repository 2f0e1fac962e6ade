// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use log::{debug, warn};
use reed_solomon_erasure::galois_8::ReedSolomon;

/// Derives `parity_count` parity shards from `data_blocks`, treating each
/// as one Reed-Solomon data shard over GF(2^8). All blocks must be the same
/// length. Returns only the parity shards; callers already have the data.
pub fn generate_parity(data_blocks: &[Vec<u8>], parity_count: usize) -> Result<Vec<Vec<u8>>, Error> {
    if data_blocks.is_empty() {
        return Err(Error::EmptyDataBlocks);
    }
    if parity_count == 0 {
        return Ok(Vec::new());
    }
    let shard_len = data_blocks[0].len();
    for (index, block) in data_blocks.iter().enumerate() {
        if block.len() != shard_len {
            return Err(Error::ShardLengthMismatch {
                index,
                expected: shard_len,
                actual: block.len(),
            });
        }
    }

    let rs = ReedSolomon::new(data_blocks.len(), parity_count)?;
    let mut shards: Vec<Vec<u8>> = data_blocks.to_vec();
    shards.extend(std::iter::repeat(vec![0u8; shard_len]).take(parity_count));
    rs.encode(&mut shards)?;

    debug!(
        "fec: generated {parity_count} parity shard(s) for {} data shard(s)",
        data_blocks.len()
    );
    Ok(shards.split_off(data_blocks.len()))
}

/// Reconstructs missing or corrupt data shards. `shards` holds `data_count +
/// parity_count` entries in original order; `None` marks a shard known to
/// be missing or failing checksum verification. Returns the `data_count`
/// reconstructed data shards. Fails with [`Error::UnrecoverableLoss`] if more
/// shards are missing than there is parity to cover.
pub fn reconstruct(
    data_count: usize,
    parity_count: usize,
    mut shards: Vec<Option<Vec<u8>>>,
) -> Result<Vec<Vec<u8>>, Error> {
    let total = data_count + parity_count;
    let missing = shards.iter().filter(|s| s.is_none()).count();
    if missing > parity_count {
        warn!("fec: {missing} of {total} shards missing, exceeding {parity_count} parity shards");
        return Err(Error::UnrecoverableLoss {
            missing,
            parity_count,
            total,
        });
    }

    let rs = ReedSolomon::new(data_count, parity_count)?;
    rs.reconstruct(&mut shards)?;

    let data_shards = shards
        .into_iter()
        .take(data_count)
        .map(|s| s.expect("reed-solomon reconstruct fills every shard on success"))
        .collect();
    Ok(data_shards)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(byte: u8) -> Vec<u8> {
        vec![byte; 64]
    }

    #[test]
    fn standard_durability_recovers_one_lost_block() {
        let data = vec![block(1), block(2), block(3)];
        let parity = generate_parity(&data, 1).unwrap();
        assert_eq!(parity.len(), 1);

        let mut shards: Vec<Option<Vec<u8>>> = data.iter().cloned().map(Some).collect();
        shards.extend(parity.into_iter().map(Some));
        shards[1] = None;

        let recovered = reconstruct(3, 1, shards).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn high_durability_recovers_two_lost_blocks() {
        let data = vec![block(10), block(20), block(30), block(40)];
        let parity = generate_parity(&data, 2).unwrap();

        let mut shards: Vec<Option<Vec<u8>>> = data.iter().cloned().map(Some).collect();
        shards.extend(parity.into_iter().map(Some));
        shards[0] = None;
        shards[2] = None;

        let recovered = reconstruct(4, 2, shards).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn fails_closed_when_losses_exceed_parity() {
        let data = vec![block(1), block(2)];
        let parity = generate_parity(&data, 1).unwrap();

        let mut shards: Vec<Option<Vec<u8>>> = data.iter().cloned().map(Some).collect();
        shards.extend(parity.into_iter().map(Some));
        shards[0] = None;
        shards[1] = None;

        assert!(matches!(
            reconstruct(2, 1, shards),
            Err(Error::UnrecoverableLoss { missing: 2, .. })
        ));
    }

    #[test]
    fn ephemeral_durability_generates_no_parity() {
        let data = vec![block(5)];
        assert_eq!(generate_parity(&data, 0).unwrap(), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn rejects_mismatched_shard_lengths() {
        let data = vec![vec![1u8; 64], vec![2u8; 32]];
        assert!(matches!(
            generate_parity(&data, 1),
            Err(Error::ShardLengthMismatch { index: 1, .. })
        ));
    }
}
