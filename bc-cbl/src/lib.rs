// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Constituent Block List codec, CBL-of-CBLs assembly, and magnet URL
//! encoding.

pub mod assembler;
pub mod crc;
pub mod errors;
pub mod header;
pub mod magnet;
pub mod signer;

pub use assembler::{retrieve_cbl, store_cbl_with_whitening, BlockSink, BlockSource, StoreParams, StoreResult};
pub use errors::Error;
pub use header::{
    checksum, decode_header, eq_checksums, make_header, validate_signature, CblBlockType,
    CblHeader, ExtendedMeta, MakeHeaderParams, MAGIC_BYTE, VERSION_BYTE,
};
pub use magnet::MagnetUrl;
pub use signer::CblSigner;
