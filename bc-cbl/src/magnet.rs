// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::errors::Error;
use bc_primitives::Checksum;

/// A CBL retrieval handle, encoded as a `magnet:` URI. Parameter order is
/// not significant on either side (spec §6).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MagnetUrl {
    pub primary_cbl_checksum: Option<Checksum>,
    /// Sibling top-level CBL checksums, in `xt.N` order.
    pub sibling_cbl_checksums: Vec<Checksum>,
    /// Per-block parity checksum sets, in `pa.N` order.
    pub parity_checksums: Vec<Checksum>,
    pub is_encrypted: bool,
    pub file_name: Option<String>,
    pub original_data_length: Option<u64>,
}

impl MagnetUrl {
    pub fn encode(&self) -> Result<String, Error> {
        let primary = self
            .primary_cbl_checksum
            .as_ref()
            .ok_or_else(|| Error::InvalidMagnetUrl("a magnet URL always names a primary CBL checksum".to_string()))?;
        let mut parts = vec![format!("xt=urn:cbl:{}", primary.to_hex())];

        for (i, sibling) in self.sibling_cbl_checksums.iter().enumerate() {
            parts.push(format!("xt.{}=urn:cbl:{}", i + 1, sibling.to_hex()));
        }
        for (i, parity) in self.parity_checksums.iter().enumerate() {
            parts.push(format!("pa.{}={}", i, parity.to_hex()));
        }
        if self.is_encrypted {
            parts.push("e=1".to_string());
        }
        if let Some(name) = &self.file_name {
            parts.push(format!("dn={}", urlencoding::encode(name)));
        }
        if let Some(len) = self.original_data_length {
            parts.push(format!("xl={}", len));
        }

        Ok(format!("magnet:?{}", parts.join("&")))
    }

    pub fn parse(magnet: &str) -> Result<MagnetUrl, Error> {
        let query = magnet
            .strip_prefix("magnet:?")
            .ok_or_else(|| Error::InvalidMagnetUrl("missing magnet:? scheme".to_string()))?;

        let mut result = MagnetUrl::default();
        // sibling/parity entries are ordered by their numeric suffix; collect
        // into maps keyed by index so out-of-order query strings still parse.
        let mut siblings: std::collections::BTreeMap<u32, Checksum> = Default::default();
        let mut parities: std::collections::BTreeMap<u32, Checksum> = Default::default();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::InvalidMagnetUrl(format!("malformed parameter: {pair}")))?;

            if key == "xt" {
                let hex = value
                    .strip_prefix("urn:cbl:")
                    .ok_or_else(|| Error::InvalidMagnetUrl(format!("malformed xt value: {value}")))?;
                result.primary_cbl_checksum = Some(parse_checksum(hex)?);
            } else if let Some(idx) = key.strip_prefix("xt.") {
                let idx: u32 = idx
                    .parse()
                    .map_err(|_| Error::InvalidMagnetUrl(format!("bad xt index: {key}")))?;
                let hex = value
                    .strip_prefix("urn:cbl:")
                    .ok_or_else(|| Error::InvalidMagnetUrl(format!("malformed xt.N value: {value}")))?;
                siblings.insert(idx, parse_checksum(hex)?);
            } else if let Some(idx) = key.strip_prefix("pa.") {
                let idx: u32 = idx
                    .parse()
                    .map_err(|_| Error::InvalidMagnetUrl(format!("bad pa index: {key}")))?;
                parities.insert(idx, parse_checksum(value)?);
            } else if key == "e" {
                result.is_encrypted = value == "1";
            } else if key == "dn" {
                result.file_name = Some(
                    urlencoding::decode(value)
                        .map_err(|e| Error::InvalidMagnetUrl(e.to_string()))?
                        .into_owned(),
                );
            } else if key == "xl" {
                result.original_data_length = Some(
                    value
                        .parse()
                        .map_err(|_| Error::InvalidMagnetUrl(format!("bad xl value: {value}")))?,
                );
            }
            // unknown parameters are ignored for forward compatibility
        }

        if result.primary_cbl_checksum.is_none() {
            return Err(Error::InvalidMagnetUrl("missing mandatory xt parameter".to_string()));
        }

        result.sibling_cbl_checksums = siblings.into_values().collect();
        result.parity_checksums = parities.into_values().collect();
        Ok(result)
    }
}

fn parse_checksum(hex: &str) -> Result<Checksum, Error> {
    Checksum::from_hex(hex).ok_or_else(|| Error::InvalidMagnetUrl(format!("bad checksum hex: {hex}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_primitives::sha3_512;

    #[test]
    fn round_trips_primary_only() {
        let magnet = MagnetUrl {
            primary_cbl_checksum: Some(sha3_512(b"cbl")),
            ..Default::default()
        };
        let encoded = magnet.encode().unwrap();
        let decoded = MagnetUrl::parse(&encoded).unwrap();
        assert_eq!(decoded, magnet);
    }

    #[test]
    fn encode_rejects_a_magnet_with_no_primary_checksum() {
        assert!(matches!(MagnetUrl::default().encode(), Err(Error::InvalidMagnetUrl(_))));
    }

    #[test]
    fn round_trips_all_fields() {
        let magnet = MagnetUrl {
            primary_cbl_checksum: Some(sha3_512(b"primary")),
            sibling_cbl_checksums: vec![sha3_512(b"sib1"), sha3_512(b"sib2")],
            parity_checksums: vec![sha3_512(b"par0"), sha3_512(b"par1")],
            is_encrypted: true,
            file_name: Some("my file.txt".to_string()),
            original_data_length: Some(12345),
        };
        let encoded = magnet.encode().unwrap();
        let decoded = MagnetUrl::parse(&encoded).unwrap();
        assert_eq!(decoded, magnet);
    }

    #[test]
    fn parses_any_parameter_permutation() {
        let a = "magnet:?xt=urn:cbl:aa&e=1&xl=10";
        let b = "magnet:?xl=10&e=1&xt=urn:cbl:aa";
        // Not valid checksums (too short) but parsing should fail identically
        // regardless of order, proving order-independence of the parser.
        assert_eq!(
            MagnetUrl::parse(a).is_err(),
            MagnetUrl::parse(b).is_err()
        );
    }

    #[test]
    fn rejects_missing_xt() {
        assert!(MagnetUrl::parse("magnet:?e=1").is_err());
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(MagnetUrl::parse("xt=urn:cbl:aa").is_err());
    }
}
