// File: compressa-hash/src/lib.rs
use serde::{Deserialize, Serialize};
use sha3::{digest::{ExtendableOutput, Update, XofReader}, Shake256};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const NODE_LEN: usize = 32; // 256-bit nodes

pub type Node = [u8; NODE_LEN];

// Domain labels
pub const DOM_LEAF: &str = "compressa.leaf";
pub const DOM_NODE: &str = "compressa.node";

#[inline]
pub fn shake256_256(data: &[u8]) -> Node {
    let mut hasher = Shake256::default();
    hasher.update(data);
    let mut xof = hasher.finalize_xof();
    let mut out = [0u8; NODE_LEN];
    xof.read(&mut out);
    out
}

#[inline]
pub fn h2(label: &str, a: &[u8], b: &[u8]) -> Node {
    let mut hasher = Shake256::default();
    hasher.update(label.as_bytes());
    hasher.update(&[0]);
    hasher.update(a);
    hasher.update(&[1]);
    hasher.update(b);
    let mut xof = hasher.finalize_xof();
    let mut out = [0u8; NODE_LEN];
    xof.read(&mut out);
    out
}

/// Legacy demo hash: 32-bit rolling `h*31 + c` over the lowercase hex form of
/// the input, with the resulting word repeated to fill a node.
///
/// NOT collision resistant. Only kept so demo output matches the web prototype.
pub fn toy_hash(data: &[u8]) -> Node {
    let mut h: i32 = 0;
    for c in hex::encode(data).bytes() {
        h = (h << 5).wrapping_sub(h).wrapping_add(c as i32);
    }
    let word = h.to_be_bytes();
    let mut out = [0u8; NODE_LEN];
    for chunk in out.chunks_exact_mut(4) {
        chunk.copy_from_slice(&word);
    }
    out
}

/// Leaf and interior node hashing used by the tree.
pub trait NodeHasher: Send + Sync {
    fn kind(&self) -> HashKind;
    fn leaf(&self, data: &[u8]) -> Node;
    fn node(&self, left: &[u8], right: &[u8]) -> Node;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ToyHasher;

impl NodeHasher for ToyHasher {
    fn kind(&self) -> HashKind { HashKind::Toy }
    fn leaf(&self, data: &[u8]) -> Node { toy_hash(data) }
    fn node(&self, left: &[u8], right: &[u8]) -> Node {
        let mut buf = Vec::with_capacity(left.len() + right.len());
        buf.extend_from_slice(left);
        buf.extend_from_slice(right);
        toy_hash(&buf)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Shake256Hasher;

impl NodeHasher for Shake256Hasher {
    fn kind(&self) -> HashKind { HashKind::Shake256 }
    fn leaf(&self, data: &[u8]) -> Node { h2(DOM_LEAF, data, &[]) }
    fn node(&self, left: &[u8], right: &[u8]) -> Node { h2(DOM_NODE, left, right) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Toy,
    #[default]
    Shake256,
}

impl HashKind {
    pub fn hasher(self) -> Box<dyn NodeHasher> {
        match self {
            HashKind::Toy => Box::new(ToyHasher),
            HashKind::Shake256 => Box::new(Shake256Hasher),
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { HashKind::Toy => "toy", HashKind::Shake256 => "shake256" })
    }
}

#[derive(Debug, Error)]
#[error("unknown hash kind `{0}` (expected `toy` or `shake256`)")]
pub struct UnknownHashKind(pub String);

impl FromStr for HashKind {
    type Err = UnknownHashKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toy" => Ok(HashKind::Toy),
            "shake256" => Ok(HashKind::Shake256),
            other => Err(UnknownHashKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake256_256_length_and_differs() {
        let a = shake256_256(b"hello");
        let b = shake256_256(b"world");
        assert_eq!(a.len(), NODE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn h2_domain_separation() {
        let x = h2("domain", b"a", b"b");
        let y = h2("domain2", b"a", b"b");
        assert_ne!(x, y);
        // Boundary between a and b is part of the input
        assert_ne!(h2("d", b"ab", b""), h2("d", b"a", b"b"));
    }

    #[test]
    fn toy_hash_known_values() {
        // Empty input leaves the accumulator at zero
        assert_eq!(toy_hash(&[]), [0u8; NODE_LEN]);
        // hex("\x01") = "01" -> h = '0'*31 + '1' = 48*31 + 49 = 1537 = 0x00000601
        let h = toy_hash(&[0x01]);
        assert_eq!(&h[..4], &[0x00, 0x00, 0x06, 0x01]);
        assert_eq!(&h[..4], &h[28..]);
    }

    #[test]
    fn toy_hash_wraps_and_repeats_word() {
        let data = vec![0xABu8; 4096];
        let h = toy_hash(&data);
        for chunk in h.chunks_exact(4) {
            assert_eq!(chunk, &h[..4]);
        }
    }

    #[test]
    fn hasher_kinds_disagree() {
        let toy = HashKind::Toy.hasher();
        let real = HashKind::Shake256.hasher();
        assert_eq!(toy.kind(), HashKind::Toy);
        assert_ne!(toy.leaf(b"acct"), real.leaf(b"acct"));
        // Leaf and node hashing are domain separated for the real hasher
        assert_ne!(real.leaf(b"ab"), real.node(b"a", b"b"));
    }

    #[test]
    fn hash_kind_parse() {
        assert_eq!("TOY".parse::<HashKind>().unwrap(), HashKind::Toy);
        assert_eq!("shake256".parse::<HashKind>().unwrap(), HashKind::Shake256);
        assert!("sha1".parse::<HashKind>().is_err());
        assert_eq!(HashKind::default(), HashKind::Shake256);
    }
}
