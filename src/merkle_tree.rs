use super::*;

/// Precomputed merkle path for a template's transaction set.
///
/// The coinbase occupies the first leaf but changes per share, so the
/// tree stores only the per-level sibling of that first slot. Folding
/// a coinbase hash through the steps yields the root without touching
/// the other transactions again.
#[derive(Debug, Clone, PartialEq)]
pub struct MerkleTree {
    steps: Vec<[u8; 32]>,
}

impl MerkleTree {
    /// Builds the step list from the non-coinbase transaction hashes,
    /// in internal byte order.
    pub fn new(leaves: &[[u8; 32]]) -> Self {
        let mut steps = Vec::new();
        let mut level = leaves.to_vec();

        while !level.is_empty() {
            // The implicit coinbase slot makes the full level one node
            // wider, so an even `level` is the odd case.
            if level.len() % 2 == 0 {
                level.push(level[level.len() - 1]);
            }

            steps.push(level[0]);

            level = level[1..]
                .chunks(2)
                .map(|pair| join(&pair[0], &pair[1]))
                .collect();
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[[u8; 32]] {
        &self.steps
    }

    /// Merkle root for `coinbase_hash` in the first slot, in internal
    /// byte order.
    pub fn root_with_first(&self, coinbase_hash: [u8; 32]) -> [u8; 32] {
        self.steps
            .iter()
            .fold(coinbase_hash, |acc, step| join(&acc, step))
    }
}

fn join(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut buffer = [0u8; 64];
    buffer[..32].copy_from_slice(left);
    buffer[32..].copy_from_slice(right);
    sha256d::Hash::hash(&buffer).to_byte_array()
}
