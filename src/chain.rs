//! Chain validation and an in-memory chain.
//!
//! Validation is a single read-only pass over a slice: the first block is
//! trusted as the root and every following block must link to the one
//! before it. Validators never mutate their input, so independent
//! snapshots can be checked concurrently.

use crate::block::{Block, BlockStatus};
use crate::difficulty::DifficultyPolicy;
use crate::error::{ChainError, Result};
use tracing::warn;

/// Validate `blocks`, reporting the first block that fails to link.
pub fn validate_chain(blocks: &[Block], policy: &DifficultyPolicy) -> Result<()> {
    if blocks.is_empty() {
        return Err(ChainError::EmptyChain);
    }
    for (index, pair) in blocks.windows(2).enumerate() {
        let status = pair[1].verify_links_to(&pair[0], policy);
        if !status.is_ok() {
            return Err(ChainError::InvalidBlock {
                index: index + 1,
                status,
            });
        }
    }
    Ok(())
}

/// True if `blocks` is non-empty and every block links to its predecessor.
pub fn is_valid_chain(blocks: &[Block], policy: &DifficultyPolicy) -> bool {
    validate_chain(blocks, policy).is_ok()
}

/// An append-only chain rooted at a verified block.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    policy: DifficultyPolicy,
}

impl Chain {
    /// Start a chain at the genesis record.
    pub fn new(policy: DifficultyPolicy) -> Result<Self> {
        let genesis = Block::genesis(&policy)?;
        Ok(Self {
            blocks: vec![genesis],
            policy,
        })
    }

    /// Adopt a received sequence after validating it.
    ///
    /// The first block is the root; it is accepted only if its own stamp
    /// verifies.
    pub fn from_blocks(blocks: Vec<Block>, policy: DifficultyPolicy) -> Result<Self> {
        let root = blocks.first().ok_or(ChainError::EmptyChain)?;
        let status = root.verify_signature(&policy);
        if !status.is_ok() {
            return Err(ChainError::InvalidBlock { index: 0, status });
        }
        validate_chain(&blocks, &policy)?;
        Ok(Self { blocks, policy })
    }

    pub fn policy(&self) -> &DifficultyPolicy {
        &self.policy
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> &Block {
        // Construction guarantees a root block
        &self.blocks[self.blocks.len() - 1]
    }

    /// Append `block` if it links to the current tip.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let status = block.verify_links_to(self.tip(), &self.policy);
        if status != BlockStatus::Ok {
            warn!(
                serial_number = block.serial_number(),
                %status,
                "rejected block"
            );
            return Err(ChainError::InvalidBlock {
                index: self.blocks.len(),
                status,
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// An owned copy for validating or sending while the chain keeps growing.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::Miner;

    fn easy() -> DifficultyPolicy {
        DifficultyPolicy::new(4)
    }

    fn mined_chain(len: usize, seed: u64) -> Chain {
        let policy = easy();
        let mut chain = Chain::new(policy).unwrap();
        let mut miner = Miner::seeded(policy, seed);
        let wallets = [0xA1u32, 0xB2];
        while chain.len() < len {
            let wallet = wallets[chain.len() % 2];
            let block = miner.mine(wallet, chain.tip(), 1_000_000).unwrap();
            chain.append(block).unwrap();
        }
        chain
    }

    #[test]
    fn test_empty_chain_is_invalid() {
        assert!(!is_valid_chain(&[], &easy()));
        assert!(matches!(validate_chain(&[], &easy()), Err(ChainError::EmptyChain)));
    }

    #[test]
    fn test_single_root_is_valid() {
        let policy = easy();
        let genesis = Block::genesis(&policy).unwrap();
        assert!(is_valid_chain(&[genesis], &policy));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = mined_chain(6, 11);
        assert_eq!(chain.len(), 6);
        assert_eq!(chain.tip().serial_number(), 5);
        assert!(is_valid_chain(chain.blocks(), chain.policy()));
    }

    #[test]
    fn test_validation_does_not_mutate_input() {
        let chain = mined_chain(4, 12);
        let before = chain.snapshot();
        assert!(is_valid_chain(&before, chain.policy()));
        assert_eq!(before, chain.snapshot());
        assert_eq!(before.len(), 4);
    }

    #[test]
    fn test_reports_first_bad_index() {
        let chain = mined_chain(5, 13);
        let mut blocks = chain.snapshot();
        blocks.swap(2, 3);
        match validate_chain(&blocks, chain.policy()) {
            Err(ChainError::InvalidBlock { index, status }) => {
                assert_eq!(index, 2);
                assert_eq!(status, BlockStatus::BadSerialNo);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_append_rejects_unlinked_block() {
        let mut chain = mined_chain(3, 14);
        let stale = chain.blocks()[1].clone();
        let err = chain.append(stale).unwrap_err();
        assert!(matches!(
            err,
            ChainError::InvalidBlock { index: 3, status: BlockStatus::BadSerialNo }
        ));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_from_blocks_validates_root_and_links() {
        let chain = mined_chain(3, 15);
        let adopted = Chain::from_blocks(chain.snapshot(), easy()).unwrap();
        assert_eq!(adopted.len(), 3);

        let mut broken_root = chain.snapshot();
        let mut root = broken_root[0].clone();
        root.seal_signature(&[0u8; 16]);
        broken_root[0] = root;
        assert!(matches!(
            Chain::from_blocks(broken_root, easy()),
            Err(ChainError::InvalidBlock { index: 0, .. })
        ));
        assert!(matches!(
            Chain::from_blocks(Vec::new(), easy()),
            Err(ChainError::EmptyChain)
        ));
    }
}
