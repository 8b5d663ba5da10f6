//! Peer exchange framing.
//!
//! Requests and responses share one layout, all integers big-endian:
//!
//! ```text
//! i32 command
//! i32 0xBEEFBEEF
//! i32 node count, then per node:
//!     u8 len + name, u8 len + host, u16 port, i32 last seen (unix seconds)
//! i32 0xDEADDEAD
//! i32 block count, then 36-byte blocks in chain order
//! ```
//!
//! A sentinel mismatch aborts the exchange; nothing read so far is kept.

use crate::block::{Block, BLOCK_SIZE};
use crate::error::{ChainError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const BEEF_BEEF: i32 = 0xBEEF_BEEF_u32 as i32;
pub const DEAD_DEAD: i32 = 0xDEAD_DEAD_u32 as i32;

/// Command sent by a node asking for a peer's view of the network.
pub const CMD_REQUEST: i32 = 1;
/// Command echoed back in replies.
pub const CMD_RESPONSE: i32 = 2;

pub const MAX_NODES: usize = 10_000;
pub const MAX_BLOCKS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub last_seen: i32,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16, last_seen: i32) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            last_seen,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMessage {
    pub command: i32,
    pub nodes: Vec<NodeInfo>,
    pub blocks: Vec<Block>,
}

impl PeerMessage {
    /// A request carrying no nodes or blocks.
    pub fn empty_request() -> Self {
        Self {
            command: CMD_REQUEST,
            nodes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn encoded_len(&self) -> usize {
        let nodes: usize = self
            .nodes
            .iter()
            .map(|n| 1 + n.name.len() + 1 + n.host.len() + 2 + 4)
            .sum();
        4 * 5 + nodes + self.blocks.len() * BLOCK_SIZE
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.command.to_be_bytes());
        buf.extend_from_slice(&BEEF_BEEF.to_be_bytes());
        buf.extend_from_slice(&count_field("nodes", self.nodes.len(), MAX_NODES)?.to_be_bytes());
        for node in &self.nodes {
            put_len_str(&mut buf, &node.name)?;
            put_len_str(&mut buf, &node.host)?;
            buf.extend_from_slice(&node.port.to_be_bytes());
            buf.extend_from_slice(&node.last_seen.to_be_bytes());
        }
        buf.extend_from_slice(&DEAD_DEAD.to_be_bytes());
        buf.extend_from_slice(&count_field("blocks", self.blocks.len(), MAX_BLOCKS)?.to_be_bytes());
        for block in &self.blocks {
            buf.extend_from_slice(block.as_bytes());
        }
        Ok(buf)
    }
}

fn count_field(what: &str, len: usize, max: usize) -> Result<i32> {
    if len > max {
        return Err(ChainError::Protocol(format!(
            "too many {}: {} exceeds {}",
            what, len, max
        )));
    }
    // max fits comfortably in i32
    Ok(len as i32)
}

fn put_len_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u8::try_from(s.len()).map_err(|_| {
        ChainError::Protocol(format!("string of {} bytes does not fit a u8 length", s.len()))
    })?;
    buf.push(len);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

async fn read_count<R: AsyncRead + Unpin>(r: &mut R, what: &str, max: usize) -> Result<usize> {
    let count = r.read_i32().await?;
    match usize::try_from(count) {
        Ok(n) if n <= max => Ok(n),
        _ => Err(ChainError::Protocol(format!("bad {} count {}", what, count))),
    }
}

async fn read_len_str<R: AsyncRead + Unpin>(r: &mut R) -> Result<String> {
    let len = r.read_u8().await? as usize;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes).await?;
    String::from_utf8(bytes).map_err(|e| ChainError::Protocol(format!("invalid UTF-8 string: {}", e)))
}

async fn read_node<R: AsyncRead + Unpin>(r: &mut R) -> Result<NodeInfo> {
    let name = read_len_str(r).await?;
    let host = read_len_str(r).await?;
    // Ports above 32767 are common, so the field is unsigned
    let port = r.read_u16().await?;
    let last_seen = r.read_i32().await?;
    Ok(NodeInfo {
        name,
        host,
        port,
        last_seen,
    })
}

pub async fn read_block<R: AsyncRead + Unpin>(r: &mut R) -> Result<Block> {
    let mut data = [0u8; BLOCK_SIZE];
    r.read_exact(&mut data).await?;
    Ok(Block::from(data))
}

/// Read one framed message.
pub async fn read_message<R: AsyncRead + Unpin>(r: &mut R) -> Result<PeerMessage> {
    let command = r.read_i32().await?;

    let beef = r.read_i32().await?;
    if beef != BEEF_BEEF {
        return Err(ChainError::Protocol(format!(
            "expected BEEFBEEF, got {:08X}",
            beef as u32
        )));
    }
    let node_count = read_count(r, "node", MAX_NODES).await?;
    let mut nodes = Vec::with_capacity(node_count.min(64));
    for _ in 0..node_count {
        nodes.push(read_node(r).await?);
    }

    let dead = r.read_i32().await?;
    if dead != DEAD_DEAD {
        return Err(ChainError::Protocol(format!(
            "expected DEADDEAD, got {:08X}",
            dead as u32
        )));
    }
    let block_count = read_count(r, "block", MAX_BLOCKS).await?;
    let mut blocks = Vec::with_capacity(block_count.min(1024));
    for _ in 0..block_count {
        blocks.push(read_block(r).await?);
    }

    Ok(PeerMessage {
        command,
        nodes,
        blocks,
    })
}

/// Write one framed message and flush it.
pub async fn write_message<W: AsyncWrite + Unpin>(w: &mut W, msg: &PeerMessage) -> Result<()> {
    let buf = msg.encode()?;
    w.write_all(&buf).await?;
    w.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyPolicy;

    fn sample() -> PeerMessage {
        let genesis = Block::genesis(&DifficultyPolicy::default()).unwrap();
        PeerMessage {
            command: CMD_RESPONSE,
            nodes: vec![
                NodeInfo::new("alpha", "10.0.0.1", 8080, 1_700_000_000),
                NodeInfo::new("beta", "example.org", 50_000, 0),
            ],
            blocks: vec![genesis],
        }
    }

    #[test]
    fn test_encoded_layout() {
        let buf = sample().encode().unwrap();
        assert_eq!(buf.len(), sample().encoded_len());
        assert_eq!(&buf[0..4], &[0, 0, 0, 2]);
        assert_eq!(&buf[4..8], &[0xBE, 0xEF, 0xBE, 0xEF]);
        assert_eq!(&buf[8..12], &[0, 0, 0, 2]);
        // First node: len-prefixed name then host
        assert_eq!(buf[12], 5);
        assert_eq!(&buf[13..18], b"alpha");
        assert_eq!(buf[18], 8);
        // Port 8080 = 0x1F90
        assert_eq!(&buf[27..29], &[0x1F, 0x90]);
        let tail = &buf[buf.len() - BLOCK_SIZE - 8..];
        assert_eq!(&tail[0..4], &[0xDE, 0xAD, 0xDE, 0xAD]);
        assert_eq!(&tail[4..8], &[0, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_read_back_high_port() {
        let buf = sample().encode().unwrap();
        let msg = read_message(&mut buf.as_slice()).await.unwrap();
        assert_eq!(msg, sample());
        assert_eq!(msg.nodes[1].port, 50_000);
    }

    #[tokio::test]
    async fn test_bad_first_sentinel() {
        let mut buf = sample().encode().unwrap();
        buf[4] = 0;
        let err = read_message(&mut buf.as_slice()).await.unwrap_err();
        assert!(matches!(err, ChainError::Protocol(msg) if msg.contains("BEEFBEEF")));
    }

    #[tokio::test]
    async fn test_bad_second_sentinel() {
        let mut buf = sample().encode().unwrap();
        let at = buf.len() - BLOCK_SIZE - 8;
        buf[at] = 0;
        let err = read_message(&mut buf.as_slice()).await.unwrap_err();
        assert!(matches!(err, ChainError::Protocol(msg) if msg.contains("DEADDEAD")));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_io_error() {
        let buf = sample().encode().unwrap();
        let short = &buf[..buf.len() - 1];
        let err = read_message(&mut &short[..]).await.unwrap_err();
        assert!(matches!(err, ChainError::Io(_)));
    }

    #[tokio::test]
    async fn test_negative_count_rejected() {
        let mut buf = PeerMessage::empty_request().encode().unwrap();
        buf[8..12].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            read_message(&mut buf.as_slice()).await,
            Err(ChainError::Protocol(_))
        ));
    }

    #[test]
    fn test_long_string_rejected_on_write() {
        let mut msg = PeerMessage::empty_request();
        msg.nodes.push(NodeInfo::new("n".repeat(256), "h", 1, 0));
        assert!(matches!(msg.encode(), Err(ChainError::Protocol(_))));
    }
}
