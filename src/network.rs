//! Thin TCP glue around the peer exchange framing.
//!
//! A client connects, sends one request and reads one response. The
//! responder answers every connection with this node's view of the
//! network and a snapshot of its chain. Faults on one connection are
//! logged and dropped; they never reach the chain.

use crate::chain::Chain;
use crate::error::{ChainError, Result};
use crate::wire::{read_message, write_message, NodeInfo, PeerMessage, CMD_RESPONSE};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// What a node knows and shares with peers.
#[derive(Debug)]
pub struct NodeState {
    pub me: NodeInfo,
    pub peers: Vec<NodeInfo>,
    pub chain: Chain,
}

pub type SharedState = Arc<RwLock<NodeState>>;

impl NodeState {
    pub fn new(me: NodeInfo, peers: Vec<NodeInfo>, chain: Chain) -> Self {
        Self { me, peers, chain }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Build the reply sent to a peer, stamping this node as seen now.
    pub fn response(&self) -> PeerMessage {
        let mut me = self.me.clone();
        me.last_seen = unix_timestamp();
        let mut nodes = Vec::with_capacity(self.peers.len() + 1);
        nodes.push(me);
        nodes.extend(self.peers.iter().cloned());
        PeerMessage {
            command: CMD_RESPONSE,
            nodes,
            blocks: self.chain.snapshot(),
        }
    }
}

pub fn unix_timestamp() -> i32 {
    // The wire field is 32 bits wide
    chrono::Utc::now().timestamp() as i32
}

/// Send `request` to `addr` and wait for the peer's reply.
pub async fn fetch_from_peer(addr: &str, request: &PeerMessage) -> Result<PeerMessage> {
    let exchange = async {
        info!(peer = addr, "sending request");
        let mut stream = TcpStream::connect(addr).await?;
        write_message(&mut stream, request).await?;
        read_message(&mut stream).await
    };
    timeout(EXCHANGE_TIMEOUT, exchange)
        .await
        .map_err(|_| ChainError::Protocol(format!("exchange with {} timed out", addr)))?
}

/// Answer peers on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    info!(addr = %listener.local_addr()?, "peer responder listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            match timeout(EXCHANGE_TIMEOUT, handle_connection(stream, state)).await {
                Ok(Ok(())) => debug!(%peer, "exchange complete"),
                Ok(Err(e)) => warn!(%peer, error = %e, "exchange failed"),
                Err(_) => warn!(%peer, "exchange timed out"),
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, state: SharedState) -> Result<()> {
    let request = read_message(&mut stream).await?;
    debug!(
        command = request.command,
        nodes = request.nodes.len(),
        blocks = request.blocks.len(),
        "request received"
    );
    // Build the reply under the read lock, send it without holding it
    let response = state.read().await.response();
    write_message(&mut stream, &response).await
}
