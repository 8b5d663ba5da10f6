//! Loopback tests for the peer exchange.

use hanukcoin::chain::{is_valid_chain, Chain};
use hanukcoin::difficulty::DifficultyPolicy;
use hanukcoin::error::ChainError;
use hanukcoin::miner::Miner;
use hanukcoin::network::{fetch_from_peer, serve, NodeState};
use hanukcoin::wallet::wallet_code;
use hanukcoin::wire::{
    read_message, write_message, NodeInfo, PeerMessage, BEEF_BEEF, CMD_RESPONSE,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

fn mined_chain(policy: DifficultyPolicy, len: usize) -> Chain {
    let mut chain = Chain::new(policy).unwrap();
    let mut miner = Miner::seeded(policy, 99);
    let wallets = [wallet_code("TEST1"), wallet_code("TEST2")];
    for i in 0..len {
        let block = miner.mine(wallets[i % 2], chain.tip(), 1_000_000).unwrap();
        chain.append(block).unwrap();
    }
    chain
}

#[tokio::test]
async fn test_duplex_round_trip() {
    let policy = DifficultyPolicy::new(4);
    let chain = mined_chain(policy, 3);
    let msg = PeerMessage {
        command: CMD_RESPONSE,
        nodes: vec![
            NodeInfo::new("alpha", "127.0.0.1", 8080, 1_700_000_000),
            NodeInfo::new("", "peer.example", 65535, 0),
        ],
        blocks: chain.snapshot(),
    };

    let (mut client, mut server) = tokio::io::duplex(4096);
    let sent = msg.clone();
    let writer = tokio::spawn(async move { write_message(&mut client, &sent).await });
    let received = read_message(&mut server).await.unwrap();
    writer.await.unwrap().unwrap();

    assert_eq!(received, msg);
    assert!(is_valid_chain(&received.blocks, &policy));
}

#[tokio::test]
async fn test_fetch_from_serving_node() {
    let policy = DifficultyPolicy::new(4);
    let chain = mined_chain(policy, 5);
    let expected = chain.snapshot();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let state = NodeState::new(
        NodeInfo::new("loopback", "127.0.0.1", 0, 0),
        vec![NodeInfo::new("friend", "10.1.2.3", 8081, 42)],
        chain,
    )
    .shared();
    let server = tokio::spawn(serve(listener, state.clone()));

    let reply = fetch_from_peer(&addr, &PeerMessage::empty_request())
        .await
        .unwrap();
    assert_eq!(reply.command, CMD_RESPONSE);
    assert_eq!(reply.nodes[0].name, "loopback");
    assert_eq!(reply.nodes[1], NodeInfo::new("friend", "10.1.2.3", 8081, 42));
    assert_eq!(reply.blocks, expected);
    assert!(is_valid_chain(&reply.blocks, &policy));

    // A second query sees blocks appended in between
    {
        let mut guard = state.write().await;
        let tip = guard.chain.tip().clone();
        let wallet = if tip.wallet_number() == wallet_code("TEST1") {
            wallet_code("TEST2")
        } else {
            wallet_code("TEST1")
        };
        let block = Miner::seeded(policy, 5).mine(wallet, &tip, 1_000_000).unwrap();
        guard.chain.append(block).unwrap();
    }
    let reply = fetch_from_peer(&addr, &PeerMessage::empty_request())
        .await
        .unwrap();
    assert_eq!(reply.blocks.len(), expected.len() + 1);
    assert!(is_valid_chain(&reply.blocks, &policy));

    server.abort();
}

#[tokio::test]
async fn test_garbage_reply_is_protocol_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_message(&mut stream).await;
        let mut bogus = Vec::new();
        bogus.extend_from_slice(&CMD_RESPONSE.to_be_bytes());
        bogus.extend_from_slice(&(BEEF_BEEF ^ 1).to_be_bytes());
        stream.write_all(&bogus).await.unwrap();
    });

    match fetch_from_peer(&addr, &PeerMessage::empty_request()).await {
        Err(ChainError::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_peer_is_io_error() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };
    assert!(matches!(
        fetch_from_peer(&addr, &PeerMessage::empty_request()).await,
        Err(ChainError::Io(_))
    ));
}
