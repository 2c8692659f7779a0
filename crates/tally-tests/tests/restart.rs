//! The bot over a RocksDB ledger: state survives a restart.

use std::sync::Arc;

use tally_core::event::InboundEvent;
use tally_core::types::UserId;
use tally_node_lib::console::ListOracle;
use tally_node_lib::{Node, NodeConfig};
use tally_tests::helpers::{sender, RecordingTransport, ADMIN};

fn config(dir: &tempfile::TempDir) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().to_path_buf(),
        admin_id: ADMIN.0,
        members: vec![10, 20],
        ..NodeConfig::default()
    }
}

fn start(user: i64, text: &str) -> InboundEvent {
    InboundEvent::Start {
        from: sender(user),
        text: text.to_string(),
    }
}

fn open(cfg: &NodeConfig) -> Node {
    let oracle = Arc::new(ListOracle::new(cfg.members.iter().copied()));
    Node::open(cfg, oracle, Arc::new(RecordingTransport::new())).unwrap()
}

#[tokio::test]
async fn referral_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    {
        let mut node = open(&cfg);
        node.process(start(10, "/start")).await;
        node.process(start(20, "/start 10")).await;
        assert_eq!(node.service().registry().get(UserId(10)).unwrap().balance, 100);
    }

    let mut node = open(&cfg);
    let registry = node.service().registry();
    let inviter = registry.get(UserId(10)).unwrap();
    assert_eq!(inviter.balance, 100);
    assert!(inviter.invites.contains(&UserId(20)));
    assert_eq!(inviter.history.len(), 1);
    assert_eq!(registry.get(UserId(20)).unwrap().balance, 100);

    // the restored invite still blocks a repeat credit
    node.process(start(20, "/start 10")).await;
    assert_eq!(node.service().registry().get(UserId(10)).unwrap().balance, 100);
}

#[tokio::test]
async fn run_drains_the_event_channel() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir);
    let mut node = open(&cfg);

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    tx.send(start(10, "/start")).await.unwrap();
    tx.send(start(20, "/start 10")).await.unwrap();
    drop(tx);
    node.run(rx).await;

    assert_eq!(node.service().registry().get(UserId(20)).unwrap().balance, 100);
}
