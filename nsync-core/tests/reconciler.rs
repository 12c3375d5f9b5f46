//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use nsync_core::config::{Config, IdentityKeys};
use nsync_core::model::NeighborhoodActionType;
use nsync_core::packet::{
    Contact, Location, NeighborhoodChange, NodeInfo, NodeProfile, Response,
};
use nsync_core::reconciler::{apply_change_batch, apply_initial_set};
use nsync_core::repository::NeighborRepository;
use nsync_core::repository::testing::MemoryRepository;
use nsync_core::signal::ActionProcessorSignal;

fn test_config(max_neighborhood_size: usize) -> Config {
    Config {
        lbn_endpoint: (IpAddr::V4(Ipv4Addr::LOCALHOST), 7000),
        server_interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
        primary_role_port: 8000,
        identity_keys: IdentityKeys {
            public_key: vec![0; 32],
        },
        max_neighborhood_size,
        identifier_length: Config::IDENTIFIER_LENGTH,
    }
}

fn node(byte: u8, port: u16, latitude: i32, longitude: i32) -> NodeInfo {
    NodeInfo {
        profile: NodeProfile {
            node_id: vec![byte; 32],
            contact: Contact::Ipv4 {
                host: Ipv4Addr::new(10, 0, 0, byte),
                port,
            },
        },
        location: Location {
            latitude,
            longitude,
        },
    }
}

/// True if the signal fires within a short window, without blocking the
/// test indefinitely when it doesn't.
async fn was_signaled(signal: &ActionProcessorSignal) -> bool {
    tokio::time::timeout(Duration::from_millis(20), signal.notified())
        .await
        .is_ok()
}

#[tokio::test]
async fn s1_empty_initial_set_is_a_no_op() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![]).await.unwrap();

    assert!(repo.neighbors().is_empty());
    assert!(repo.actions().is_empty());
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn s2_initial_set_adds_new_neighbors_below_capacity() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(
        &repo,
        &config,
        &signal,
        vec![node(1, 100, 1_000_000, 2_000_000)],
    )
    .await
    .unwrap();

    assert_eq!(repo.neighbors().len(), 1);
    assert_eq!(repo.neighbors()[0].neighbor_id, vec![1; 32]);
    assert_eq!(repo.actions().len(), 1);
    assert_eq!(
        repo.actions()[0].action_type,
        NeighborhoodActionType::AddNeighbor
    );
    assert!(was_signaled(&signal).await);
}

#[tokio::test]
async fn s4_update_changes_primary_port_and_clears_sr_port() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![node(1, 100, 0, 0)])
        .await
        .unwrap();
    assert!(was_signaled(&signal).await);

    // Simulate the peer-to-peer handshake having populated `sr_neighbor_port`
    // before the LBN reports a primary-port change (§3 invariant).
    let mut neighbor = repo.neighbors().remove(0);
    neighbor.sr_neighbor_port = Some(2000);
    repo.update(neighbor).await;

    let response = apply_change_batch(
        &repo,
        &config,
        &signal,
        vec![NeighborhoodChange::UpdatedNodeInfo(node(1, 200, 0, 0))],
    )
    .await;

    assert!(matches!(
        response,
        Response::NeighbourhoodChangedNotificationResponse
    ));
    assert_eq!(repo.neighbors().len(), 1);
    assert_eq!(repo.neighbors()[0].primary_port, 200);
    assert_eq!(
        repo.neighbors()[0].sr_neighbor_port,
        None,
        "sr_neighbor_port must be cleared whenever primary_port changes"
    );
    assert!(repo.neighbors()[0].last_refresh_time.is_some());
    assert_eq!(repo.actions().len(), 1, "no new action for a plain update");
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn invariant_port_zero_is_rejected_one_and_max_are_accepted() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(
        &repo,
        &config,
        &signal,
        vec![
            node(1, 0, 0, 0),
            node(2, 1, 0, 0),
            node(3, u16::MAX, 0, 0),
        ],
    )
    .await
    .unwrap();

    assert_eq!(repo.neighbors().len(), 2, "port 0 must be rejected");
    let ids: Vec<_> = repo.neighbors().into_iter().map(|n| n.neighbor_id).collect();
    assert!(ids.contains(&vec![2; 32]));
    assert!(ids.contains(&vec![3; 32]));
}

#[tokio::test]
async fn invariant_invalid_identifier_length_is_rejected() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    let mut bad_node = node(1, 100, 0, 0);
    bad_node.profile.node_id = vec![1; 16];

    apply_initial_set(&repo, &config, &signal, vec![bad_node])
        .await
        .unwrap();

    assert!(repo.neighbors().is_empty());
    assert!(repo.actions().is_empty());
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn invariant_invalid_location_is_rejected() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(
        &repo,
        &config,
        &signal,
        vec![node(1, 100, nsync_core::model::LOCATION_UNSET, 0)],
    )
    .await
    .unwrap();

    assert!(repo.neighbors().is_empty());
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn s3_capacity_reached_blocks_new_neighbors() {
    let repo = MemoryRepository::new();
    let config = test_config(1);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![node(1, 100, 0, 0)])
        .await
        .unwrap();
    assert_eq!(repo.neighbors().len(), 1);

    apply_initial_set(&repo, &config, &signal, vec![node(2, 200, 0, 0)])
        .await
        .unwrap();

    assert_eq!(repo.neighbors().len(), 1, "at capacity, no room for a second neighbor");
    assert_eq!(repo.neighbors()[0].neighbor_id, vec![1; 32]);
}

#[tokio::test]
async fn s3_capacity_reached_mid_batch_skips_only_the_overflow_item() {
    let repo = MemoryRepository::new();
    let config = test_config(2);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(
        &repo,
        &config,
        &signal,
        vec![
            node(1, 100, 0, 0),
            node(2, 200, 0, 0),
            node(3, 300, 0, 0),
        ],
    )
    .await
    .unwrap();

    assert_eq!(repo.neighbors().len(), 2, "only the first two fit under capacity");
    assert_eq!(repo.neighbors()[0].neighbor_id, vec![1; 32]);
    assert_eq!(repo.neighbors()[1].neighbor_id, vec![2; 32]);
    assert_eq!(repo.actions().len(), 2);
    assert!(was_signaled(&signal).await);
}

#[tokio::test]
async fn s5_remove_known_neighbor_enqueues_action() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![node(1, 100, 0, 0)])
        .await
        .unwrap();
    assert!(was_signaled(&signal).await);

    let response = apply_change_batch(
        &repo,
        &config,
        &signal,
        vec![NeighborhoodChange::RemovedNodeId(vec![1; 32])],
    )
    .await;

    assert!(matches!(
        response,
        Response::NeighbourhoodChangedNotificationResponse
    ));
    // Removal enqueues an action for the external processor; the
    // neighbor row itself is deleted by that processor, not here.
    assert_eq!(repo.neighbors().len(), 1);
    assert_eq!(repo.actions().len(), 2);
    assert_eq!(
        repo.actions()[1].action_type,
        NeighborhoodActionType::RemoveNeighbor
    );
    assert!(was_signaled(&signal).await);
}

#[tokio::test]
async fn s5_remove_of_unknown_or_malformed_id_is_a_no_op() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    let response = apply_change_batch(
        &repo,
        &config,
        &signal,
        vec![
            NeighborhoodChange::RemovedNodeId(vec![9; 32]),
            NeighborhoodChange::RemovedNodeId(vec![9; 16]),
        ],
    )
    .await;

    assert!(matches!(
        response,
        Response::NeighbourhoodChangedNotificationResponse
    ));
    assert!(repo.actions().is_empty());
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn mixed_batch_applies_every_item_independently() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![node(1, 100, 0, 0)])
        .await
        .unwrap();
    assert!(was_signaled(&signal).await);

    let response = apply_change_batch(
        &repo,
        &config,
        &signal,
        vec![
            NeighborhoodChange::AddedNodeInfo(node(2, 200, 0, 0)),
            NeighborhoodChange::RemovedNodeId(vec![1; 32]),
            NeighborhoodChange::RemovedNodeId(vec![99; 32]),
        ],
    )
    .await;

    assert!(matches!(
        response,
        Response::NeighbourhoodChangedNotificationResponse
    ));
    assert_eq!(repo.neighbors().len(), 2);
    assert_eq!(repo.actions().len(), 2);
    assert!(was_signaled(&signal).await);
}

#[tokio::test]
async fn invariant4_failed_save_rolls_back_and_reports_error_internal() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(&repo, &config, &signal, vec![node(1, 100, 0, 0)])
        .await
        .unwrap();
    assert!(was_signaled(&signal).await);
    let neighbors_before = repo.neighbors();
    let actions_before = repo.actions();

    repo.fail_next_save();
    let response = apply_change_batch(
        &repo,
        &config,
        &signal,
        vec![NeighborhoodChange::AddedNodeInfo(node(2, 200, 0, 0))],
    )
    .await;

    assert!(matches!(response, Response::ErrorInternal));
    assert_eq!(
        repo.neighbors(),
        neighbors_before,
        "a failed save must leave the neighbor table unchanged"
    );
    assert_eq!(
        repo.actions(),
        actions_before,
        "a failed save must leave the action queue unchanged"
    );
    assert!(!was_signaled(&signal).await);
}

#[tokio::test]
async fn invariant3_add_action_execute_after_is_bounded_by_new_size() {
    let repo = MemoryRepository::new();
    let config = test_config(10);
    let signal = ActionProcessorSignal::new();

    apply_initial_set(
        &repo,
        &config,
        &signal,
        vec![node(1, 100, 0, 0), node(2, 200, 0, 0), node(3, 300, 0, 0)],
    )
    .await
    .unwrap();

    let actions = repo.actions();
    assert_eq!(actions.len(), 3);
    for (index, action) in actions.iter().enumerate() {
        let new_size = index + 1;
        assert!(action.execute_after >= action.timestamp);
        let bound = action.timestamp + chrono::Duration::seconds(3 * new_size as i64);
        assert!(
            action.execute_after < bound,
            "execute_after {} must be < timestamp + 3*{new_size}s ({bound})",
            action.execute_after,
        );
    }
}
