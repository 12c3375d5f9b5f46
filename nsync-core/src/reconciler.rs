//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Applies LBN-reported node descriptors to the local `Neighbor` table and
//! `NeighborhoodAction` queue under transactional locking (§4.4).

use std::net::IpAddr;

use chrono::Utc;
use rand::Rng;

use crate::config::Config;
use crate::debug::Debug;
use crate::error::Error;
use crate::model::{
    Neighbor, NeighborhoodAction, NeighborhoodActionType, location_is_valid,
};
use crate::packet::{NeighborhoodChange, NodeInfo, Response};
use crate::repository::{
    NeighborRepository, NeighborhoodActionRepository, Repository,
};
use crate::signal::{ActionProcessorSignal, Lock};

/// Outcome of [`add_or_change_neighbor`].
#[derive(Debug, Default)]
pub struct UpsertOutcome {
    pub error: bool,
    pub save_db: bool,
    pub signal_processor: bool,
    pub new_size: usize,
}

/// `AddOrChangeNeighbor` (§4.4). Validates the descriptor, then either
/// inserts a new `Neighbor` (subject to capacity) or updates the existing
/// one in place. Errors are local to this item: the caller continues with
/// subsequent items regardless of the outcome here.
pub async fn add_or_change_neighbor<R: Repository>(
    repo: &R,
    config: &Config,
    server_id: &[u8],
    ip: IpAddr,
    port: u16,
    latitude: i32,
    longitude: i32,
    current_size: usize,
) -> UpsertOutcome {
    if server_id.len() != config.identifier_length {
        Error::InvalidIdentifierLength {
            server_id: server_id.to_vec(),
            len: server_id.len(),
        }
        .log();
        return UpsertOutcome {
            error: true,
            new_size: current_size,
            ..Default::default()
        };
    }
    if port == 0 {
        Error::InvalidPort {
            server_id: server_id.to_vec(),
        }
        .log();
        return UpsertOutcome {
            error: true,
            new_size: current_size,
            ..Default::default()
        };
    }
    if !location_is_valid(latitude, longitude) {
        Error::InvalidLocation {
            server_id: server_id.to_vec(),
            latitude,
            longitude,
        }
        .log();
        return UpsertOutcome {
            error: true,
            new_size: current_size,
            ..Default::default()
        };
    }

    match repo.find_by_id(server_id).await {
        None => {
            if current_size >= config.max_neighborhood_size {
                Error::CapacityReached {
                    server_id: server_id.to_vec(),
                    max: config.max_neighborhood_size,
                }
                .log();
                return UpsertOutcome {
                    new_size: current_size,
                    ..Default::default()
                };
            }

            let new_size = current_size + 1;
            let neighbor = Neighbor::new(
                server_id.to_vec(),
                ip,
                port,
                latitude,
                longitude,
            );
            NeighborRepository::insert(repo, neighbor).await;

            let jitter_secs = rand::rng().random_range(0..3 * new_size as u64);
            let now = Utc::now();
            let action = NeighborhoodAction {
                server_id: server_id.to_vec(),
                action_type: NeighborhoodActionType::AddNeighbor,
                timestamp: now,
                execute_after: now + chrono::Duration::seconds(jitter_secs as i64),
                target_identity_id: None,
                additional_data: None,
            };
            NeighborhoodActionRepository::insert(repo, action).await;

            UpsertOutcome {
                error: false,
                save_db: true,
                signal_processor: true,
                new_size,
            }
        }
        Some(mut neighbor) => {
            neighbor.ip_address = ip;
            if neighbor.primary_port != port {
                neighbor.primary_port = port;
                neighbor.sr_neighbor_port = None;
            }
            neighbor.location_latitude = latitude;
            neighbor.location_longitude = longitude;
            neighbor.last_refresh_time = Some(Utc::now());
            repo.update(neighbor).await;

            UpsertOutcome {
                error: false,
                save_db: true,
                signal_processor: false,
                new_size: current_size,
            }
        }
    }
}

/// `Apply Initial Set` (§4.4): the full neighbor list returned by
/// `GetNeighbourNodesByDistanceLocal`.
pub async fn apply_initial_set<R: Repository>(
    repo: &R,
    config: &Config,
    action_signal: &ActionProcessorSignal,
    nodes: Vec<NodeInfo>,
) -> Result<(), Error> {
    repo.begin_transaction_with_lock(&[Lock::Neighbor, Lock::NeighborhoodAction])
        .await;

    let mut current_size = repo.count().await;
    let mut save_db = false;
    let mut signal_processor = false;

    for node in nodes {
        let outcome = add_or_change_neighbor(
            repo,
            config,
            &node.profile.node_id,
            node.profile.contact.addr(),
            node.profile.contact.port(),
            node.location.latitude,
            node.location.longitude,
            current_size,
        )
        .await;
        current_size = outcome.new_size;
        save_db |= outcome.save_db;
        signal_processor |= outcome.signal_processor;
    }

    let result: Result<(), Error> = if save_db {
        repo.save().await
    } else {
        Ok(())
    };

    match result {
        Ok(()) => match repo.commit().await {
            Ok(()) => {
                if signal_processor {
                    action_signal.signal();
                }
                Ok(())
            }
            Err(error) => {
                repo.rollback().await;
                Err(error)
            }
        },
        Err(error) => {
            repo.rollback().await;
            Err(error)
        }
    }
}

/// `Apply Change Batch` (§4.4): an ordered list of `NeighbourhoodChange`
/// items, as carried by an inbound `NeighbourhoodChangedNotification`.
/// Returns the response body to send back to the LBN node.
pub async fn apply_change_batch<R: Repository>(
    repo: &R,
    config: &Config,
    action_signal: &ActionProcessorSignal,
    changes: Vec<NeighborhoodChange>,
) -> Response {
    repo.begin_transaction_with_lock(&[Lock::Neighbor, Lock::NeighborhoodAction])
        .await;

    let mut current_size = repo.count().await;
    let mut save_db = false;
    let mut signal_processor = false;

    for change in changes {
        match change {
            NeighborhoodChange::AddedNodeInfo(node)
            | NeighborhoodChange::UpdatedNodeInfo(node) => {
                let outcome = add_or_change_neighbor(
                    repo,
                    config,
                    &node.profile.node_id,
                    node.profile.contact.addr(),
                    node.profile.contact.port(),
                    node.location.latitude,
                    node.location.longitude,
                    current_size,
                )
                .await;
                current_size = outcome.new_size;
                save_db |= outcome.save_db;
                signal_processor |= outcome.signal_processor;
            }
            NeighborhoodChange::RemovedNodeId(server_id) => {
                if server_id.len() != config.identifier_length {
                    Error::InvalidIdentifierLength {
                        server_id: server_id.clone(),
                        len: server_id.len(),
                    }
                    .log();
                    continue;
                }
                match repo.find_by_id(&server_id).await {
                    Some(_) => {
                        let action = NeighborhoodAction {
                            server_id: server_id.clone(),
                            action_type: NeighborhoodActionType::RemoveNeighbor,
                            timestamp: Utc::now(),
                            execute_after: Utc::now(),
                            target_identity_id: None,
                            additional_data: None,
                        };
                        NeighborhoodActionRepository::insert(repo, action).await;
                        save_db = true;
                        signal_processor = true;
                    }
                    None => {
                        Debug::RemoveOfUnknownNeighbor(&server_id).log();
                    }
                }
            }
        }
    }

    let result: Result<(), Error> = if save_db {
        repo.save().await
    } else {
        Ok(())
    };

    match result {
        Ok(()) => match repo.commit().await {
            Ok(()) => {
                if signal_processor {
                    action_signal.signal();
                }
                Response::NeighbourhoodChangedNotificationResponse
            }
            Err(error) => {
                error.log();
                repo.rollback().await;
                Response::ErrorInternal
            }
        },
        Err(error) => {
            error.log();
            repo.rollback().await;
            Response::ErrorInternal
        }
    }
}
