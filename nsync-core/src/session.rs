//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The reconnecting client state machine that owns the TCP session to the
//! LBN node (§4.3): connect, register, fetch the initial neighborhood, then
//! dispatch inbound notifications until the connection drops. This is the
//! core's single long-lived task (§5).

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::config::Config;
use crate::debug::Debug;
use crate::error::Error;
use crate::packet::{
    Contact, Message, MessageBody, MessageBuilder, NodeProfile, Request,
    Response, Status,
};
use crate::reconciler;
use crate::repository::Repository;
use crate::signal::{ActionProcessorSignal, Initialized, ShutdownReceiver};
use crate::transport::{FramedTransport, ReadOutcome};

pub mod fsm {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum State {
        Disconnected,
        Connected,
        Registered,
        InSync,
    }

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum Event {
        Connected,
        Registered,
        InitialSyncDone,
        Dropped,
    }
}

const RECONNECT_DELAY: Duration = Duration::from_secs(10);
const DEREGISTER_ACK_WAIT: Duration = Duration::from_secs(2);

/// Why a phase of the session ended.
enum SessionAbort {
    /// Shutdown was signaled; the caller must unwind without logging an
    /// error (§7 "Shutdown").
    Shutdown,
    Error(Error),
}

/// Outcome of a single read from the transport, racing the shutdown
/// signal (§5 suspension points 2 and 5).
enum ReadSignal {
    Frame(Bytes),
    Eof,
    Shutdown,
    Err(Error),
}

/// Drives one LBN session for the lifetime of the process.
pub struct Session<R: Repository> {
    config: Config,
    repo: R,
    action_signal: ActionProcessorSignal,
    initialized: Initialized,
    shutdown: ShutdownReceiver,
    state: fsm::State,
}

impl<R: Repository> Session<R> {
    pub fn new(
        config: Config,
        repo: R,
        action_signal: ActionProcessorSignal,
        initialized: Initialized,
        shutdown: ShutdownReceiver,
    ) -> Session<R> {
        Session {
            config,
            repo,
            action_signal,
            initialized,
            shutdown,
            state: fsm::State::Disconnected,
        }
    }

    /// Runs the session until shutdown is signaled.
    pub async fn run(mut self) {
        loop {
            if self.shutdown.is_shutdown() {
                return;
            }

            let mut transport = match self.connect().await {
                Ok(transport) => transport,
                Err(SessionAbort::Shutdown) => return,
                Err(SessionAbort::Error(error)) => {
                    error.log();
                    self.wait_before_reconnect().await;
                    continue;
                }
            };
            self.transition(fsm::Event::Connected, fsm::State::Connected);

            let mut builder = MessageBuilder::new();

            if let Err(abort) = self.register(&mut transport, &mut builder).await {
                match abort {
                    SessionAbort::Shutdown => return,
                    SessionAbort::Error(error) => {
                        error.log();
                        self.transition(
                            fsm::Event::Dropped,
                            fsm::State::Disconnected,
                        );
                        self.wait_before_reconnect().await;
                        continue;
                    }
                }
            }
            self.transition(fsm::Event::Registered, fsm::State::Registered);

            if let Err(abort) =
                self.sync_initial(&mut transport, &mut builder).await
            {
                match abort {
                    SessionAbort::Shutdown => return,
                    SessionAbort::Error(error) => {
                        error.log();
                        self.deregister_best_effort(&mut transport, &mut builder)
                            .await;
                        self.transition(
                            fsm::Event::Dropped,
                            fsm::State::Disconnected,
                        );
                        self.wait_before_reconnect().await;
                        continue;
                    }
                }
            }
            self.transition(fsm::Event::InitialSyncDone, fsm::State::InSync);
            self.initialized.set();
            Debug::SessionInitialized.log();

            let abort = self.dispatch_loop(&mut transport).await;
            self.deregister_best_effort(&mut transport, &mut builder).await;
            self.transition(fsm::Event::Dropped, fsm::State::Disconnected);

            match abort {
                SessionAbort::Shutdown => return,
                SessionAbort::Error(error) => error.log(),
            }

            if self.shutdown.is_shutdown() {
                return;
            }
            self.wait_before_reconnect().await;
        }
    }

    fn lbn_addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.lbn_endpoint.0, self.config.lbn_endpoint.1)
    }

    fn transition(&mut self, event: fsm::Event, new_state: fsm::State) {
        Debug::SessionFsmTransition(&self.state, &event, &new_state).log();
        self.state = new_state;
    }

    fn node_profile(&self) -> NodeProfile {
        let node_id = self.config.identity_keys.network_id().to_vec();
        let port = self.config.primary_role_port;
        let contact = match self.config.server_interface {
            IpAddr::V4(host) => Contact::Ipv4 { host, port },
            IpAddr::V6(host) => Contact::Ipv6 { host, port },
        };
        NodeProfile { node_id, contact }
    }

    async fn connect(&mut self) -> Result<FramedTransport, SessionAbort> {
        Debug::SessionConnecting.log();
        tokio::select! {
            biased;
            _ = self.shutdown.recv() => Err(SessionAbort::Shutdown),
            result = FramedTransport::connect(self.lbn_addr()) => {
                result.map_err(SessionAbort::Error)
            }
        }
    }

    async fn wait_before_reconnect(&mut self) {
        Debug::SessionReconnectScheduled.log();
        tokio::select! {
            biased;
            _ = self.shutdown.recv() => {}
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }

    async fn read_signal(&mut self, transport: &mut FramedTransport) -> ReadSignal {
        tokio::select! {
            biased;
            _ = self.shutdown.recv() => ReadSignal::Shutdown,
            result = transport.read_frame() => match result {
                Ok(ReadOutcome::Frame(bytes)) => ReadSignal::Frame(bytes),
                Ok(ReadOutcome::Eof) => ReadSignal::Eof,
                Err(error) => ReadSignal::Err(error),
            },
        }
    }

    async fn send_raw(
        &self,
        transport: &FramedTransport,
        message: &Message,
    ) -> Result<(), Error> {
        Debug::SessionMsgTx(message_kind_name(&message.body)).log();
        let mut buf = BytesMut::new();
        message.encode(&mut buf);
        transport.write_frame(&buf).await
    }

    async fn send_protocol_violation(
        &self,
        transport: &FramedTransport,
        correlated_id: Option<u32>,
    ) {
        let message = match correlated_id {
            Some(id) => MessageBuilder::response_to(id, Response::ErrorProtocolViolation),
            None => {
                MessageBuilder::error_without_correlation(Response::ErrorProtocolViolation)
            }
        };
        if let Err(error) = self.send_raw(transport, &message).await {
            error.log();
        }
    }

    /// Waits for the response correlated to `request_id`, rejecting any
    /// other traffic as a protocol violation (§4.2 "Correlation rule").
    async fn await_response(
        &mut self,
        transport: &mut FramedTransport,
        request_id: u32,
    ) -> Result<Response, SessionAbort> {
        loop {
            match self.read_signal(transport).await {
                ReadSignal::Shutdown => return Err(SessionAbort::Shutdown),
                ReadSignal::Eof => {
                    return Err(SessionAbort::Error(Error::UnexpectedEof));
                }
                ReadSignal::Err(error) => {
                    return Err(SessionAbort::Error(error));
                }
                ReadSignal::Frame(mut body) => {
                    let message = match Message::decode(&mut body) {
                        Ok(message) => message,
                        Err(error) => {
                            return Err(SessionAbort::Error(Error::from(error)));
                        }
                    };
                    Debug::SessionMsgRx(message_kind_name(&message.body)).log();

                    if message.correlates_to(request_id) {
                        let MessageBody::Response(response) = message.body else {
                            unreachable!("correlates_to only matches Response bodies");
                        };
                        return Ok(response);
                    }

                    return Err(SessionAbort::Error(match message.body {
                        MessageBody::Response(_) => {
                            Error::UnmatchedCorrelation(message.id)
                        }
                        MessageBody::Request(_) => Error::UnexpectedRequestKind,
                    }));
                }
            }
        }
    }

    async fn register(
        &mut self,
        transport: &mut FramedTransport,
        builder: &mut MessageBuilder,
    ) -> Result<(), SessionAbort> {
        Debug::SessionRegistering.log();
        let request = builder.request(Request::RegisterService(self.node_profile()));
        let request_id = request.id;
        self.send_raw(transport, &request)
            .await
            .map_err(SessionAbort::Error)?;

        match self.await_response(transport, request_id).await? {
            Response::RegisterServiceResponse(Status::Ok) => Ok(()),
            Response::RegisterServiceResponse(_) => {
                Err(SessionAbort::Error(Error::RequestRejected))
            }
            _ => Err(SessionAbort::Error(Error::UnmatchedCorrelation(request_id))),
        }
    }

    async fn sync_initial(
        &mut self,
        transport: &mut FramedTransport,
        builder: &mut MessageBuilder,
    ) -> Result<(), SessionAbort> {
        Debug::SessionInitialSyncRequested.log();
        let request = builder.request(Request::GetNeighbourNodesByDistanceLocal);
        let request_id = request.id;
        self.send_raw(transport, &request)
            .await
            .map_err(SessionAbort::Error)?;

        match self.await_response(transport, request_id).await? {
            Response::GetNeighbourNodesByDistanceLocalResponse(Status::Ok, nodes) => {
                reconciler::apply_initial_set(
                    &self.repo,
                    &self.config,
                    &self.action_signal,
                    nodes,
                )
                .await
                .map_err(|error| {
                    error.log();
                    SessionAbort::Error(Error::Persistence(
                        "apply_initial_set failed".to_string(),
                    ))
                })
            }
            Response::GetNeighbourNodesByDistanceLocalResponse(_, _) => {
                Err(SessionAbort::Error(Error::RequestRejected))
            }
            _ => Err(SessionAbort::Error(Error::UnmatchedCorrelation(request_id))),
        }
    }

    /// Reads and dispatches frames until the connection drops, a protocol
    /// violation occurs, or shutdown is signaled (§4.3 "Receive/dispatch
    /// loop").
    async fn dispatch_loop(&mut self, transport: &mut FramedTransport) -> SessionAbort {
        loop {
            match self.read_signal(transport).await {
                ReadSignal::Shutdown => return SessionAbort::Shutdown,
                ReadSignal::Eof => return SessionAbort::Error(Error::UnexpectedEof),
                ReadSignal::Err(error) => return SessionAbort::Error(error),
                ReadSignal::Frame(mut body) => {
                    let message = match Message::decode(&mut body) {
                        Ok(message) => message,
                        Err(error) => {
                            self.send_protocol_violation(transport, None).await;
                            return SessionAbort::Error(Error::from(error));
                        }
                    };
                    Debug::SessionMsgRx(message_kind_name(&message.body)).log();

                    match message.body {
                        MessageBody::Request(Request::NeighbourhoodChangedNotification(
                            changes,
                        )) => {
                            let response = reconciler::apply_change_batch(
                                &self.repo,
                                &self.config,
                                &self.action_signal,
                                changes,
                            )
                            .await;
                            let reply =
                                MessageBuilder::response_to(message.id, response);
                            if let Err(error) =
                                self.send_raw(transport, &reply).await
                            {
                                return SessionAbort::Error(error);
                            }
                        }
                        MessageBody::Request(_) => {
                            self.send_protocol_violation(transport, Some(message.id))
                                .await;
                            return SessionAbort::Error(Error::UnexpectedRequestKind);
                        }
                        MessageBody::Response(_) => {
                            self.send_protocol_violation(transport, Some(message.id))
                                .await;
                            return SessionAbort::Error(Error::UnsolicitedResponse(
                                message.id,
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Sends `DeregisterService` and best-effort awaits its acknowledgement,
    /// bounded by [`DEREGISTER_ACK_WAIT`] (§4.3 "Graceful deregister",
    /// SPEC_FULL.md §C.2). Never treated as fatal.
    async fn deregister_best_effort(
        &mut self,
        transport: &mut FramedTransport,
        builder: &mut MessageBuilder,
    ) {
        Debug::SessionDeregistering.log();
        let request = builder.request(Request::DeregisterService);
        let request_id = request.id;
        if let Err(error) = self.send_raw(transport, &request).await {
            error.log();
            return;
        }

        match tokio::time::timeout(
            DEREGISTER_ACK_WAIT,
            self.await_response(transport, request_id),
        )
        .await
        {
            Ok(Ok(_response)) => {}
            Ok(Err(SessionAbort::Shutdown)) => {}
            Ok(Err(SessionAbort::Error(error))) => error.log(),
            Err(_elapsed) => {}
        }
    }
}

fn message_kind_name(body: &MessageBody) -> &'static str {
    match body {
        MessageBody::Request(Request::RegisterService(_)) => "RegisterService",
        MessageBody::Request(Request::DeregisterService) => "DeregisterService",
        MessageBody::Request(Request::GetNeighbourNodesByDistanceLocal) => {
            "GetNeighbourNodesByDistanceLocal"
        }
        MessageBody::Request(Request::NeighbourhoodChangedNotification(_)) => {
            "NeighbourhoodChangedNotification"
        }
        MessageBody::Response(Response::RegisterServiceResponse(_)) => {
            "RegisterServiceResponse"
        }
        MessageBody::Response(Response::DeregisterServiceResponse(_)) => {
            "DeregisterServiceResponse"
        }
        MessageBody::Response(Response::GetNeighbourNodesByDistanceLocalResponse(
            ..,
        )) => "GetNeighbourNodesByDistanceLocalResponse",
        MessageBody::Response(Response::NeighbourhoodChangedNotificationResponse) => {
            "NeighbourhoodChangedNotificationResponse"
        }
        MessageBody::Response(Response::ErrorProtocolViolation) => {
            "ErrorProtocolViolation"
        }
        MessageBody::Response(Response::ErrorInternal) => "ErrorInternal",
    }
}
