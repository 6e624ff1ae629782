//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod config;
pub mod debug;
pub mod error;
pub mod fpm;
pub mod ibus;
pub mod interface;
pub mod netlink;
pub mod rib;
pub mod srv6;

use rove_utils::UnboundedSender;
use rove_utils::ibus::{IbusChannelsTx, IbusReceiver};
use tokio::sync::mpsc;
use tracing::{Instrument, debug_span, warn};

use crate::config::Command;
use crate::fpm::FpmSender;
use crate::interface::{Interfaces, Vrfs};
use crate::rib::Rib;
use crate::srv6::Srv6;

pub struct Master {
    // Internal bus Tx channels.
    pub ibus_tx: IbusChannelsTx,
    // Netlink socket.
    pub netlink_handle: Option<rtnetlink::Handle>,
    // FPM mirror channel.
    pub fpm_tx: Option<FpmSender>,
    // List of interfaces.
    pub interfaces: Interfaces,
    // List of VRFs.
    pub vrfs: Vrfs,
    // RIB.
    pub rib: Rib,
    // SRv6 state (locators and encapsulation source address).
    pub srv6: Srv6,
}

// ===== impl Master =====

impl Master {
    pub fn new(ibus_tx: IbusChannelsTx) -> Master {
        Master {
            ibus_tx,
            netlink_handle: None,
            fpm_tx: None,
            interfaces: Default::default(),
            vrfs: Default::default(),
            rib: Default::default(),
            srv6: Default::default(),
        }
    }

    async fn run(
        &mut self,
        mut ibus_rx: IbusReceiver,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
    ) {
        loop {
            tokio::select! {
                msg = ibus_rx.recv() => match msg {
                    Some(msg) => {
                        ibus::process_msg(self, msg);
                    }
                    // Exit when the ibus channel closes.
                    None => return,
                },
                Some(command) = command_rx.recv() => {
                    if let Err(error) = config::process_command(self, command)
                    {
                        error.log();
                    }
                }
                Some(_) = self.rib.update_queue_rx.recv() => {
                    self.rib
                        .process_update_queue(
                            self.netlink_handle.as_ref(),
                            &self.vrfs,
                            &self.srv6,
                            self.fpm_tx.as_ref(),
                            &self.ibus_tx,
                        )
                        .await;
                }
            }
        }
    }
}

// ===== global functions =====

pub fn start(
    ibus_tx: IbusChannelsTx,
    ibus_rx: IbusReceiver,
    fpm_address: Option<std::net::SocketAddr>,
) -> UnboundedSender<Command> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut master = Master::new(ibus_tx);

        // Initialize netlink socket.
        match netlink::init() {
            Ok(handle) => master.netlink_handle = Some(handle),
            Err(error) => {
                warn!(%error, "failed to open netlink socket");
            }
        }

        // Start the FPM mirror task.
        if let Some(address) = fpm_address {
            master.fpm_tx = Some(fpm::start(address));
        }

        // Let the protocol clients know the broker is up.
        master.ibus_tx.notify_connected();

        // Run task main loop.
        let span = debug_span!("routing");
        master.run(ibus_rx, command_rx).instrument(span).await;

        // Uninstall all routes before exiting.
        master
            .rib
            .uninstall_all(master.netlink_handle.as_ref())
            .await;
    });

    command_tx
}
