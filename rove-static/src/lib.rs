//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod config;
pub mod debug;
pub mod error;
pub mod ibus;
pub mod sid;
pub mod southbound;

use std::collections::BTreeMap;

use derive_new::new;
use rove_utils::UnboundedSender;
use rove_utils::ibus::{IbusChannelsTx, IbusReceiver};
use rove_utils::southbound::InterfaceFlags;
use tokio::sync::mpsc;
use tracing::{Instrument, debug_span, error};

use crate::config::Command;
use crate::sid::SidTable;

pub struct Master {
    // Internal bus Tx channels.
    pub ibus_tx: IbusChannelsTx,
    // Static SRv6 SIDs.
    pub sids: SidTable,
    // Interfaces advertised by the broker.
    pub interfaces: BTreeMap<String, Interface>,
    // VRFs advertised by the broker.
    pub vrfs: BTreeMap<String, Vrf>,
}

#[derive(Clone, Debug, new)]
pub struct Interface {
    pub ifname: String,
    pub ifindex: u32,
    pub flags: InterfaceFlags,
}

#[derive(Clone, Debug, new)]
pub struct Vrf {
    pub name: String,
    pub vrf_id: u32,
    pub table_id: u32,
    pub active: bool,
}

// ===== impl Master =====

impl Master {
    pub fn new(ibus_tx: IbusChannelsTx) -> Master {
        Master {
            ibus_tx,
            sids: Default::default(),
            interfaces: Default::default(),
            vrfs: Default::default(),
        }
    }

    fn debug_span() -> tracing::Span {
        debug_span!("static")
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
            }
        }
    }
}

// ===== global functions =====

pub fn start(
    ibus_tx: IbusChannelsTx,
    ibus_rx: IbusReceiver,
) -> UnboundedSender<Command> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut master = Master::new(ibus_tx);

        // Run task main loop.
        let span = Master::debug_span();
        master.run(ibus_rx, command_rx).instrument(span).await;

        // Uninstall all SIDs before exiting.
        if let Err(error) = southbound::sid_uninstall_all(&mut master) {
            error!(%error, "failed to uninstall SIDs");
        }
    });

    command_tx
}
