//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod adjacency;
pub mod collections;
pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod instance;
pub mod interface;
pub mod packet;
pub mod southbound;
pub mod srv6;

use rove_utils::UnboundedSender;
use rove_utils::ibus::{IbusChannelsTx, IbusReceiver};
use tokio::sync::mpsc;
use tracing::{Instrument, debug_span};

use crate::config::Command;
use crate::instance::Instance;

// ===== global functions =====

pub fn start(
    name: &str,
    ibus_tx: IbusChannelsTx,
    ibus_rx: IbusReceiver,
) -> UnboundedSender<Command> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let name = name.to_owned();

    tokio::spawn(async move {
        let mut instance = Instance::new(&name, ibus_tx);

        // Run task main loop.
        let span = debug_span!("isis", %name);
        run(&mut instance, ibus_rx, command_rx).instrument(span).await;

        // Tear down all SIDs and release the locator chunks before exiting.
        srv6::teardown(&mut instance);
    });

    command_tx
}

// ===== helper functions =====

async fn run(
    instance: &mut Instance,
    mut ibus_rx: IbusReceiver,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
) {
    loop {
        tokio::select! {
            msg = ibus_rx.recv() => match msg {
                Some(msg) => {
                    southbound::rx::process_msg(instance, msg);
                }
                // Exit when the ibus channel closes.
                None => return,
            },
            Some(command) = command_rx.recv() => {
                if let Err(error) = config::process_command(instance, command)
                {
                    error.log();
                }
            }
        }
    }
}
