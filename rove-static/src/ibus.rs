//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use rove_utils::ibus::IbusMsg;
use rove_utils::protocol::Protocol;
use rove_utils::southbound::{RouteNotifyMsg, RouteNotifyOutcome};
use tracing::warn;

use crate::sid::{SidFlags, SidInstallState};
use crate::southbound;
use crate::{Interface, Master, Vrf};

// ===== global functions =====

pub fn process_msg(master: &mut Master, msg: IbusMsg) {
    match msg {
        // The broker is up; clear the sent-to-broker state and re-issue
        // whatever the current configuration requires.
        IbusMsg::Connected => {
            for addr in master.sids.addrs() {
                if let Some(sid) = master.sids.get_mut(&addr) {
                    sid.flags.remove(SidFlags::SENT_TO_BROKER);
                }
            }
            southbound::sid_update_all(master);
        }
        // Interface update notification.
        IbusMsg::InterfaceUpd(msg) => {
            master.interfaces.insert(
                msg.ifname.clone(),
                Interface::new(msg.ifname, msg.ifindex, msg.flags),
            );

            // SIDs pending an outgoing interface are retried here.
            southbound::sid_update_all(master);
        }
        // Interface delete notification.
        IbusMsg::InterfaceDel(ifname) => {
            master.interfaces.remove(&ifname);
            southbound::sid_update_all(master);
        }
        // VRF update notification.
        IbusMsg::VrfUpd(msg) => {
            master.vrfs.insert(
                msg.name.clone(),
                Vrf::new(msg.name, msg.vrf_id, msg.table_id, msg.active),
            );
            southbound::sid_update_all(master);
        }
        // VRF delete notification.
        IbusMsg::VrfDel(name) => {
            master.vrfs.remove(&name);
            southbound::sid_update_all(master);
        }
        // Nexthop tracking update.
        IbusMsg::NexthopUpd { .. } => {
            southbound::sid_update_all(master);
        }
        // Route installation outcome notification.
        IbusMsg::RouteNotify(msg) => {
            process_route_notify(master, msg);
        }
        // Ignore other events.
        _ => {}
    }
}

// ===== helper functions =====

fn process_route_notify(master: &mut Master, msg: RouteNotifyMsg) {
    if msg.protocol != Protocol::STATIC {
        return;
    }

    // Local-SID routes are host prefixes; ignore everything else.
    let addr = match msg.prefix.ip() {
        std::net::IpAddr::V6(addr) => addr,
        std::net::IpAddr::V4(_) => return,
    };
    let Some(sid) = master.sids.get_mut(&addr) else {
        return;
    };

    match msg.outcome {
        RouteNotifyOutcome::Installed => {
            sid.install_state = SidInstallState::Installed;
        }
        RouteNotifyOutcome::FailInstall => {
            sid.install_state = SidInstallState::NotInstalled;
            warn!(prefix = %msg.prefix, table_id = %msg.table_id,
                "route failed to install");
        }
        RouteNotifyOutcome::BetterAdminWon => {
            sid.install_state = SidInstallState::NotInstalled;
            warn!(prefix = %msg.prefix, table_id = %msg.table_id,
                "route over-ridden by better route");
        }
        RouteNotifyOutcome::Removed => {
            sid.install_state = SidInstallState::NotInstalled;
        }
        RouteNotifyOutcome::RemoveFail => {
            sid.install_state = SidInstallState::Installed;
            warn!(prefix = %msg.prefix, table_id = %msg.table_id,
                "route failed to be removed");
        }
    }
}
