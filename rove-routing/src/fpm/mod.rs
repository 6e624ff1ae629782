//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod netlink;

use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use ipnetwork::IpNetwork;
use rove_utils::UnboundedSender;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Error;
use crate::interface::Vrfs;
use crate::rib::Route;

// Channel carrying encoded FPM messages to the connection task.
pub type FpmSender = UnboundedSender<Bytes>;

// FPM framing header.
pub const FPM_HEADER_SIZE: usize = 4;
pub const FPM_PROTO_VERSION: u8 = 1;
pub const FPM_MSG_TYPE_NETLINK: u8 = 1;
// Maximum size of an FPM message, framing header included.
pub const FPM_MAX_MSG_SIZE: usize = 4096;

// Reconnection interval.
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

// ===== global functions =====

// Encodes the route and hands it to the FPM connection task.
pub(crate) fn mirror_route(
    fpm_tx: &FpmSender,
    cmd: u16,
    prefix: &IpNetwork,
    route: &Route,
    vrfs: &Vrfs,
    encap_src_addr: Option<Ipv6Addr>,
) {
    let mut buf = [0u8; FPM_MAX_MSG_SIZE];
    match encode_message(&mut buf, cmd, prefix, route, vrfs, encap_src_addr) {
        Ok(len) => {
            let _ = fpm_tx.send(Bytes::copy_from_slice(&buf[..len]));
        }
        Err(error) => {
            Error::FpmEncode(error).log();
        }
    }
}

// Encodes a complete FPM message into the caller-provided buffer: the
// 4-byte framing header followed by the netlink payload. Returns the
// number of bytes written.
pub fn encode_message(
    buf: &mut [u8],
    cmd: u16,
    prefix: &IpNetwork,
    route: &Route,
    vrfs: &Vrfs,
    encap_src_addr: Option<Ipv6Addr>,
) -> Result<usize, netlink::EncodeError> {
    if buf.len() < FPM_HEADER_SIZE {
        return Err(netlink::EncodeError::BufferOverflow);
    }
    let (header, payload) = buf.split_at_mut(FPM_HEADER_SIZE);

    let route_info =
        netlink::RouteInfo::from_route(cmd, prefix, route, vrfs, encap_src_addr)?;
    let payload_len = route_info.encode(payload)?;

    let total_len = FPM_HEADER_SIZE + payload_len;
    header[0] = FPM_PROTO_VERSION;
    header[1] = FPM_MSG_TYPE_NETLINK;
    header[2..4].copy_from_slice(&(total_len as u16).to_be_bytes());

    Ok(total_len)
}

// Starts the FPM connection task.
//
// The task owns the TCP connection to the FPM and drains the message
// channel into it, reconnecting on failure.
pub fn start(address: SocketAddr) -> FpmSender {
    let (fpm_tx, mut fpm_rx) = mpsc::unbounded_channel::<Bytes>();

    tokio::spawn(async move {
        loop {
            let mut stream = match TcpStream::connect(address).await {
                Ok(stream) => {
                    debug!(%address, "FPM connection established");
                    stream
                }
                Err(error) => {
                    warn!(%address, %error, "failed to connect to the FPM");
                    tokio::time::sleep(RECONNECT_INTERVAL).await;
                    continue;
                }
            };

            while let Some(msg) = fpm_rx.recv().await {
                if let Err(error) = stream.write_all(&msg).await {
                    warn!(%error, "failed to send FPM message");
                    break;
                }
            }
        }
    });

    fpm_tx
}
