//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;
use num_traits::ToPrimitive;
use rove_utils::southbound::{Nexthop, NexthopSpecial};
use rove_utils::srv6::{Behavior, SidStructure};

use crate::interface::Vrfs;
use crate::netlink::netlink_protocol;
use crate::rib::{Route, RouteSrv6};

// Netlink message types.
pub const RTM_NEWROUTE: u16 = 24;
pub const RTM_DELROUTE: u16 = 25;

// Netlink message flags.
const NLM_F_REQUEST: u16 = 0x01;
const NLM_F_CREATE: u16 = 0x400;

// Attribute header size.
const RTA_HDR_SIZE: usize = 4;

// Address families.
const AF_INET: u8 = 2;
const AF_INET6: u8 = 10;

// Route types.
const RTN_UNICAST: u8 = 1;
const RTN_BLACKHOLE: u8 = 6;
const RTN_UNREACHABLE: u8 = 7;
const RTN_PROHIBIT: u8 = 8;

const RT_SCOPE_UNIVERSE: u8 = 0;
const RT_TABLE_UNSPEC: u8 = 0;

// Route attribute types.
const RTA_DST: u16 = 1;
const RTA_OIF: u16 = 4;
const RTA_GATEWAY: u16 = 5;
const RTA_PRIORITY: u16 = 6;
const RTA_PREFSRC: u16 = 7;
const RTA_MULTIPATH: u16 = 9;
const RTA_TABLE: u16 = 15;
const RTA_ENCAP_TYPE: u16 = 21;
const RTA_ENCAP: u16 = 22;

// Values 0 to 8 of RTA_ENCAP_TYPE are used by lwtunnel_encap_types, so the
// FPM-specific encapsulations start at 100.
pub const FPM_NH_ENCAP_VXLAN: u16 = 100;
pub const FPM_NH_ENCAP_SRV6_ROUTE: u16 = 101;
pub const FPM_NH_ENCAP_SRV6_LOCAL_SID: u16 = 102;

// VxLAN nested attribute types.
const VXLAN_VNI: u16 = 0;

// SRv6 local-SID nested attribute types.
const FPM_SRV6_LOCALSID_ACTION: u16 = 1;
const FPM_SRV6_LOCALSID_NH4: u16 = 4;
const FPM_SRV6_LOCALSID_NH6: u16 = 5;
const FPM_SRV6_LOCALSID_VRFNAME: u16 = 100;
const FPM_SRV6_LOCALSID_BLOCK_LEN: u16 = 101;
const FPM_SRV6_LOCALSID_NODE_LEN: u16 = 102;
const FPM_SRV6_LOCALSID_FUNC_LEN: u16 = 103;
const FPM_SRV6_LOCALSID_ARG_LEN: u16 = 104;

// SRv6 route-encap nested attribute types.
const FPM_SRV6_ROUTE_VPN_SID: u16 = 100;
const FPM_SRV6_ROUTE_ENCAP_SRC_ADDR: u16 = 101;

// FPM encoding errors.
#[derive(Debug, Eq, PartialEq)]
pub enum EncodeError {
    // The message does not fit into the caller-provided buffer.
    BufferOverflow,
    // The behavior has no FPM representation.
    UnsupportedBehavior(Behavior),
}

// Holds information about a single nexthop for netlink.
#[derive(Debug)]
pub struct NexthopInfo {
    pub gateway: Option<IpAddr>,
    pub ifindex: Option<u32>,
    pub weight: u8,
    pub encap: EncapInfo,
}

// Nexthop encapsulation information.
#[derive(Debug)]
pub enum EncapInfo {
    None,
    Vxlan {
        vni: u32,
    },
    LocalSid {
        action: Behavior,
        nh4: Option<Ipv4Addr>,
        nh6: Option<Ipv6Addr>,
        vrf_name: String,
        structure: SidStructure,
    },
    Srv6Route {
        vpn_sid: Ipv6Addr,
        encap_src_addr: Ipv6Addr,
    },
}

// Information for a netlink route message.
#[derive(Debug)]
pub struct RouteInfo {
    pub msg_type: u16,
    pub table: u32,
    pub protocol: u8,
    pub rtm_type: u8,
    pub prefix: IpNetwork,
    pub metric: Option<u32>,
    pub pref_src: Option<IpAddr>,
    pub nexthops: Vec<NexthopInfo>,
}

// Writer over a caller-owned buffer, with netlink attribute helpers.
//
// All multi-byte fields are emitted in the host byte order, as netlink
// requires.
struct NlBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

// ===== impl RouteInfo =====

impl RouteInfo {
    // Fills out the route information object from the given RIB route.
    pub fn from_route(
        cmd: u16,
        prefix: &IpNetwork,
        route: &Route,
        vrfs: &Vrfs,
        encap_src_addr: Option<Ipv6Addr>,
    ) -> Result<RouteInfo, EncodeError> {
        let mut rtm_type = RTN_UNICAST;
        let mut nexthops = vec![];

        for nexthop in route.nexthops.iter() {
            let (gateway, ifindex) = match nexthop {
                Nexthop::Address { addr, ifindex } => {
                    (Some(*addr), Some(*ifindex))
                }
                Nexthop::Interface { ifindex } => (None, Some(*ifindex)),
                Nexthop::Special(special) => {
                    rtm_type = match special {
                        NexthopSpecial::Blackhole => RTN_BLACKHOLE,
                        NexthopSpecial::Unreachable => RTN_UNREACHABLE,
                        NexthopSpecial::Prohibit => RTN_PROHIBIT,
                    };
                    continue;
                }
            };

            nexthops.push(NexthopInfo {
                gateway,
                ifindex,
                weight: 0,
                encap: EncapInfo::None,
            });
        }

        // SRv6 encapsulations apply to single-nexthop routes only.
        if let Some(srv6) = &route.srv6 {
            if let Some(nhi) = nexthops.first_mut() {
                nhi.encap = match srv6 {
                    RouteSrv6::LocalSid {
                        behavior,
                        ctx,
                        structure,
                    } => {
                        // Resolve the VRF name from the target table ID.
                        let vrf_name = ctx
                            .table_id
                            .and_then(|table_id| vrfs.get_by_table_id(table_id))
                            .map(|vrf| vrf.name.clone())
                            .unwrap_or_default();
                        EncapInfo::LocalSid {
                            action: *behavior,
                            nh4: ctx.nh4,
                            nh6: ctx.nh6,
                            vrf_name,
                            structure: *structure,
                        }
                    }
                    RouteSrv6::Encap { vpn_sid } => EncapInfo::Srv6Route {
                        vpn_sid: *vpn_sid,
                        encap_src_addr: encap_src_addr
                            .unwrap_or(Ipv6Addr::UNSPECIFIED),
                    },
                };
            }
        }

        Ok(RouteInfo {
            msg_type: cmd,
            table: route.table_id,
            protocol: netlink_protocol(route.protocol),
            rtm_type,
            prefix: *prefix,
            metric: Some(route.metric),
            pref_src: None,
            nexthops,
        })
    }

    // Creates a netlink message corresponding to this route in the given
    // buffer space. Returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let mut nlb = NlBuffer::new(buf);

        // Netlink header. The message length is rewritten at the end.
        nlb.put_u32(0)?;
        nlb.put_u16(self.msg_type)?;
        nlb.put_u16(NLM_F_CREATE | NLM_F_REQUEST)?;
        nlb.put_u32(0)?;
        nlb.put_u32(0)?;

        // Route header.
        let af = match self.prefix {
            IpNetwork::V4(_) => AF_INET,
            IpNetwork::V6(_) => AF_INET6,
        };
        nlb.put_u8(af)?;
        nlb.put_u8(self.prefix.prefix())?;
        nlb.put_u8(0)?;
        nlb.put_u8(0)?;
        // The rtm_table field is an uchar. Table IDs that don't fit are
        // carried in the extended RTA_TABLE attribute instead.
        if self.table < 256 {
            nlb.put_u8(self.table as u8)?;
        } else {
            nlb.put_u8(RT_TABLE_UNSPEC)?;
        }
        nlb.put_u8(self.protocol)?;
        nlb.put_u8(RT_SCOPE_UNIVERSE)?;
        nlb.put_u8(self.rtm_type)?;
        nlb.put_u32(0)?;

        if self.table >= 256 {
            nlb.attr_u32(RTA_TABLE, self.table)?;
        }

        // Destination prefix.
        nlb.attr_ip(RTA_DST, &self.prefix.ip())?;

        // Metric.
        if let Some(metric) = self.metric {
            nlb.attr_u32(RTA_PRIORITY, metric)?;
        }

        match self.nexthops.len() {
            0 => (),
            1 => self.encode_single_nexthop(&mut nlb)?,
            _ => self.encode_multipath(&mut nlb)?,
        }

        if let Some(pref_src) = &self.pref_src {
            nlb.attr_ip(RTA_PREFSRC, pref_src)?;
        }

        // Rewrite the total message length.
        let len = nlb.len;
        nlb.buf[0..4].copy_from_slice(&(len as u32).to_ne_bytes());

        Ok(len)
    }

    fn encode_single_nexthop(
        &self,
        nlb: &mut NlBuffer<'_>,
    ) -> Result<(), EncodeError> {
        let nhi = &self.nexthops[0];

        if let Some(gateway) = &nhi.gateway {
            nlb.attr_ip(RTA_GATEWAY, gateway)?;
        }
        if let Some(ifindex) = nhi.ifindex {
            nlb.attr_u32(RTA_OIF, ifindex)?;
        }

        match &nhi.encap {
            EncapInfo::None => (),
            EncapInfo::Vxlan { vni } => {
                nlb.attr_u16(RTA_ENCAP_TYPE, FPM_NH_ENCAP_VXLAN)?;
                let nest = nlb.nest_start(RTA_ENCAP)?;
                nlb.attr_u32(VXLAN_VNI, *vni)?;
                nlb.nest_end(nest);
            }
            EncapInfo::LocalSid {
                action,
                nh4,
                nh6,
                vrf_name,
                structure,
            } => {
                nlb.attr_u16(RTA_ENCAP_TYPE, FPM_NH_ENCAP_SRV6_LOCAL_SID)?;
                let nest = nlb.nest_start(RTA_ENCAP)?;

                nlb.attr_u8(FPM_SRV6_LOCALSID_BLOCK_LEN, structure.block_len)?;
                nlb.attr_u8(FPM_SRV6_LOCALSID_NODE_LEN, structure.node_len)?;
                nlb.attr_u8(
                    FPM_SRV6_LOCALSID_FUNC_LEN,
                    structure.function_len,
                )?;
                nlb.attr_u8(
                    FPM_SRV6_LOCALSID_ARG_LEN,
                    structure.argument_len,
                )?;
                nlb.attr_u32(
                    FPM_SRV6_LOCALSID_ACTION,
                    action.to_u32().unwrap(),
                )?;

                match action {
                    Behavior::End => (),
                    Behavior::EndX => {
                        let nh6 = nh6.unwrap_or(Ipv6Addr::UNSPECIFIED);
                        nlb.attr(FPM_SRV6_LOCALSID_NH6, &nh6.octets())?;
                    }
                    Behavior::EndDx4 => {
                        let nh4 = nh4.unwrap_or(Ipv4Addr::UNSPECIFIED);
                        nlb.attr(FPM_SRV6_LOCALSID_NH4, &nh4.octets())?;
                    }
                    Behavior::EndT
                    | Behavior::EndDt4
                    | Behavior::EndDt6
                    | Behavior::EndDt46
                    | Behavior::UDt4
                    | Behavior::UDt6
                    | Behavior::UDt46 => {
                        nlb.attr_str(FPM_SRV6_LOCALSID_VRFNAME, vrf_name)?;
                    }
                    _ => {
                        return Err(EncodeError::UnsupportedBehavior(*action));
                    }
                }

                nlb.nest_end(nest);
            }
            EncapInfo::Srv6Route {
                vpn_sid,
                encap_src_addr,
            } => {
                nlb.attr_u16(RTA_ENCAP_TYPE, FPM_NH_ENCAP_SRV6_ROUTE)?;
                let nest = nlb.nest_start(RTA_ENCAP)?;
                nlb.attr(
                    FPM_SRV6_ROUTE_ENCAP_SRC_ADDR,
                    &encap_src_addr.octets(),
                )?;
                nlb.attr(FPM_SRV6_ROUTE_VPN_SID, &vpn_sid.octets())?;
                nlb.nest_end(nest);
            }
        }

        Ok(())
    }

    fn encode_multipath(
        &self,
        nlb: &mut NlBuffer<'_>,
    ) -> Result<(), EncodeError> {
        let nest = nlb.nest_start(RTA_MULTIPATH)?;

        for nhi in &self.nexthops {
            let rtnh =
                nlb.rtnh_start(nhi.weight, nhi.ifindex.unwrap_or(0))?;

            if let Some(gateway) = &nhi.gateway {
                nlb.attr_ip(RTA_GATEWAY, gateway)?;
            }

            // Multipath messages carry VxLAN-style encaps only; SRv6
            // encaps are single-nexthop in this encoder.
            if let EncapInfo::Vxlan { vni } = &nhi.encap {
                nlb.attr_u16(RTA_ENCAP_TYPE, FPM_NH_ENCAP_VXLAN)?;
                let inner_nest = nlb.nest_start(RTA_ENCAP)?;
                nlb.attr_u32(VXLAN_VNI, *vni)?;
                nlb.nest_end(inner_nest);
            }

            nlb.rtnh_end(rtnh);
        }

        nlb.nest_end(nest);

        Ok(())
    }
}

// ===== impl NlBuffer =====

impl<'a> NlBuffer<'a> {
    fn new(buf: &'a mut [u8]) -> NlBuffer<'a> {
        NlBuffer { buf, len: 0 }
    }

    fn put_slice(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if self.len + data.len() > self.buf.len() {
            return Err(EncodeError::BufferOverflow);
        }
        self.buf[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }

    fn put_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.put_slice(&[value])
    }

    fn put_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.put_slice(&value.to_ne_bytes())
    }

    fn put_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.put_slice(&value.to_ne_bytes())
    }

    // Pads the buffer up to the netlink attribute alignment.
    fn align(&mut self) -> Result<(), EncodeError> {
        while self.len % 4 != 0 {
            self.put_u8(0)?;
        }
        Ok(())
    }

    fn attr(
        &mut self,
        attr_type: u16,
        payload: &[u8],
    ) -> Result<(), EncodeError> {
        let rta_len = RTA_HDR_SIZE + payload.len();
        self.put_u16(rta_len as u16)?;
        self.put_u16(attr_type)?;
        self.put_slice(payload)?;
        self.align()
    }

    fn attr_u8(
        &mut self,
        attr_type: u16,
        value: u8,
    ) -> Result<(), EncodeError> {
        self.attr(attr_type, &[value])
    }

    fn attr_u16(
        &mut self,
        attr_type: u16,
        value: u16,
    ) -> Result<(), EncodeError> {
        self.attr(attr_type, &value.to_ne_bytes())
    }

    fn attr_u32(
        &mut self,
        attr_type: u16,
        value: u32,
    ) -> Result<(), EncodeError> {
        self.attr(attr_type, &value.to_ne_bytes())
    }

    fn attr_ip(
        &mut self,
        attr_type: u16,
        addr: &IpAddr,
    ) -> Result<(), EncodeError> {
        match addr {
            IpAddr::V4(addr) => self.attr(attr_type, &addr.octets()),
            IpAddr::V6(addr) => self.attr(attr_type, &addr.octets()),
        }
    }

    // NUL-terminated string attribute.
    fn attr_str(
        &mut self,
        attr_type: u16,
        value: &str,
    ) -> Result<(), EncodeError> {
        let rta_len = RTA_HDR_SIZE + value.len() + 1;
        self.put_u16(rta_len as u16)?;
        self.put_u16(attr_type)?;
        self.put_slice(value.as_bytes())?;
        self.put_u8(0)?;
        self.align()
    }

    // Starts a nested attribute. Its length is rewritten by `nest_end`.
    fn nest_start(&mut self, attr_type: u16) -> Result<usize, EncodeError> {
        let start_pos = self.len;
        self.put_u16(0)?;
        self.put_u16(attr_type)?;
        Ok(start_pos)
    }

    fn nest_end(&mut self, start_pos: usize) {
        let rta_len = (self.len - start_pos) as u16;
        self.buf[start_pos..start_pos + 2]
            .copy_from_slice(&rta_len.to_ne_bytes());
    }

    // Starts an rtnexthop entry. Its length is rewritten by `rtnh_end`.
    fn rtnh_start(
        &mut self,
        weight: u8,
        ifindex: u32,
    ) -> Result<usize, EncodeError> {
        let start_pos = self.len;
        self.put_u16(0)?;
        self.put_u8(0)?;
        self.put_u8(weight)?;
        self.put_u32(ifindex)?;
        Ok(start_pos)
    }

    fn rtnh_end(&mut self, start_pos: usize) {
        let rtnh_len = (self.len - start_pos) as u16;
        self.buf[start_pos..start_pos + 2]
            .copy_from_slice(&rtnh_len.to_ne_bytes());
    }
}

// ===== impl EncodeError =====

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::BufferOverflow => {
                write!(f, "message does not fit into the output buffer")
            }
            EncodeError::UnsupportedBehavior(behavior) => {
                write!(f, "unsupported local-SID behavior: {}", behavior)
            }
        }
    }
}

impl std::error::Error for EncodeError {}
