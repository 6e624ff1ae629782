//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use std::net::{Ipv6Addr, SocketAddr};

use ipnetwork::{IpNetwork, Ipv6Network};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub user: String,
    pub logging: Logging,
    pub fpm: Fpm,
    pub routing: Routing,
    #[serde(rename = "static")]
    pub static_sids: StaticSids,
    pub isis: Isis,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
    pub enabled: bool,
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_thread_id: bool,
    pub show_source: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fpm {
    pub enabled: bool,
    pub address: Option<SocketAddr>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Routing {
    pub interfaces: Vec<Interface>,
    pub vrfs: Vec<Vrf>,
    pub locators: Vec<Locator>,
    pub encap_source_address: Option<Ipv6Addr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Interface {
    pub name: String,
    pub ifindex: u32,
    #[serde(default = "dflt_mtu")]
    pub mtu: u32,
    #[serde(default)]
    pub loopback: bool,
    #[serde(default)]
    pub addresses: Vec<IpNetwork>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vrf {
    pub name: String,
    pub vrf_id: u32,
    pub table_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Locator {
    pub name: String,
    pub prefix: Ipv6Network,
    pub block_len: u8,
    pub node_len: u8,
    pub function_len: u8,
    #[serde(default)]
    pub argument_len: u8,
    #[serde(default)]
    pub usid: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticSids {
    pub sids: Vec<StaticSid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticSid {
    pub address: Ipv6Addr,
    // Behavior in its configuration rendering, e.g. "end-dt4".
    pub behavior: String,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub ifname: Option<String>,
    #[serde(default)]
    pub adj_v6: Option<Ipv6Addr>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Isis {
    pub enabled: bool,
    pub system_id: Option<String>,
    pub interfaces: Vec<IsisInterface>,
    pub srv6: IsisSrv6,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IsisInterface {
    pub name: String,
    #[serde(default)]
    pub point_to_point: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsisSrv6 {
    pub enabled: bool,
    pub locator: Option<String>,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/roved.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => toml::from_str(&config_str)
                .expect("failed to parse configuration file"),
            Err(error) => {
                eprintln!(
                    "failed to read configuration file {}: {}",
                    config_file, error
                );
                eprintln!("using default configuration parameters");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            user: "rove".to_owned(),
            logging: Default::default(),
            fpm: Default::default(),
            routing: Default::default(),
            static_sids: Default::default(),
            isis: Default::default(),
        }
    }
}

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout {
            enabled: true,
            style: LoggingFmtStyle::Full,
            colors: true,
            show_thread_id: false,
            show_source: false,
        }
    }
}

// ===== helper functions =====

fn dflt_mtu() -> u32 {
    1500
}
