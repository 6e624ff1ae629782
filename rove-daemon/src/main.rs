//
// Copyright (c) The Rove Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;

use std::str::FromStr;

use capctl::caps;
use clap::{Arg, Command};
use nix::unistd::{Uid, User};
use rove_isis::interface::InterfaceType;
use rove_utils::ibus::ibus_channels;
use rove_utils::srv6::Behavior;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

use crate::config::{Config, LoggingFmtStyle};

fn init_tracing(config: &config::Logging) {
    // Enable logging to stdout.
    let stdout = config.stdout.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(config.stdout.show_thread_id)
            .with_file(config.stdout.show_source)
            .with_line_number(config.stdout.show_source)
            .with_ansi(config.stdout.colors);
        let layer = match config.stdout.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    // Configure the tracing fmt layer.
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("rove=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout)
        .init();
}

fn privdrop(user: &str) -> nix::Result<()> {
    // Preserve set of permitted capabilities upon privdrop.
    capctl::prctl::set_securebits(capctl::prctl::Secbits::KEEP_CAPS).unwrap();

    // Drop to unprivileged user and group.
    if let Some(user) = User::from_name(user)? {
        nix::unistd::setgroups(&[user.gid])?;
        nix::unistd::setresgid(user.gid, user.gid, user.gid)?;
        nix::unistd::setresuid(user.uid, user.uid, user.uid)?;
    } else {
        error!(name = %user, "failed to find user");
        std::process::exit(1);
    }

    // Set permitted capabilities.
    let mut caps = caps::CapState::empty();
    for cap in [caps::Cap::NET_ADMIN, caps::Cap::NET_RAW] {
        caps.permitted.add(cap);
    }
    if let Err(error) = caps.set_current() {
        error!(%error, "failed to set permitted capabilities");
    }

    Ok(())
}

// Applies the startup configuration to the daemon components.
fn apply_config(
    config: &Config,
    routing_tx: &rove_utils::UnboundedSender<rove_routing::config::Command>,
    static_tx: &rove_utils::UnboundedSender<rove_static::config::Command>,
    isis_tx: &rove_utils::UnboundedSender<rove_isis::config::Command>,
) {
    use rove_utils::southbound::InterfaceFlags;

    // Broker state: interfaces, VRFs, locators, encapsulation source.
    for iface in &config.routing.interfaces {
        let mut flags = InterfaceFlags::OPERATIVE;
        if iface.loopback {
            flags.insert(InterfaceFlags::LOOPBACK);
        }
        let _ = routing_tx.send(rove_routing::config::Command::InterfaceAdd {
            name: iface.name.clone(),
            ifindex: iface.ifindex,
            mtu: iface.mtu,
            flags,
        });
        for addr in &iface.addresses {
            let _ = routing_tx.send(rove_routing::config::Command::AddressAdd {
                ifname: iface.name.clone(),
                addr: *addr,
            });
        }
    }
    for vrf in &config.routing.vrfs {
        let _ = routing_tx.send(rove_routing::config::Command::VrfAdd {
            name: vrf.name.clone(),
            vrf_id: vrf.vrf_id,
            table_id: vrf.table_id,
        });
    }
    for locator in &config.routing.locators {
        let _ = routing_tx.send(rove_routing::config::Command::LocatorCreate {
            name: locator.name.clone(),
            prefix: locator.prefix,
            block_len: locator.block_len,
            node_len: locator.node_len,
            function_len: locator.function_len,
            argument_len: locator.argument_len,
            usid: locator.usid,
        });
    }
    if let Some(addr) = config.routing.encap_source_address {
        let _ = routing_tx
            .send(rove_routing::config::Command::EncapSrcAddrSet(addr));
    }

    // Static SIDs.
    for sid in &config.static_sids.sids {
        let Ok(behavior) = Behavior::from_str(&sid.behavior) else {
            warn!(address = %sid.address, behavior = %sid.behavior,
                "unknown SID behavior");
            continue;
        };
        let _ = static_tx.send(rove_static::config::Command::SidAdd {
            addr: sid.address,
            behavior,
        });
        if let Some(vrf) = &sid.vrf {
            let _ = static_tx.send(rove_static::config::Command::SidAttrSet {
                addr: sid.address,
                attr: rove_static::config::SidAttr::Vrf(vrf.clone()),
            });
        }
        if let Some(ifname) = &sid.ifname {
            let _ = static_tx.send(rove_static::config::Command::SidAttrSet {
                addr: sid.address,
                attr: rove_static::config::SidAttr::Ifname(ifname.clone()),
            });
        }
        if let Some(adj_v6) = sid.adj_v6 {
            let _ = static_tx.send(rove_static::config::Command::SidAttrSet {
                addr: sid.address,
                attr: rove_static::config::SidAttr::AdjV6(adj_v6),
            });
        }
    }

    // IS-IS.
    if config.isis.enabled {
        if let Some(system_id) = &config.isis.system_id {
            match system_id.parse() {
                Ok(system_id) => {
                    let _ = isis_tx.send(
                        rove_isis::config::Command::SystemIdSet(system_id),
                    );
                }
                Err(_) => {
                    warn!(%system_id, "invalid System ID");
                }
            }
        }
        for iface in &config.isis.interfaces {
            let interface_type = if iface.point_to_point {
                InterfaceType::PointToPoint
            } else {
                InterfaceType::Broadcast
            };
            let _ = isis_tx.send(rove_isis::config::Command::InterfaceAdd {
                name: iface.name.clone(),
                interface_type,
            });
        }
        if config.isis.srv6.enabled {
            let _ = isis_tx.send(rove_isis::config::Command::Srv6Enable);
            if let Some(locator) = &config.isis.srv6.locator {
                let _ = isis_tx.send(
                    rove_isis::config::Command::Srv6LocatorSet(
                        locator.clone(),
                    ),
                );
            }
        }
    }
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = Command::new("Rove routing daemon")
        .version(clap::crate_version!())
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.get_one::<String>("config").map(String::as_str);
    let config = Config::load(config_file);

    // Check for root privileges.
    if !Uid::effective().is_root() {
        eprintln!("need privileged user");
        std::process::exit(1);
    }

    // Initialize tracing.
    init_tracing(&config.logging);

    // Drop privileges.
    if let Err(error) = privdrop(&config.user) {
        error!(%error, "failed to drop root privileges");
        std::process::exit(1);
    }

    // Set panic handler to abort the process if any child task panics.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    // We're ready to go!
    info!("starting up");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(async {
            let (ibus_tx, ibus_rx) = ibus_channels();

            // Start the broker first so protocol clients find it up.
            let fpm_address = config
                .fpm
                .enabled
                .then_some(config.fpm.address)
                .flatten();
            let routing_tx = rove_routing::start(
                ibus_tx.clone(),
                ibus_rx.routing,
                fpm_address,
            );
            let static_tx =
                rove_static::start(ibus_tx.clone(), ibus_rx.staticd);
            let isis_tx =
                rove_isis::start("main", ibus_tx.clone(), ibus_rx.isis);

            // Apply the startup configuration.
            apply_config(&config, &routing_tx, &static_tx, &isis_tx);

            // Run until interrupted.
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for the shutdown signal");
            info!("shutting down");
        });
}
