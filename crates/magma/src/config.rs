//! Mount-time configuration, covering exactly the option surface the
//! original mount helper exposed (`-p`, `--host=`, `--ip=`,
//! `--debug=`, `--debug-all`, `-s`, `--key=`/`--keyphrase=`, `-f`).
//! Actually registering with the host filesystem stays out of scope;
//! only the option values and their effect on this crate's behavior
//! are covered here.

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::Parser;

/// Default bootstrap/remote node port, per `MAGMA_NODE_PORT`.
pub const DEFAULT_NODE_PORT: u16 = 12000;

/// Reserved flare-transfer port; unused by this crate but carried as a
/// config value since the original's port table reserves it.
pub const DEFAULT_FLARE_PORT: u16 = 12001;

#[derive(Debug, Clone, Parser)]
#[command(name = "magma", about = "MAGMA distributed filesystem client binding")]
pub struct MagmaConfig {
    /// Remote bootstrap node port.
    #[arg(short = 'p', long = "remote-port", env = "MAGMA_NODE_PORT", default_value_t = DEFAULT_NODE_PORT)]
    pub remote_port: u16,

    /// Remote bootstrap node hostname (resolved by the caller; this
    /// crate operates on addresses, not names).
    #[arg(long = "host")]
    pub remote_host: Option<String>,

    /// Remote bootstrap node IPv4 address.
    #[arg(long = "ip")]
    pub remote_ip: Option<Ipv4Addr>,

    /// Shared network keyphrase, carried through but not interpreted
    /// by the client binding (a client never issues JOIN).
    #[arg(long = "key", alias = "keyphrase")]
    pub keyphrase: Option<String>,

    /// Comma-separated list of debug channels to enable.
    #[arg(long = "debug-mask")]
    pub debug_mask: Option<String>,

    /// Enable every debug channel at once.
    #[arg(long = "debug-all", default_value_t = false)]
    pub debug_all: bool,

    /// Run single-threaded.
    #[arg(short = 's', long = "single-threaded", default_value_t = false)]
    pub single_threaded: bool,

    /// Stay in the foreground (not daemonize).
    #[arg(short = 'f', long = "foreground", default_value_t = false)]
    pub foreground: bool,

    /// Host mountpoint path, carried through for the host adapter.
    pub mountpoint: Option<String>,

    /// Per-request timeout before an endpoint is considered dead.
    #[arg(skip)]
    pub request_timeout: Option<Duration>,
}

impl MagmaConfig {
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(Duration::from_secs(5))
    }

    /// Build the `tracing_subscriber::EnvFilter` directive string for
    /// this config's debug knobs.
    pub fn filter_directive(&self) -> String {
        if self.debug_all {
            return "trace".to_string();
        }
        match &self.debug_mask {
            Some(mask) if !mask.is_empty() => mask
                .split(',')
                .map(|channel| format!("{}=trace", channel.trim()))
                .collect::<Vec<_>>()
                .join(","),
            _ => "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_match_documented_values() {
        assert_eq!(DEFAULT_NODE_PORT, 12000);
        assert_eq!(DEFAULT_FLARE_PORT, 12001);
    }

    #[test]
    fn debug_all_overrides_mask() {
        let config = MagmaConfig {
            remote_port: DEFAULT_NODE_PORT,
            remote_host: None,
            remote_ip: None,
            keyphrase: None,
            debug_mask: Some("net".to_string()),
            debug_all: true,
            single_threaded: false,
            foreground: false,
            mountpoint: None,
            request_timeout: None,
        };
        assert_eq!(config.filter_directive(), "trace");
    }

    #[test]
    fn debug_mask_translates_to_per_channel_directives() {
        let config = MagmaConfig {
            remote_port: DEFAULT_NODE_PORT,
            remote_host: None,
            remote_ip: None,
            keyphrase: None,
            debug_mask: Some("net, client".to_string()),
            debug_all: false,
            single_threaded: false,
            foreground: false,
            mountpoint: None,
            request_timeout: None,
        };
        assert_eq!(config.filter_directive(), "net=trace,client=trace");
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        let config = MagmaConfig {
            remote_port: DEFAULT_NODE_PORT,
            remote_host: None,
            remote_ip: None,
            keyphrase: None,
            debug_mask: None,
            debug_all: false,
            single_threaded: false,
            foreground: false,
            mountpoint: None,
            request_timeout: None,
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
