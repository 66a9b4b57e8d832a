//! JSON configuration for the `radiusd` daemon binary.

use crate::server::{Dictionaries, Secrets, META_DEFAULT};
use radius_proto::{Dictionary, DictionaryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// A user the daemon authenticates with PAP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

/// A RADIUS peer with its own shared secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    /// Peer IP literal (`192.168.1.16`, `ff02::1`).
    pub address: String,
    /// Shared secret for this peer.
    pub secret: String,
    /// Optional peer name/description.
    #[serde(default)]
    pub name: Option<String>,
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transport: "udp" or "tcp".
    #[serde(default = "default_network")]
    pub network: String,

    /// Listen address.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Listen port (1812 auth / 1813 acct are the registered ports).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Default shared secret, used for peers without an entry of their own.
    #[serde(default)]
    pub secret: String,

    /// Per-peer shared secrets.
    #[serde(default)]
    pub peers: Vec<Peer>,

    /// Users accepted by the PAP authentication handler.
    #[serde(default)]
    pub users: Vec<User>,

    /// Directory tree searched for `dictionary.*` files supplementing the
    /// built-in RFC 2865 dictionary.
    #[serde(default)]
    pub dictionary_dir: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_network() -> String {
    "udp".to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    1812
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// A starter configuration written next to a missing config file.
    pub fn example() -> Self {
        Config {
            network: default_network(),
            listen_address: "127.0.0.1".to_string(),
            listen_port: default_listen_port(),
            secret: "CGRateS.org".to_string(),
            peers: vec![Peer {
                address: "127.0.0.1".to_string(),
                secret: "CGRateS.org".to_string(),
                name: Some("localhost NAS".to_string()),
            }],
            users: vec![User {
                username: "flopsy".to_string(),
                password: "CGRateSPassword1".to_string(),
            }],
            dictionary_dir: None,
            log_level: Some("info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network != "udp" && self.network != "tcp" {
            return Err(ConfigError::Invalid(format!(
                "unsupported network: <{}>",
                self.network
            )));
        }
        for peer in &self.peers {
            if peer.address.parse::<IpAddr>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "peer address is not an IP literal: {}",
                    peer.address
                )));
            }
        }
        self.socket_addr()?;
        Ok(())
    }

    /// The listen address as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.listen_address, self.listen_port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "invalid listen address: {}:{}",
                    self.listen_address, self.listen_port
                ))
            })
    }

    /// Builds the per-peer secrets registry, with the daemon-wide secret as
    /// the `*default` entry.
    pub fn build_secrets(&self) -> Secrets {
        let mut secrets = HashMap::new();
        if !self.secret.is_empty() {
            secrets.insert(META_DEFAULT.to_string(), self.secret.clone());
        }
        for peer in &self.peers {
            secrets.insert(peer.address.clone(), peer.secret.clone());
        }
        Secrets::new(secrets)
    }

    /// Builds the dictionaries registry: the RFC 2865 set supplemented from
    /// `dictionary.*` files under `dictionary_dir`, shared by all peers.
    pub fn build_dictionaries(&self) -> Result<Dictionaries, ConfigError> {
        let dict = match &self.dictionary_dir {
            Some(dir) => Dictionary::from_folder_with_rfc2865(dir)?,
            None => Dictionary::rfc2865(),
        };
        Ok(Dictionaries::new(HashMap::from([(
            META_DEFAULT.to_string(),
            Arc::new(dict),
        )])))
    }
}
