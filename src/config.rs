//! Runtime settings
//!
//! Layered configuration: built-in defaults, then an optional `attune.toml`
//! in the working directory, then `ATTUNE_*` environment overrides
//! (e.g. `ATTUNE_PORT=9000`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::error::Result;
use crate::memory::MemoryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub short_term_capacity: usize,
    pub long_term_cap_kib: usize,
    pub decay_half_life_days: f64,
    pub decay_floor: f64,
}

impl Settings {
    /// Load settings from defaults, optional file, and environment
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8000)?
            .set_default("database_url", "sqlite://attune.db")?
            .set_default("short_term_capacity", 10)?
            .set_default("long_term_cap_kib", 50)?
            .set_default("decay_half_life_days", 30.0)?
            .set_default("decay_floor", 0.1)?
            .add_source(File::with_name("attune").required(false))
            .add_source(Environment::with_prefix("ATTUNE"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn memory_config(&self) -> MemoryConfig {
        MemoryConfig {
            short_term_capacity: self.short_term_capacity,
            long_term_cap_kib: self.long_term_cap_kib,
            decay_half_life_days: self.decay_half_life_days,
            decay_floor: self.decay_floor,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://attune.db".to_string(),
            short_term_capacity: 10,
            long_term_cap_kib: 50,
            decay_half_life_days: 30.0,
            decay_floor: 0.1,
        }
    }
}
