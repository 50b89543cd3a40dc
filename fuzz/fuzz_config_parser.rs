//! Fuzz target for config parsing and environment overrides.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! The input is split at the first NUL byte: the head is parsed as TOML, the
//! tail is fed in as the `UDPBAR_PORT`, `UDPBAR_BIND` and `UDPBAR_INIT`
//! values. Any config that survives must still validate.

#![no_main]

use libfuzzer_sys::fuzz_target;
use udpbar_config::{AppConfig, ENV_BIND, ENV_INIT, ENV_PORT};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let (toml, env) = s.split_once('\0').unwrap_or((s, ""));

    let Ok(mut config) = AppConfig::parse(toml) else {
        return;
    };
    let mut values = env.split('\0');
    let port = values.next().map(str::to_string);
    let bind = values.next().map(str::to_string);
    let init = values.next().map(str::to_string);

    let applied = config.apply_env_overrides(|var| match var {
        v if v == ENV_PORT => port.clone(),
        v if v == ENV_BIND => bind.clone(),
        v if v == ENV_INIT => init.clone(),
        _ => None,
    });
    if applied.is_ok() {
        assert!(config.validate().is_ok());
        let _ = config.listen_addr();
    }
});
