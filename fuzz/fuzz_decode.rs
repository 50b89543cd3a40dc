//! Fuzz target for datagram decoding and resolution.
//!
//! Run with: cargo +nightly fuzz run fuzz_decode
//!
//! Arbitrary datagrams must decode without panicking, and every decoded
//! command that has a wire form must decode back to itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use udpbar_core::{Command, Decoder, IconCatalog, Resolution, resolve};

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::default();
    let catalog = IconCatalog::default();

    let command = decoder.decode(data);
    if data.len() > decoder.max_len() {
        assert_eq!(command, Command::Unknown);
    }

    match resolve(&command, &catalog) {
        Resolution::Change(_) => {}
        Resolution::Quit => assert_eq!(command, Command::QuitRequest),
        Resolution::NoChange => {}
    }

    if let Some(wire) = command.to_wire(decoder.quit_token()) {
        assert_eq!(decoder.decode(wire.as_bytes()), command);
    }
});
