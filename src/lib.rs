// TODO(zephyr): enable "#![no_std]" later, and start to build for multiple targets.
//   cargo build --target thumbv6m-none-eabi
//   cargo build --target x86_64-unknown-linux-gnu

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]

extern crate alloc;

pub mod cmd_header;
pub mod codec;
pub mod constant;
pub mod data_type;
pub mod dcf;
pub mod eds;
pub mod emergency;
pub mod error;
pub mod lss;
pub mod multi_platform;
pub mod nmt;
pub mod node;
pub mod object_directory;
pub mod pdo;
pub mod redundancy;
pub mod router;
pub mod sdo_client;
pub mod sdo_server;
pub mod timer;
pub mod util;
pub mod value;

mod prelude;
