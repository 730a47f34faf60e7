//! Domain layer for the mining policy
//!
//! Pure logic only: nothing here touches the chain view, locks, or clocks.
//!
//! - `address`: miner identity derived from locking scripts
//! - `ltx`: the license output wire format (parse-only)
//! - `license`: the license registry, its amendment rules, and the journal
//! - `round`: round boundary arithmetic
//! - `quota`: per-round quota distribution

mod address;
mod license;
mod ltx;
mod quota;
mod round;

pub use address::MinerAddress;
pub use license::{LicenseEntry, LicenseRegistry, LicenseUpdate};
pub use ltx::{
    is_license_carrier, is_license_header, parse_license_output, LICENSE_HEADER,
    MAX_LICENSE_SCRIPT_SIZE, MIN_LICENSE_SCRIPT_SIZE,
};
pub use quota::block_quotas;
pub use round::{round_end, round_start};
