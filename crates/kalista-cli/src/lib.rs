//! # kalista-cli — Command-Line Front End
//!
//! Provides the `kalista` command.
//!
//! ## Subcommands
//!
//! - `kalista run <DIR>`: execute every contract against its endpoint.
//! - `kalista check <DIR>`: parse and compile contracts offline.
//! - `kalista validate-body <CONTRACT> <BODY>`: check a captured body.
//!
//! ```bash
//! kalista run contracts/ --max-concurrency 8 --timeout-secs 5
//! kalista check contracts/ --all-files
//! kalista validate-body contracts/orders/create.yaml body.json --role request
//! ```
//!
//! ## Exit Codes
//!
//! `0` when every contract passed, `1` when any contract failed, `2` when
//! the command could not run at all (bad config, unreadable directory).

pub mod check;
pub mod options;
pub mod report;
pub mod run;
pub mod validate_body;

/// Every contract passed.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one contract failed.
pub const EXIT_FAILURES: u8 = 1;

/// The command could not run.
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;
