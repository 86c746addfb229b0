/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Secure partition loader.

--*/
#![cfg_attr(not(feature = "std"), no_std)]

mod block_auth;
pub mod config;
pub mod dest;
mod fsbl_env;
mod hand_off;
mod key_roll;
mod partition_load;

pub use block_auth::{BlockAuthState, BlockLayout, StreamingBlockAuthenticator};
pub use config::{LoaderConfig, ResetReason};
pub use dest::DestinationResolver;
pub use fsbl_env::LoaderEnv;
pub use hand_off::{HandoffEntry, HandoffTable, MAX_HANDOFF_ENTRIES};
pub use key_roll::{KeyRollPhase, KeyRollingDecryptor};
pub use partition_load::{LoadSummary, PartitionLoader, PartitionOutcome};
