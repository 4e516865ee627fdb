/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! GPS receiver emulator core: replays a recorded CSV track as a 1Hz stream of NMEA 0183 sentences
//! (RMC, GGA, GSA, GSV, TXT) that are stamped with the live clock and written to a set of
//! independently switchable output channels
//!
//! data flow per tick: [`store::SampleStore`] -> [`scheduler::FixScheduler`] -> [`sentence::render`]
//! (with [`checksum`]) -> [`router::OutputRouter`] -> [`channel::OutputChannel`]

pub mod errors;
pub mod sample;
pub mod store;
pub mod checksum;
pub mod sentence;
pub mod clock;
pub mod channel;
pub mod router;
pub mod scheduler;
pub mod config;

pub use errors::{OdinGpsimError,Result};
pub use config::{GpsimConfig,load_config};

/* #region logging macros ***********************************************************************/
// thin wrappers so that we can switch the log backend in one place

#[macro_export]
macro_rules! trace {
    ( $( $id:ident = $e:expr ),* ) => { tracing::trace!( $( $id = $e ),* ) };
    ( $( $e: expr ),* ) => { tracing::trace!( $( $e ),* ) }
}

#[macro_export]
macro_rules! debug {
    ( $( $id:ident = $e:expr ),* ) => { tracing::debug!( $( $id = $e ),* ) };
    ( $( $e: expr ),* ) => { tracing::debug!( $( $e ),* ) }
}

#[macro_export]
macro_rules! info {
    ( $( $id:ident = $e:expr ),* ) => { tracing::info!( $( $id = $e ),* ) };
    ( $( $e: expr ),* ) => { tracing::info!( $( $e ),* ) }
}

#[macro_export]
macro_rules! warn {
    ( $( $id:ident = $e:expr ),* ) => { tracing::warn!( $( $id = $e ),* ) };
    ( $( $e: expr ),* ) => { tracing::warn!( $( $e ),* ) }
}

#[macro_export]
macro_rules! error {
    ( $( $id:ident = $e:expr ),* ) => { tracing::error!( $( $id = $e ),* ) };
    ( $( $e: expr ),* ) => { tracing::error!( $( $e ),* ) }
}

/// init a tracing subscriber that is configured through the `RUST_LOG` environment variable
pub fn init_tracing () {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else( |_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter( filter)
        .with_writer( std::io::stderr) // stdout might be an output channel
        .init();
}

/* #endregion logging macros */
