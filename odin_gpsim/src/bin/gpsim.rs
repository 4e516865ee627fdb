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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use odin_gpsim::{info, load_config, GpsimConfig,
    clock::SystemClock,
    scheduler::{spawn_scheduler, FixScheduler},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "GPS receiver emulator that replays a CSV track as 1Hz NMEA sentence stream")]
struct Args {
    /// RON config file (defaults to a single stdout channel)
    #[arg(short,long)]
    config: Option<PathBuf>,

    /// track CSV file, overrides the configured one
    #[arg(short,long)]
    track: Option<PathBuf>,

    /// only write to stdout, ignoring configured channels
    #[arg(long)]
    stdout: bool,
}

lazy_static! { static ref ARGS: Args = Args::parse(); }

#[tokio::main]
async fn main()->Result<()> {
    odin_gpsim::init_tracing();

    let mut config = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => GpsimConfig::default()
    };
    if let Some(track) = &ARGS.track { config.track_file = track.clone() }
    if ARGS.stdout { config.channels = GpsimConfig::default().channels }

    let switch = Arc::new( config.channel_switch()?);
    let router = config.build_router( switch.clone()).await?;

    let mut scheduler = FixScheduler::new( config.track_store(), SystemClock).with_text_message( &config.text_message);
    scheduler.arm()?; // store unavailable is fatal here

    let (handle, join_handle) = spawn_scheduler( scheduler, router, config.tick_interval);
    handle.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("terminating");

    handle.stop().await?;
    let status = handle.status().await?;
    info!("final status: {}", serde_json::to_string( &status)?);

    handle.terminate().await?;
    join_handle.await?;
    Ok(())
}
