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

use std::{fs, path::{Path,PathBuf}, sync::Arc, time::Duration};
use serde::{Serialize,Deserialize};

use crate::info;
use crate::channel::{ChannelSwitch,WriterChannel};
use crate::errors::{OdinGpsimError,Result};
use crate::router::{OutputRouter,DEFAULT_SENTENCE_GAP};
use crate::scheduler::DEFAULT_TICK_INTERVAL;
use crate::sentence::{DEFAULT_TEXT_MESSAGE,MAX_TEXT_LEN};
use crate::store::CsvSampleStore;

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub enum ChannelKind {
    Stdout,
    Device { path: PathBuf }, // serial tty (line settings are configured outside)
    File { path: PathBuf },   // capture file, appended to
    Tcp { addr: String },     // listening NMEA consumer
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct ChannelConfig {
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default="default_enabled")]
    pub enabled: bool,
}

fn default_enabled ()->bool { true }

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct GpsimConfig {
    pub track_file: PathBuf,

    #[serde(default="default_tick_interval")]
    pub tick_interval: Duration,

    #[serde(default="default_sentence_gap")]
    pub sentence_gap: Duration,

    #[serde(default="default_text_message")]
    pub text_message: String,

    pub channels: Vec<ChannelConfig>,
}

fn default_tick_interval ()->Duration { DEFAULT_TICK_INTERVAL }
fn default_sentence_gap ()->Duration { DEFAULT_SENTENCE_GAP }
fn default_text_message ()->String { DEFAULT_TEXT_MESSAGE.to_string() }

impl Default for GpsimConfig {
    fn default ()->Self {
        GpsimConfig {
            track_file: PathBuf::from("gps_track.csv"),
            tick_interval: DEFAULT_TICK_INTERVAL,
            sentence_gap: DEFAULT_SENTENCE_GAP,
            text_message: default_text_message(),
            channels: vec![ ChannelConfig { name: "usb".to_string(), kind: ChannelKind::Stdout, enabled: true } ],
        }
    }
}

impl GpsimConfig {
    pub fn from_ron (s: &str)->Result<Self> {
        let config: GpsimConfig = ron::de::from_bytes( s.as_bytes())?;
        config.validate()?;
        Ok(config)
    }

    /// at least one channel has to be enabled, names have to be unique. Text messages have to fit into
    /// a single GNTXT sentence and must not contain NMEA delimiters
    pub fn validate (&self)->Result<()> {
        if self.tick_interval.is_zero() {
            return Err( OdinGpsimError::OpFailedError( "tick_interval must not be zero".to_string()))
        }
        if self.text_message.len() > MAX_TEXT_LEN || self.text_message.contains( ['$','*',',','\r','\n']) {
            return Err( OdinGpsimError::FormatError( format!("invalid text message '{}'", self.text_message)))
        }
        self.channel_switch().map( |_| ())
    }

    pub fn channel_switch (&self)->Result<ChannelSwitch> {
        ChannelSwitch::new( self.channels.iter().map( |c| (c.name.as_str(), c.enabled)))
    }

    pub fn track_store (&self)->CsvSampleStore<PathBuf> {
        CsvSampleStore::from_path( self.track_file.clone())
    }

    /// open all configured channels (including the disabled ones, which can be switched on at runtime)
    pub async fn build_router (&self, switch: Arc<ChannelSwitch>)->Result<OutputRouter> {
        let mut router = OutputRouter::new( switch).with_sentence_gap( self.sentence_gap);

        for c in &self.channels {
            match &c.kind {
                ChannelKind::Stdout => router.add_channel( WriterChannel::stdout( &c.name)),
                ChannelKind::Device{path} => router.add_channel( WriterChannel::device( &c.name, path).await?),
                ChannelKind::File{path} => router.add_channel( WriterChannel::file( &c.name, path).await?),
                ChannelKind::Tcp{addr} => router.add_channel( WriterChannel::tcp( &c.name, addr.as_str()).await?),
            }
            info!("opened output channel {} ({:?}, enabled: {})", c.name, c.kind, c.enabled);
        }

        Ok(router)
    }
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<GpsimConfig> {
    let data = fs::read( path.as_ref())?;
    let config: GpsimConfig = ron::de::from_bytes( data.as_slice())?;
    config.validate()?;
    Ok(config)
}
