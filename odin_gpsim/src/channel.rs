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

use std::{io, path::Path, sync::{Arc,Mutex,atomic::{AtomicBool,Ordering}}};
use async_trait::async_trait;
use serde::Serialize;
use tokio::{fs::OpenOptions, io::{AsyncWrite,AsyncWriteExt}, net::{TcpStream,ToSocketAddrs}};

use crate::errors::{OdinGpsimError,Result};

/// an independent destination for rendered sentences (hardware UART, host USB serial, capture file..)
#[async_trait]
pub trait OutputChannel: Send {
    fn name (&self)->&str;

    /// write the complete (already terminated) line
    async fn write_line (&mut self, line: &[u8])->io::Result<()>;
}

/// channel on top of any async writer. We flush after each line since consumers expect to see
/// sentences as they are produced
pub struct WriterChannel<W> where W: AsyncWrite + Unpin + Send {
    name: String,
    writer: W,
}

impl<W> WriterChannel<W> where W: AsyncWrite + Unpin + Send {
    pub fn new (name: impl ToString, writer: W)->Self {
        WriterChannel { name: name.to_string(), writer }
    }
}

impl WriterChannel<tokio::io::Stdout> {
    pub fn stdout (name: impl ToString)->Self { WriterChannel::new( name, tokio::io::stdout()) }
}

impl WriterChannel<tokio::fs::File> {
    /// a serial device node (line settings such as 9600 8N1 are configured outside, e.g. by stty)
    pub async fn device (name: impl ToString, path: impl AsRef<Path>)->Result<Self> {
        let file = OpenOptions::new().write(true).open( path).await?;
        Ok( WriterChannel::new( name, file) )
    }

    /// a capture file that is appended to
    pub async fn file (name: impl ToString, path: impl AsRef<Path>)->Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open( path).await?;
        Ok( WriterChannel::new( name, file) )
    }
}

impl WriterChannel<TcpStream> {
    pub async fn tcp (name: impl ToString, addr: impl ToSocketAddrs)->Result<Self> {
        let stream = TcpStream::connect( addr).await?;
        stream.set_nodelay(true)?;
        Ok( WriterChannel::new( name, stream) )
    }
}

#[async_trait]
impl<W> OutputChannel for WriterChannel<W> where W: AsyncWrite + Unpin + Send {
    fn name (&self)->&str { self.name.as_str() }

    async fn write_line (&mut self, line: &[u8])->io::Result<()> {
        self.writer.write_all( line).await?;
        self.writer.flush().await
    }
}

/// channel that records everything written to it. The recorded data is shared with all clones
#[derive(Clone)]
pub struct MemoryChannel {
    name: String,
    data: Arc<Mutex<Vec<u8>>>,
}

impl MemoryChannel {
    pub fn new (name: impl ToString)->Self {
        MemoryChannel { name: name.to_string(), data: Arc::new( Mutex::new( Vec::new())) }
    }

    pub fn contents (&self)->String {
        self.data.lock().map( |d| String::from_utf8_lossy( &d).into_owned()).unwrap_or_default()
    }

    /// the recorded lines without CR/LF terminators
    pub fn lines (&self)->Vec<String> {
        self.contents().split_terminator("\r\n").map( |s| s.to_string()).collect()
    }

    pub fn clear (&self) {
        if let Ok(mut d) = self.data.lock() { d.clear() }
    }
}

#[async_trait]
impl OutputChannel for MemoryChannel {
    fn name (&self)->&str { self.name.as_str() }

    async fn write_line (&mut self, line: &[u8])->io::Result<()> {
        match self.data.lock() {
            Ok(mut d) => { d.extend_from_slice( line); Ok(()) }
            Err(_) => Err( io::Error::other( "memory channel lock poisoned"))
        }
    }
}

/// the query side of channel enablement. The router asks on every emit and never caches the answer
pub trait ChannelEnablement: Send + Sync {
    fn is_enabled (&self, channel: &str)->bool;
}

struct ChannelEntry {
    name: String,
    enabled: AtomicBool,
}

#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct ChannelState {
    pub name: String,
    pub enabled: bool,
}

/// the set of known channels with their enabled state. Changes that would leave no channel enabled
/// are rejected, so readers can rely on at least one channel being enabled at any time
pub struct ChannelSwitch {
    entries: Vec<ChannelEntry>,
    update_lock: Mutex<()>, // serializes writers, readers only look at the atomics
}

impl ChannelSwitch {
    pub fn new<S: ToString> (channels: impl IntoIterator<Item=(S,bool)>)->Result<Self> {
        let mut entries: Vec<ChannelEntry> = Vec::new();
        for (name,enabled) in channels {
            let name = name.to_string();
            if entries.iter().any( |e| e.name == name) {
                return Err( OdinGpsimError::ChannelConfigError( format!("duplicate channel '{}'", name)))
            }
            entries.push( ChannelEntry { name, enabled: AtomicBool::new(enabled) });
        }

        if !entries.iter().any( |e| e.enabled.load( Ordering::Relaxed)) {
            return Err( OdinGpsimError::ChannelConfigError( "at least one output channel has to be enabled".to_string()))
        }

        Ok( ChannelSwitch { entries, update_lock: Mutex::new(()) } )
    }

    pub fn names (&self)->Vec<&str> {
        self.entries.iter().map( |e| e.name.as_str()).collect()
    }

    pub fn contains (&self, channel: &str)->bool {
        self.entries.iter().any( |e| e.name == channel)
    }

    pub fn set_enabled (&self, channel: &str, enabled: bool)->Result<()> {
        self.set_all( &[(channel,enabled)])
    }

    /// apply several changes at once (e.g. "gpio on, usb off"). Either all or none are applied
    pub fn set_all (&self, changes: &[(&str,bool)])->Result<()> {
        let _guard = self.update_lock.lock().map_err( |_| OdinGpsimError::OpFailedError( "channel switch lock poisoned".to_string()))?;

        let mut new_states: Vec<bool> = self.entries.iter().map( |e| e.enabled.load( Ordering::Relaxed)).collect();
        for (name,enabled) in changes {
            let Some(idx) = self.entries.iter().position( |e| e.name == *name) else {
                return Err( OdinGpsimError::ChannelConfigError( format!("unknown channel '{}'", name)))
            };
            new_states[idx] = *enabled;
        }

        if !new_states.iter().any( |s| *s) {
            return Err( OdinGpsimError::ChannelConfigError( "at least one output channel has to be enabled".to_string()))
        }

        for (e,s) in self.entries.iter().zip( new_states) {
            e.enabled.store( s, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn snapshot (&self)->Vec<ChannelState> {
        self.entries.iter().map( |e| ChannelState { name: e.name.clone(), enabled: e.enabled.load( Ordering::Relaxed) }).collect()
    }
}

impl ChannelEnablement for ChannelSwitch {
    fn is_enabled (&self, channel: &str)->bool {
        self.entries.iter().find( |e| e.name == channel).map( |e| e.enabled.load( Ordering::Relaxed)).unwrap_or(false)
    }
}

impl<T> ChannelEnablement for Arc<T> where T: ChannelEnablement + ?Sized {
    fn is_enabled (&self, channel: &str)->bool { self.as_ref().is_enabled( channel) }
}
