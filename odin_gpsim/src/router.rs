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

use std::{future::Future, sync::Arc, time::Duration};
use serde::Serialize;

use crate::{warn,trace};
use crate::channel::{ChannelEnablement,ChannelState,OutputChannel};
use crate::sentence::Sentence;

/// inter-sentence gap observed on the reference receiver at 9600 baud
pub const DEFAULT_SENTENCE_GAP: Duration = Duration::from_millis(50);

pub const LINE_TERMINATOR: &[u8] = b"\r\n";

#[derive(Debug,Clone,Copy,Default,PartialEq,Serialize)]
pub struct RouterStats {
    pub sentences: u64,     // number of emit calls
    pub writes: u64,        // successful channel writes
    pub write_errors: u64,
}

/// writes each sentence to all currently enabled channels. Enablement is queried on every emit
pub struct OutputRouter {
    channels: Vec<Box<dyn OutputChannel>>,
    enablement: Arc<dyn ChannelEnablement>,
    sentence_gap: Duration,
    line_buf: Vec<u8>,
    stats: RouterStats,
}

impl OutputRouter {
    pub fn new (enablement: Arc<dyn ChannelEnablement>)->Self {
        OutputRouter {
            channels: Vec::new(),
            enablement,
            sentence_gap: DEFAULT_SENTENCE_GAP,
            line_buf: Vec::with_capacity(128),
            stats: RouterStats::default()
        }
    }

    pub fn with_sentence_gap (mut self, sentence_gap: Duration)->Self {
        self.sentence_gap = sentence_gap;
        self
    }

    pub fn add_channel (&mut self, channel: impl OutputChannel + 'static) {
        self.channels.push( Box::new(channel));
    }

    pub fn add_boxed_channel (&mut self, channel: Box<dyn OutputChannel>) {
        self.channels.push( channel);
    }

    pub fn channel_names (&self)->Vec<&str> {
        self.channels.iter().map( |c| c.name()).collect()
    }

    /// current enablement of the channels we actually write to
    pub fn channel_states (&self)->Vec<ChannelState> {
        self.channels.iter().map( |c| {
            ChannelState { name: c.name().to_string(), enabled: self.enablement.is_enabled( c.name()) }
        }).collect()
    }

    pub fn sentence_gap (&self)->Duration { self.sentence_gap }

    pub fn stats (&self)->RouterStats { self.stats }

    /// write sentence + CR/LF to every enabled channel, returning the number of successful writes.
    /// A failing channel does not affect the others
    pub async fn emit (&mut self, sentence: &Sentence)->usize {
        self.line_buf.clear();
        self.line_buf.extend_from_slice( sentence.as_bytes());
        self.line_buf.extend_from_slice( LINE_TERMINATOR);
        self.stats.sentences += 1;

        let mut n_written = 0;
        for channel in self.channels.iter_mut() {
            if self.enablement.is_enabled( channel.name()) {
                match channel.write_line( &self.line_buf).await {
                    Ok(()) => {
                        n_written += 1;
                        self.stats.writes += 1;
                    }
                    Err(e) => {
                        self.stats.write_errors += 1;
                        warn!("failed to write {} to channel {}: {}", sentence.tag(), channel.name(), e);
                    }
                }
            }
        }
        trace!("emitted {} to {} channels", sentence, n_written);

        n_written
    }

    /// the non-blocking pause between two sentences of the same cycle. The returned future does not
    /// borrow the router (which is not `Sync`), so it can be awaited inside spawned tasks
    pub fn pause (&self)->impl Future<Output=()> + Send + 'static {
        let gap = self.sentence_gap;
        async move {
            if !gap.is_zero() {
                tokio::time::sleep( gap).await;
            }
        }
    }
}
