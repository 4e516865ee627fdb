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

use std::sync::{Arc,atomic::{AtomicI64,Ordering}};
use chrono::{DateTime,Utc};

/// the (externally synchronized) wall clock. We only query it, once per tick
pub trait WallClock: Send + Sync {
    /// UTC seconds since epoch
    fn now (&self)->i64;
}

/// system time, which is NTP disciplined on the target
#[derive(Debug,Clone,Copy,Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now (&self)->i64 { Utc::now().timestamp() }
}

/// a clock that only moves when told to. Used for replays with a fixed start time and for tests
#[derive(Debug,Clone,Default)]
pub struct ManualClock {
    secs: Arc<AtomicI64>
}

impl ManualClock {
    pub fn new (secs: i64)->Self { ManualClock { secs: Arc::new( AtomicI64::new(secs)) } }

    pub fn from_datetime (date: DateTime<Utc>)->Self { ManualClock::new( date.timestamp()) }

    pub fn set (&self, secs: i64) { self.secs.store( secs, Ordering::Relaxed) }

    pub fn advance (&self, secs: i64) { self.secs.fetch_add( secs, Ordering::Relaxed); }
}

impl WallClock for ManualClock {
    fn now (&self)->i64 { self.secs.load( Ordering::Relaxed) }
}

impl<T> WallClock for Arc<T> where T: WallClock + ?Sized {
    fn now (&self)->i64 { self.as_ref().now() }
}

/// turns wall clock readings into emission times that strictly increase while the scheduler is running.
/// A tick that fires early (or a clock that was stepped back) gets the previous stamp + 1s, a late tick
/// takes the clock reading as is - we never emit catch-up fixes for skipped seconds
#[derive(Debug,Clone,Default)]
pub struct EmissionStamper {
    last: Option<i64>
}

impl EmissionStamper {
    pub fn new ()->Self { EmissionStamper { last: None } }

    pub fn reset (&mut self) { self.last = None }

    pub fn last (&self)->Option<i64> { self.last }

    pub fn next_stamp (&mut self, now: i64)->i64 {
        let stamp = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now
        };
        self.last = Some(stamp);
        stamp
    }

    pub fn next_datetime (&mut self, now: i64)->DateTime<Utc> {
        let stamp = self.next_stamp( now);
        DateTime::<Utc>::from_timestamp( stamp, 0).unwrap_or_default()
    }
}
