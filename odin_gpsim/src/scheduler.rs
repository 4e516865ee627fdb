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

//! the fix scheduler: advances through the track store one record per 1s tick, stamps each record
//! with the live clock and emits the rendered sentence cycle through the output router

use std::{fmt, time::Duration};
use chrono::{DateTime,Utc};
use serde::Serialize;
use tokio::{sync::{mpsc,oneshot}, task::JoinHandle, time::{Instant,MissedTickBehavior}};

use crate::{debug,info,warn,error};
use crate::clock::{EmissionStamper,WallClock};
use crate::errors::{OdinGpsimError,Result,op_failed};
use crate::channel::ChannelState;
use crate::router::{OutputRouter,RouterStats};
use crate::sample::{Fix,PositionSample};
use crate::sentence::{self,CYCLE,DEFAULT_TEXT_MESSAGE};
use crate::store::{Pull,SampleStore};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize)]
pub enum SchedulerState {
    Uninitialized, // no store opened yet (or the last open failed)
    Armed,         // store open, first sample loaded
    Running,       // emitting on schedule
    Stopped,       // paused, store position retained
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Uninitialized => "UNINITIALIZED",
            SchedulerState::Armed => "ARMED",
            SchedulerState::Running => "RUNNING",
            SchedulerState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// what happened in one tick
#[derive(Debug,Clone,PartialEq)]
pub enum TickOutcome {
    /// scheduler is not running
    Idle,
    /// a full cycle was emitted for the held sample
    Emitted { time: DateTime<Utc>, line: usize, sentences: usize },
    /// the held sample was invalid (or there was none), nothing emitted for this tick
    Silent { time: DateTime<Utc>, line: Option<usize> },
}

impl TickOutcome {
    pub fn time (&self)->Option<DateTime<Utc>> {
        match self {
            TickOutcome::Idle => None,
            TickOutcome::Emitted{time,..} | TickOutcome::Silent{time,..} => Some(*time)
        }
    }
}

/// state snapshot for the (external) control surface
#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub store: String,
    pub store_loaded: bool,
    pub store_line: usize,       // records read since last (re)open
    pub held_line: Option<usize>,
    pub fixes_emitted: u64,
    pub silent_ticks: u64,
    pub rewinds: u64,
    pub last_emission: Option<DateTime<Utc>>,
    pub channels: Vec<ChannelState>,
    pub router: Option<RouterStats>,
}

pub struct FixScheduler<S,C> where S: SampleStore, C: WallClock {
    store: S,
    clock: C,
    state: SchedulerState,
    held: Option<PositionSample>,
    stamper: EmissionStamper,
    text_message: String,

    fixes_emitted: u64,
    silent_ticks: u64,
    rewinds: u64,
    last_emission: Option<DateTime<Utc>>,
}

impl<S,C> FixScheduler<S,C> where S: SampleStore, C: WallClock {
    pub fn new (store: S, clock: C)->Self {
        FixScheduler {
            store, clock,
            state: SchedulerState::Uninitialized,
            held: None,
            stamper: EmissionStamper::new(),
            text_message: DEFAULT_TEXT_MESSAGE.to_string(),
            fixes_emitted: 0,
            silent_ticks: 0,
            rewinds: 0,
            last_emission: None,
        }
    }

    pub fn with_text_message (mut self, text: impl ToString)->Self {
        self.text_message = text.to_string();
        self
    }

    pub fn state (&self)->SchedulerState { self.state }
    pub fn held_sample (&self)->Option<&PositionSample> { self.held.as_ref() }
    pub fn store (&self)->&S { &self.store }
    pub fn store_mut (&mut self)->&mut S { &mut self.store }
    pub fn fixes_emitted (&self)->u64 { self.fixes_emitted }
    pub fn rewinds (&self)->u64 { self.rewinds }

    /// open the store and load the first sample. This is the only place where an unavailable store is
    /// fatal - the scheduler stays UNINITIALIZED and can't be started
    pub fn arm (&mut self)->Result<()> {
        if self.state == SchedulerState::Running {
            return Err( OdinGpsimError::InvalidState{ op: "arm", state: self.state.to_string() })
        }

        self.held = None;
        if let Err(e) = self.store.open() {
            error!("failed to arm fix scheduler: {}", e);
            self.set_state( SchedulerState::Uninitialized);
            return Err(e)
        }

        self.held = self.next_sample();
        self.set_state( SchedulerState::Armed);
        Ok(())
    }

    /// ARMED|STOPPED -> RUNNING. Fails if the store has become unavailable in the meantime, in which
    /// case the state does not change
    pub fn start (&mut self)->Result<()> {
        match self.state {
            SchedulerState::Running => Ok(()),
            SchedulerState::Uninitialized => {
                Err( OdinGpsimError::InvalidState{ op: "start", state: self.state.to_string() })
            }
            SchedulerState::Armed | SchedulerState::Stopped => {
                if !self.store.is_available() {
                    let e = OdinGpsimError::StoreUnavailable( format!("cannot start, {} is gone", self.store.describe()));
                    error!("{}", e);
                    return Err(e)
                }
                self.stamper.reset();
                self.set_state( SchedulerState::Running);
                Ok(())
            }
        }
    }

    /// RUNNING -> STOPPED, keeping the store position. No-op in all other states
    pub fn stop (&mut self)->Result<()> {
        if self.state == SchedulerState::Running {
            self.set_state( SchedulerState::Stopped);
        }
        Ok(())
    }

    /// stop, re-open the store from the beginning and go back to ARMED
    pub fn reload (&mut self)->Result<()> {
        self.stop()?;
        self.arm()
    }

    /// one scheduling step. Partial cycles are never aborted once started
    pub async fn tick (&mut self, router: &mut OutputRouter)->TickOutcome {
        if self.state != SchedulerState::Running {
            return TickOutcome::Idle
        }

        let time = self.stamper.next_datetime( self.clock.now());

        let outcome = match self.held.as_ref() {
            Some(sample) if sample.valid => {
                let fix = Fix::new( sample, time);
                for (i,part) in CYCLE.iter().enumerate() {
                    if i > 0 { router.pause().await }
                    let s = sentence::render( *part, &fix, &self.text_message);
                    router.emit( &s).await;
                }
                self.fixes_emitted += 1;
                self.last_emission = Some(time);
                debug!("emitted fix {} for record {}", time.format("%H:%M:%S"), sample.line);
                TickOutcome::Emitted { time, line: sample.line, sentences: CYCLE.len() }
            }
            other => {
                self.silent_ticks += 1;
                let line = other.map( |s| s.line);
                debug!("silent tick {} (record {:?} invalid or missing)", time.format("%H:%M:%S"), line);
                TickOutcome::Silent { time, line }
            }
        };

        self.held = self.next_sample();
        outcome
    }

    pub fn status (&self)->SchedulerStatus {
        SchedulerStatus {
            state: self.state,
            store: self.store.describe(),
            store_loaded: self.store.is_open(),
            store_line: self.store.position(),
            held_line: self.held.as_ref().map( |s| s.line),
            fixes_emitted: self.fixes_emitted,
            silent_ticks: self.silent_ticks,
            rewinds: self.rewinds,
            last_emission: self.last_emission,
            channels: Vec::new(),
            router: None,
        }
    }

    /// pull the next record, wrapping around at the end of the store so that the track loops
    fn next_sample (&mut self)->Option<PositionSample> {
        if let Pull::Sample(sample) = self.store.next_sample() {
            return Some(sample)
        }

        if let Err(e) = self.store.rewind() {
            error!("failed to rewind track store: {}", e);
            return None
        }
        self.rewinds += 1;
        info!("track store {} rewound", self.store.describe());

        match self.store.next_sample() {
            Pull::Sample(sample) => Some(sample),
            Pull::Exhausted => {
                warn!("track store {} has no records", self.store.describe());
                None
            }
        }
    }

    fn set_state (&mut self, new_state: SchedulerState) {
        if new_state != self.state {
            info!("fix scheduler {} -> {}", self.state, new_state);
            self.state = new_state;
        }
    }
}

/* #region task driver ***************************************************************************/

/// run control commands. Commands are processed between ticks, i.e. they take effect before the next tick
#[derive(Debug)]
pub enum ControlCmd {
    Start( oneshot::Sender<Result<()>> ),
    Stop( oneshot::Sender<Result<()>> ),
    Reload( oneshot::Sender<Result<()>> ),
    Status( oneshot::Sender<SchedulerStatus> ),
    Terminate,
}

/// the run control collaborator interface of a spawned scheduler task
#[derive(Debug,Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<ControlCmd>
}

impl SchedulerHandle {
    pub async fn start (&self)->Result<()> { self.request( ControlCmd::Start).await? }
    pub async fn stop (&self)->Result<()> { self.request( ControlCmd::Stop).await? }
    pub async fn reload (&self)->Result<()> { self.request( ControlCmd::Reload).await? }
    pub async fn status (&self)->Result<SchedulerStatus> { self.request( ControlCmd::Status).await }

    pub async fn terminate (&self)->Result<()> {
        self.tx.send( ControlCmd::Terminate).await.map_err( |_| op_failed!("scheduler task terminated"))
    }

    async fn request<T> (&self, cmd: impl FnOnce(oneshot::Sender<T>)->ControlCmd)->Result<T> {
        let (tx,rx) = oneshot::channel();
        self.tx.send( cmd(tx)).await.map_err( |_| op_failed!("scheduler task terminated"))?;
        rx.await.map_err( |_| op_failed!("scheduler task dropped request"))
    }
}

/// spawn the scheduler as a tokio task that ticks with the given interval. The task returns the
/// scheduler and router once it is terminated (or all handles are dropped)
pub fn spawn_scheduler<S,C> (scheduler: FixScheduler<S,C>, router: OutputRouter, tick_interval: Duration)
    -> (SchedulerHandle, JoinHandle<(FixScheduler<S,C>,OutputRouter)>)
    where S: SampleStore + 'static, C: WallClock + 'static
{
    let (tx,rx) = mpsc::channel(16);
    let join_handle = tokio::spawn( run_scheduler( scheduler, router, rx, tick_interval));
    (SchedulerHandle{tx}, join_handle)
}

async fn run_scheduler<S,C> (mut scheduler: FixScheduler<S,C>, mut router: OutputRouter, mut rx: mpsc::Receiver<ControlCmd>, tick_interval: Duration)
    -> (FixScheduler<S,C>,OutputRouter)
    where S: SampleStore, C: WallClock
{
    let mut interval = tokio::time::interval( tick_interval);
    interval.set_missed_tick_behavior( MissedTickBehavior::Delay); // no catch-up bursts after overruns

    loop {
        tokio::select! {
            biased;

            cmd = rx.recv() => {
                match cmd {
                    Some(ControlCmd::Start(reply)) => {
                        let was_running = scheduler.state() == SchedulerState::Running;
                        let res = scheduler.start();
                        if res.is_ok() && !was_running { interval.reset_immediately() } // first fix right away
                        let _ = reply.send( res);
                    }
                    Some(ControlCmd::Stop(reply)) => { let _ = reply.send( scheduler.stop()); }
                    Some(ControlCmd::Reload(reply)) => { let _ = reply.send( scheduler.reload()); }
                    Some(ControlCmd::Status(reply)) => {
                        let mut status = scheduler.status();
                        status.channels = router.channel_states();
                        status.router = Some( router.stats());
                        let _ = reply.send( status);
                    }
                    Some(ControlCmd::Terminate) | None => {
                        scheduler.stop().ok();
                        break
                    }
                }
            }

            _ = interval.tick() => {
                let t0 = Instant::now();
                scheduler.tick( &mut router).await;
                let elapsed = t0.elapsed();
                if elapsed > tick_interval {
                    warn!("tick overrun: cycle took {:?}", elapsed);
                }
            }
        }
    }

    info!("fix scheduler task terminated");
    (scheduler, router)
}

/* #endregion task driver */
