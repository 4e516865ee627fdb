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

//! sequential, restartable access to the position samples of a header-first CSV track store

use std::{fs::File, io::{self,Cursor,Read}, path::PathBuf, sync::{Arc,Mutex}};
use csv::{ReaderBuilder,StringRecord};

use crate::{info,warn,debug};
use crate::errors::{OdinGpsimError,Result};
use crate::sample::{PositionSample,TrackSchema};

/// where the bytes of a track store come from. The store itself is managed externally, we only read it
pub trait TrackSource: Send {
    type Reader: Read + Send;

    fn describe (&self)->String;
    fn is_present (&self)->bool;
    fn open (&self)->io::Result<Self::Reader>;
}

impl TrackSource for PathBuf {
    type Reader = File;

    fn describe (&self)->String { self.display().to_string() }
    fn is_present (&self)->bool { self.is_file() }
    fn open (&self)->io::Result<File> { File::open(self) }
}

/// a track store held in memory that can be replaced or removed at runtime (e.g. by an upload handler)
#[derive(Clone,Default)]
pub struct MemoryTrack {
    data: Arc<Mutex<Option<Vec<u8>>>>
}

impl MemoryTrack {
    pub fn new (data: impl Into<Vec<u8>>)->Self {
        MemoryTrack { data: Arc::new( Mutex::new( Some(data.into()))) }
    }

    pub fn replace (&self, data: impl Into<Vec<u8>>) {
        if let Ok(mut guard) = self.data.lock() { *guard = Some(data.into()) }
    }

    pub fn remove (&self) {
        if let Ok(mut guard) = self.data.lock() { *guard = None }
    }
}

impl TrackSource for MemoryTrack {
    type Reader = Cursor<Vec<u8>>;

    fn describe (&self)->String { "<memory>".to_string() }

    fn is_present (&self)->bool {
        self.data.lock().map( |guard| guard.is_some()).unwrap_or(false)
    }

    fn open (&self)->io::Result<Cursor<Vec<u8>>> {
        match self.data.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(data) => Ok( Cursor::new( data.clone())),
                None => Err( io::Error::new( io::ErrorKind::NotFound, "no track data"))
            }
            Err(_) => Err( io::Error::other( "track data lock poisoned"))
        }
    }
}

/// result of pulling the next record from a store
#[derive(Debug,Clone,PartialEq)]
pub enum Pull {
    Sample(PositionSample), // might be invalid if the record was malformed
    Exhausted
}

/// the narrow interface the fix scheduler uses to consume a track store
pub trait SampleStore: Send {
    /// position past the header and reset the record counter. Fails with `StoreUnavailable` if the
    /// store is missing or can't be read
    fn open (&mut self)->Result<()>;

    /// next record or `Pull::Exhausted` if there are no more records (or the store is not open)
    fn next_sample (&mut self)->Pull;

    /// go back to the first data record
    fn rewind (&mut self)->Result<()> { self.open() }

    /// check if the store could be opened right now. This does not change the read position
    fn is_available (&self)->bool;

    fn is_open (&self)->bool;

    /// number of data records read since the last open
    fn position (&self)->usize;

    fn describe (&self)->String;
}

pub struct CsvSampleStore<S> where S: TrackSource {
    source: S,
    reader: Option<csv::Reader<S::Reader>>,
    schema: Option<TrackSchema>,
    record: StringRecord,
    position: usize,
}

impl<S> CsvSampleStore<S> where S: TrackSource {
    pub fn new (source: S)->Self {
        CsvSampleStore { source, reader: None, schema: None, record: StringRecord::new(), position: 0 }
    }

    pub fn schema (&self)->Option<&TrackSchema> { self.schema.as_ref() }

    pub fn source (&self)->&S { &self.source }

    pub fn close (&mut self) {
        self.reader = None;
    }
}

impl CsvSampleStore<PathBuf> {
    pub fn from_path (path: impl Into<PathBuf>)->Self { CsvSampleStore::new( path.into()) }
}

impl<S> SampleStore for CsvSampleStore<S> where S: TrackSource {

    fn open (&mut self)->Result<()> {
        self.reader = None;
        self.position = 0;

        if !self.source.is_present() {
            return Err( OdinGpsimError::StoreUnavailable( format!("no track store {}", self.source.describe())))
        }
        let input = self.source.open()
            .map_err( |e| OdinGpsimError::StoreUnavailable( format!("failed to open {}: {}", self.source.describe(), e)))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)  // tolerate rows with missing or extra trailing columns
            .from_reader(input);

        let headers = reader.headers()
            .map_err( |e| OdinGpsimError::StoreUnavailable( format!("unreadable header in {}: {}", self.source.describe(), e)))?;
        let schema = TrackSchema::from_header( headers.iter())?;

        info!("opened track store {} with {} columns: {:?}", self.source.describe(), schema.n_columns, schema);
        self.schema = Some(schema);
        self.reader = Some(reader);
        Ok(())
    }

    fn next_sample (&mut self)->Pull {
        let (Some(reader), Some(schema)) = (self.reader.as_mut(), self.schema.as_ref()) else {
            return Pull::Exhausted
        };

        match reader.read_record( &mut self.record) {
            Ok(true) => {
                self.position += 1;
                let sample = schema.parse_record( self.record.iter(), self.position);
                if !sample.valid {
                    let e = OdinGpsimError::MalformedRecord{ line: self.position, msg: format!("no coordinates in {:?}", self.record) };
                    warn!("{} of {}", e, self.source.describe());
                }
                Pull::Sample(sample)
            }
            Ok(false) => {
                debug!("track store {} exhausted after {} records", self.source.describe(), self.position);
                Pull::Exhausted
            }
            Err(e) => {
                if e.is_io_error() {
                    warn!("read error in {}: {}", self.source.describe(), e);
                    self.reader = None;
                    Pull::Exhausted
                } else {
                    self.position += 1;
                    let e = OdinGpsimError::MalformedRecord{ line: self.position, msg: e.to_string() };
                    warn!("{} of {}", e, self.source.describe());
                    Pull::Sample( PositionSample::invalid( self.position))
                }
            }
        }
    }

    fn is_available (&self)->bool { self.source.is_present() }

    fn is_open (&self)->bool { self.reader.is_some() }

    fn position (&self)->usize { self.position }

    fn describe (&self)->String { self.source.describe() }
}
