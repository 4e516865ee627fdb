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

use std::{borrow::Cow, fmt};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};

use crate::errors::{OdinGpsimError,Result};

pub const DEFAULT_SATS: u32 = 4;
pub const DEFAULT_HDOP: f64 = 0.0;
pub const DEFAULT_COURSE: f64 = 0.0;
pub const DEFAULT_SPEED: f64 = 0.0;

// recognized header names (compared case-insensitive). The first entry is what the tracker app writes
const TIME_COLUMNS: &[&str] = &["UTC_time", "time", "timestamp"];
const COORDS_COLUMNS: &[&str] = &["coordinates", "coords", "position"];
const COURSE_COLUMNS: &[&str] = &["gps_course", "course", "cog"];
const SPEED_COLUMNS: &[&str] = &["gps_speed_knots", "speed_knots", "speed", "sog"];
const HDOP_COLUMNS: &[&str] = &["hdop"];
const SATS_COLUMNS: &[&str] = &["sats", "satellites", "num_sats"];

/// one record of the track store. Samples are created by the store reader and are immutable afterwards.
/// Only the coordinates decide validity - all other fields fall back to defaults if missing or unparsable
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct PositionSample {
    pub line: usize,                 // 1-based data record number within the store (0 if not from a store)
    pub source_time: Option<String>, // as stored, never used for emission
    pub latitude: f64,               // decimal degrees, positive north
    pub longitude: f64,              // decimal degrees, positive east
    pub sats: u32,
    pub hdop: f64,
    pub course: f64,                 // degrees [0,360)
    pub speed_knots: f64,
    pub valid: bool,
}

impl PositionSample {
    pub fn new (latitude: f64, longitude: f64)->Self {
        PositionSample {
            line: 0,
            source_time: None,
            latitude, longitude,
            sats: DEFAULT_SATS,
            hdop: DEFAULT_HDOP,
            course: DEFAULT_COURSE,
            speed_knots: DEFAULT_SPEED,
            valid: true
        }
    }

    pub fn invalid (line: usize)->Self {
        PositionSample { line, valid: false, ..PositionSample::new( 0.0, 0.0) }
    }

    pub fn with_sats (mut self, sats: u32)->Self { self.sats = sats; self }
    pub fn with_hdop (mut self, hdop: f64)->Self { self.hdop = hdop; self }
    pub fn with_course (mut self, course: f64)->Self { self.course = course; self }
    pub fn with_speed_knots (mut self, speed: f64)->Self { self.speed_knots = speed; self }
    pub fn with_line (mut self, line: usize)->Self { self.line = line; self }
}

impl fmt::Display for PositionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!( f, "PositionSample( line: {}, lat: {:.6}, lon: {:.6}, sats: {}, hdop: {:.2}, cog: {:.1}, sog: {:.3} )",
                    self.line, self.latitude, self.longitude, self.sats, self.hdop, self.course, self.speed_knots)
        } else {
            write!( f, "PositionSample( line: {}, invalid )", self.line)
        }
    }
}

/// the unit of emission - a sample stamped with the live clock. Re-derived on every tick
#[derive(Debug,Clone,Copy)]
pub struct Fix<'a> {
    pub sample: &'a PositionSample,
    pub time: DateTime<Utc>,
}

impl<'a> Fix<'a> {
    pub fn new (sample: &'a PositionSample, time: DateTime<Utc>)->Self { Fix { sample, time } }
}

/// column positions resolved once from the header line of the track store.
/// The store schema changes between tracker app versions so we never rely on fixed column indices
#[derive(Debug,Clone,PartialEq)]
pub struct TrackSchema {
    pub n_columns: usize,
    pub time: Option<usize>,
    pub coords: usize,
    pub course: Option<usize>,
    pub speed: Option<usize>,
    pub hdop: Option<usize>,
    pub sats: Option<usize>,
}

impl TrackSchema {
    pub fn from_header<'a,I> (header: I)->Result<Self> where I: IntoIterator<Item=&'a str> {
        let names: Vec<&str> = header.into_iter().map( |s| s.trim().trim_start_matches('\u{feff}')).collect();

        let coords = find_column( &names, COORDS_COLUMNS)
            .ok_or_else( || OdinGpsimError::StoreUnavailable( format!("no coordinates column in header {:?}", names)))?;

        Ok( TrackSchema {
            n_columns: names.len(),
            time: find_column( &names, TIME_COLUMNS),
            coords,
            course: find_column( &names, COURSE_COLUMNS),
            speed: find_column( &names, SPEED_COLUMNS),
            hdop: find_column( &names, HDOP_COLUMNS),
            sats: find_column( &names, SATS_COLUMNS),
        })
    }

    /// turn the raw fields of one data record into a sample. This never fails - records without
    /// parsable coordinates just produce invalid samples
    pub fn parse_record<'a,I> (&self, fields: I, line: usize)->PositionSample where I: IntoIterator<Item=&'a str> {
        let fields = merge_bracketed( fields, self.coords);
        let field = |idx: Option<usize>| {
            idx.and_then( |i| fields.get(i)).map( |s| s.trim()).filter( |s| !s.is_empty())
        };

        let Some((latitude,longitude)) = field( Some(self.coords)).and_then( parse_coordinates) else {
            return PositionSample::invalid( line)
        };

        let sats = match field( self.sats).and_then( |s| s.parse::<u32>().ok()) {
            Some(0) | None => DEFAULT_SATS,
            Some(n) => n.min(99) // two digit GGA field
        };

        PositionSample {
            line,
            source_time: field( self.time).map( |s| s.to_string()),
            latitude, longitude,
            sats,
            hdop: parse_f64( field( self.hdop)).map( |v| v.max(0.0) + 0.0).unwrap_or( DEFAULT_HDOP), // +0.0 clears a "-0" sign
            course: parse_f64( field( self.course)).map( |v| v.rem_euclid(360.0) + 0.0).unwrap_or( DEFAULT_COURSE),
            speed_knots: parse_f64( field( self.speed)).map( |v| v.max(0.0) + 0.0).unwrap_or( DEFAULT_SPEED),
            valid: true,
        }
    }
}

fn find_column (names: &[&str], candidates: &[&str])->Option<usize> {
    candidates.iter().find_map( |c| names.iter().position( |n| n.eq_ignore_ascii_case(c)))
}

fn parse_f64 (s: Option<&str>)->Option<f64> {
    s.and_then( |s| s.parse::<f64>().ok()).filter( |v| v.is_finite())
}

/// parse a "[lat, lon]" coordinate field (brackets are optional). Both components have to be present
pub fn parse_coordinates (s: &str)->Option<(f64,f64)> {
    let s = s.trim();
    let s = s.strip_prefix('[').unwrap_or(s);
    let s = s.strip_suffix(']').unwrap_or(s);

    let mut it = s.split(',');
    let lat = it.next()?.trim().parse::<f64>().ok().filter( |v| v.is_finite())?;
    let lon = it.next()?.trim().parse::<f64>().ok().filter( |v| v.is_finite())?;
    if it.next().is_some() { return None }

    Some((lat,lon))
}

/// re-join the bracketed coordinates field at index `coords` if it got split at its inner comma because it
/// was written without quotes. Other fields are passed through as they are
fn merge_bracketed<'a,I> (fields: I, coords: usize)->Vec<Cow<'a,str>> where I: IntoIterator<Item=&'a str> {
    let mut merged: Vec<Cow<'a,str>> = Vec::new();
    let mut open: Option<String> = None;

    for f in fields {
        if let Some(mut acc) = open.take() {
            acc.push(',');
            acc.push_str(f);
            if f.contains(']') {
                merged.push( Cow::Owned(acc));
            } else {
                open = Some(acc);
            }
        } else if merged.len() == coords && f.trim_start().starts_with('[') && !f.contains(']') {
            open = Some(f.to_string());
        } else {
            merged.push( Cow::Borrowed(f));
        }
    }
    if let Some(acc) = open { merged.push( Cow::Owned(acc)) } // unterminated - let coordinate parsing reject it

    merged
}
