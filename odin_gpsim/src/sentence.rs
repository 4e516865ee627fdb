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

//! rendering of fixes into the ordered NMEA 0183 sentence cycle of a u-blox NEO-6M class receiver

use std::fmt::{self,Write};
use chrono::{DateTime,Datelike,Timelike,Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::checksum::{self,append_checksum};
use crate::errors::{Result,format_error};
use crate::sample::Fix;

/// max NMEA sentence length (without CR/LF) is 82 - we never produce more
pub const MAX_SENTENCE_LEN: usize = 82;

pub const DEFAULT_TEXT_MESSAGE: &str = "ANTENNA OK";

/// longest text that still fits into a single "$GNTXT,01,01,01,<text>*hh" sentence
pub const MAX_TEXT_LEN: usize = MAX_SENTENCE_LEN - 19;

// placeholder satellite geometry as observed from the reference receiver. Our samples
// only carry aggregate sat count and hdop, which go into GGA
const GSA_GPS_BODY: &str = "$GNGSA,A,3,01,02,04,31,,,,,,,,,6.27,4.89,3.92,1";
const GSA_BDS_BODY: &str = "$GNGSA,A,3,,,,,,,,,,,,,6.27,4.89,3.92,4";
const GPGSV_1_BODY: &str = "$GPGSV,2,1,05,01,57,120,12,02,28,127,27,04,43,173,23,17,,,21";
const GPGSV_2_BODY: &str = "$GPGSV,2,2,05,31,17,085,30";
const BDGSV_BODY: &str = "$BDGSV,1,1,00";

// fixed (non-position) parts of RMC and GGA
const RMC_TAIL: &str = ",,,A,V";             // no magnetic variation, mode A, nav status V
const GGA_ALTITUDE: &str = "56.3,M,46.9,M,,"; // MSL altitude, geoid separation, no DGPS

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum NumFormat {
    Fp1, Fp2, Fp3
}

impl NumFormat {
    fn scale (self)->f64 {
        match self {
            NumFormat::Fp1 => 10.0,
            NumFormat::Fp2 => 100.0,
            NumFormat::Fp3 => 1000.0,
        }
    }
}

/// the positions within a cycle. The order of `CYCLE` is fixed and must not vary
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize)]
pub enum CyclePart {
    Rmc,
    Gga,
    GsaGps,
    GsaBeidou,
    GpGsv1,
    GpGsv2,
    BdGsv,
    Txt
}

pub const CYCLE: [CyclePart;8] = [
    CyclePart::Rmc, CyclePart::Gga,
    CyclePart::GsaGps, CyclePart::GsaBeidou,
    CyclePart::GpGsv1, CyclePart::GpGsv2,
    CyclePart::BdGsv,
    CyclePart::Txt
];

impl CyclePart {
    pub fn tag (&self)->&'static str {
        match self {
            CyclePart::Rmc => "GNRMC",
            CyclePart::Gga => "GNGGA",
            CyclePart::GsaGps | CyclePart::GsaBeidou => "GNGSA",
            CyclePart::GpGsv1 | CyclePart::GpGsv2 => "GPGSV",
            CyclePart::BdGsv => "BDGSV",
            CyclePart::Txt => "GNTXT",
        }
    }
}

/// a complete sentence including checksum but without the CR/LF terminator. Immutable once built
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Sentence {
    part: CyclePart,
    text: String,
}

impl Sentence {
    pub fn part (&self)->CyclePart { self.part }
    pub fn tag (&self)->&'static str { self.part.tag() }
    pub fn as_str (&self)->&str { self.text.as_str() }
    pub fn as_bytes (&self)->&[u8] { self.text.as_bytes() }
    pub fn into_string (self)->String { self.text }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str( &self.text)
    }
}

/// builds one sentence in a single pre-sized buffer. Fields are appended with explicit formatting calls
pub struct SentenceWriter {
    buf: String
}

impl SentenceWriter {
    pub fn new (tag: &str)->Self {
        let mut buf = String::with_capacity( MAX_SENTENCE_LEN + 2);
        buf.push( checksum::START_MARKER as char);
        buf.push_str( tag);
        SentenceWriter { buf }
    }

    pub fn as_str (&self)->&str { self.buf.as_str() }

    /// the body without checksum
    pub fn into_body (self)->String { self.buf }

    pub fn write_str_field (&mut self, value: &str) {
        self.buf.push(',');
        self.buf.push_str( value);
    }

    /// append raw (possibly multi-field) text without separator
    pub fn write_raw (&mut self, s: &str) {
        self.buf.push_str( s);
    }

    pub fn write_u32_field (&mut self, value: u32) {
        let _ = write!( self.buf, ",{}", value);
    }

    pub fn write_f64_field (&mut self, value: f64, fmt: NumFormat) {
        // anything that rounds to zero is written unsigned ("-0.0" is not a valid field)
        let value = if (value * fmt.scale()).round() == 0.0 { 0.0 } else { value };
        let _ = match fmt {
            NumFormat::Fp1 => write!( self.buf, ",{:.1}", value),
            NumFormat::Fp2 => write!( self.buf, ",{:.2}", value),
            NumFormat::Fp3 => write!( self.buf, ",{:.3}", value),
        };
    }

    /// hhmmss.00 - receivers report whole seconds
    pub fn write_time_field (&mut self, time: &DateTime<Utc>) {
        let _ = write!( self.buf, ",{:02}{:02}{:02}.00", time.hour(), time.minute(), time.second());
    }

    /// ddmmyy
    pub fn write_date_field (&mut self, time: &DateTime<Utc>) {
        let _ = write!( self.buf, ",{:02}{:02}{:02}", time.day(), time.month(), time.year().rem_euclid(100));
    }

    /// ddmm.mmmmm,N|S
    pub fn write_latitude_fields (&mut self, lat: f64) {
        self.write_angle( lat, 2);
        self.buf.push_str( if lat >= 0.0 { ",N" } else { ",S" });
    }

    /// dddmm.mmmmm,E|W
    pub fn write_longitude_fields (&mut self, lon: f64) {
        self.write_angle( lon, 3);
        self.buf.push_str( if lon >= 0.0 { ",E" } else { ",W" });
    }

    fn write_angle (&mut self, deg: f64, deg_digits: usize) {
        let (d, m, mfrac) = to_degrees_minutes( deg);
        let _ = write!( self.buf, ",{:0w$}{:02}.{:05}", d, m, mfrac, w = deg_digits);
    }

    pub fn finish (mut self, part: CyclePart)->Sentence {
        append_checksum( &mut self.buf);
        Sentence { part, text: self.buf }
    }
}

/// split |deg| into whole degrees, whole minutes and minute fraction in units of 1e-5 minutes.
/// Minutes are rounded to 5 decimals before splitting so that we never render "60.00000"
pub fn to_degrees_minutes (deg: f64)->(u64,u64,u64) {
    let units = (deg.abs() * 60.0 * 100_000.0).round() as u64; // 1e-5 minutes
    let units_per_deg = 60 * 100_000;

    let d = units / units_per_deg;
    let rem = units % units_per_deg;
    (d, rem / 100_000, rem % 100_000)
}

// keep the rendered course within [0,360) after rounding to one decimal
fn course_1dp (course: f64)->f64 {
    if (course * 10.0).round() >= 3600.0 { 0.0 } else { course }
}

//--- the per-sentence render functions. They return the body (no checksum)

pub fn rmc_body (fix: &Fix)->String {
    let s = fix.sample;
    let mut w = SentenceWriter::new( CyclePart::Rmc.tag());
    w.write_time_field( &fix.time);
    w.write_str_field( "A");
    w.write_latitude_fields( s.latitude);
    w.write_longitude_fields( s.longitude);
    w.write_f64_field( s.speed_knots, NumFormat::Fp3);
    w.write_f64_field( course_1dp( s.course), NumFormat::Fp1);
    w.write_date_field( &fix.time);
    w.write_raw( RMC_TAIL);
    w.into_body()
}

pub fn gga_body (fix: &Fix)->String {
    let s = fix.sample;
    let mut w = SentenceWriter::new( CyclePart::Gga.tag());
    w.write_time_field( &fix.time);
    w.write_latitude_fields( s.latitude);
    w.write_longitude_fields( s.longitude);
    w.write_str_field( "1"); // GPS fix
    w.write_u32_field( s.sats);
    w.write_f64_field( s.hdop, NumFormat::Fp2);
    w.write_str_field( GGA_ALTITUDE);
    w.into_body()
}

pub fn gsa_gps_body ()->String { GSA_GPS_BODY.to_string() }
pub fn gsa_beidou_body ()->String { GSA_BDS_BODY.to_string() }
pub fn gpgsv_1_body ()->String { GPGSV_1_BODY.to_string() }
pub fn gpgsv_2_body ()->String { GPGSV_2_BODY.to_string() }
pub fn bdgsv_body ()->String { BDGSV_BODY.to_string() }

pub fn txt_body (text: &str)->String {
    let mut w = SentenceWriter::new( CyclePart::Txt.tag());
    w.write_raw( ",01,01,01");
    w.write_str_field( text);
    w.into_body()
}

/// render one cycle position for the given fix, including checksum
pub fn render (part: CyclePart, fix: &Fix, text: &str)->Sentence {
    let body = match part {
        CyclePart::Rmc => rmc_body( fix),
        CyclePart::Gga => gga_body( fix),
        CyclePart::GsaGps => gsa_gps_body(),
        CyclePart::GsaBeidou => gsa_beidou_body(),
        CyclePart::GpGsv1 => gpgsv_1_body(),
        CyclePart::GpGsv2 => gpgsv_2_body(),
        CyclePart::BdGsv => bdgsv_body(),
        CyclePart::Txt => txt_body( text),
    };
    SentenceWriter { buf: body }.finish( part)
}

/// render the full cycle at once. The scheduler renders part by part so that each sentence is
/// routed before the next one is built, this is for tools and tests
pub fn render_cycle (fix: &Fix, text: &str)->Vec<Sentence> {
    CYCLE.iter().map( |part| render( *part, fix, text)).collect()
}

/* #region validation ********************************************************************************/

lazy_static! {
    static ref RMC_RE: Regex = Regex::new( r"^\$GNRMC,\d{6}\.\d{2},[AV],\d{4}\.\d{5},[NS],\d{5}\.\d{5},[EW],\d+\.\d{3},\d+\.\d,\d{6},[^,]*,[^,]*,[ADEN],[AV]$").unwrap();
    static ref GGA_RE: Regex = Regex::new( r"^\$GNGGA,\d{6}\.\d{2},\d{4}\.\d{5},[NS],\d{5}\.\d{5},[EW],[0-8],\d{1,2},\d+\.\d{2},-?\d+\.\d*,M,-?\d+\.\d*,M,[^,]*,[^,]*$").unwrap();
    static ref GSA_RE: Regex = Regex::new( r"^\$GNGSA,[AM],[123],(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),(\d{2}|),\d+\.\d*,\d+\.\d*,\d+\.\d*,[1-4]$").unwrap();
    static ref GSV_RE: Regex = Regex::new( r"^\$(GP|BD|GL|GA)GSV,[1-4],[1-4],\d{2}(,\d{2},\d*,\d*,\d*){0,4}$").unwrap();
    static ref TXT_RE: Regex = Regex::new( r"^\$GNTXT,\d{2},\d{2},\d{2},[^*]*$").unwrap();
}

/// check checksum and field structure of a complete sentence. Returns the sentence tag if valid
pub fn validate (sentence: &str)->Result<&str> {
    checksum::verify( sentence)?;
    let (body,_) = checksum::split_sentence( sentence)?;

    let tag = body.get(1..6).ok_or_else( || format_error!("sentence too short: {}", body))?;
    let re: &Regex = match tag {
        "GNRMC" => &RMC_RE,
        "GNGGA" => &GGA_RE,
        "GNGSA" => &GSA_RE,
        "GPGSV" | "BDGSV" | "GLGSV" | "GAGSV" => &GSV_RE,
        "GNTXT" => &TXT_RE,
        _ => return Err( format_error!("unknown sentence tag {}", tag))
    };

    if body.len() + 3 > MAX_SENTENCE_LEN {
        return Err( format_error!("sentence exceeds {} chars: {}", MAX_SENTENCE_LEN, body))
    }
    if re.is_match( body) { Ok(tag) } else { Err( format_error!("invalid {} fields: {}", tag, body)) }
}

/* #endregion validation */
