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

use std::{collections::BTreeMap, fs::File, io::{self,BufRead,BufReader}, path::PathBuf};
use anyhow::{Result,bail};
use clap::Parser;
use lazy_static::lazy_static;
use odin_gpsim::{OdinGpsimError, sentence::{self,CYCLE}};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "validate checksums, field structure and cadence of a captured NMEA stream")]
struct Args {
    /// print each invalid line
    #[arg(short,long)]
    verbose: bool,

    /// capture file to read, stdin if omitted
    path: Option<PathBuf>,
}

lazy_static! { static ref ARGS: Args = Args::parse(); }

#[derive(Default)]
struct StreamStats {
    verbose: bool,
    n_lines: usize,
    tags: BTreeMap<String,usize>,
    checksum_errors: usize,
    format_errors: usize,

    rmc_secs: Vec<u32>,       // RMC time of day
    cycle_lens: Vec<usize>,   // number of sentences from one RMC to the next
    n_in_cycle: Option<usize>,
}

impl StreamStats {
    fn new (verbose: bool)->Self {
        StreamStats { verbose, ..StreamStats::default() }
    }

    fn add_line (&mut self, line: &str) {
        self.n_lines += 1;

        match sentence::validate( line) {
            Ok(tag) => {
                *self.tags.entry( tag.to_string()).or_insert(0) += 1;
                if tag == "GNRMC" {
                    if let Some(n) = self.n_in_cycle { self.cycle_lens.push(n) }
                    self.n_in_cycle = Some(1);
                    if let Some(secs) = rmc_secs( line) { self.rmc_secs.push( secs) }
                } else if let Some(n) = self.n_in_cycle.as_mut() {
                    *n += 1;
                }
            }
            Err(e) => {
                if matches!( e, OdinGpsimError::ChecksumError{..}) { self.checksum_errors += 1 } else { self.format_errors += 1 }
                if self.verbose { println!("line {}: {}", self.n_lines, e) }
            }
        }
    }

    /// a line that is not valid UTF-8 (garbled serial capture) counts as format error
    fn add_undecodable (&mut self, line: &[u8]) {
        self.n_lines += 1;
        self.format_errors += 1;
        if self.verbose { println!("line {}: not UTF-8: {}", self.n_lines, String::from_utf8_lossy( line).trim_end()) }
    }

    fn print (&self) {
        println!("lines:           {}", self.n_lines);
        for (tag,n) in &self.tags {
            println!("  {tag}: {n}");
        }
        println!("checksum errors: {}", self.checksum_errors);
        println!("format errors:   {}", self.format_errors);

        let n_short = self.cycle_lens.iter().filter( |n| **n != CYCLE.len()).count();
        println!("cycles:          {} ({} incomplete)", self.cycle_lens.len(), n_short);

        let mut steps: BTreeMap<i64,usize> = BTreeMap::new();
        for w in self.rmc_secs.windows(2) {
            let dt = (w[1] as i64 - w[0] as i64).rem_euclid( 86_400); // day rollover
            *steps.entry(dt).or_insert(0) += 1;
        }
        println!("RMC time steps:");
        for (dt,n) in &steps {
            println!("  {dt}s: {n}");
        }
    }

    fn n_errors (&self)->usize { self.checksum_errors + self.format_errors }
}

/// time of day in seconds from the hhmmss.ss field of a RMC sentence
fn rmc_secs (line: &str)->Option<u32> {
    let t = line.split(',').nth(1)?;
    let h: u32 = t.get(0..2)?.parse().ok()?;
    let m: u32 = t.get(2..4)?.parse().ok()?;
    let s: u32 = t.get(4..6)?.parse().ok()?;
    Some( h * 3600 + m * 60 + s)
}

/// feed all non-empty lines of `reader` into `stats`. Only read errors abort
fn read_stream<R: BufRead> (mut reader: R, stats: &mut StreamStats)->io::Result<()> {
    let mut buf: Vec<u8> = Vec::with_capacity( 128);
    loop {
        buf.clear();
        if reader.read_until( b'\n', &mut buf)? == 0 { break }

        match std::str::from_utf8( &buf) {
            Ok(line) => {
                let line = line.trim_end_matches( ['\r','\n']);
                if !line.is_empty() {
                    stats.add_line( line);
                }
            }
            Err(_) => stats.add_undecodable( &buf)
        }
    }
    Ok(())
}

fn main()->Result<()> {
    let reader: Box<dyn BufRead> = match &ARGS.path {
        Some(path) => Box::new( BufReader::new( File::open( path)?)),
        None => Box::new( BufReader::new( io::stdin()))
    };

    let mut stats = StreamStats::new( ARGS.verbose);
    read_stream( reader, &mut stats)?;
    stats.print();

    if stats.n_errors() > 0 {
        bail!("{} invalid sentences", stats.n_errors())
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use odin_gpsim::sample::{Fix, PositionSample};

    #[test]
    fn test_undecodable_line () {
        let sample = PositionSample::new( 51.459595, -0.547948);
        let fix = Fix::new( &sample, Utc.with_ymd_and_hms( 2025, 7, 22, 12, 34, 56).unwrap());

        let mut data: Vec<u8> = Vec::new();
        for s in sentence::render_cycle( &fix, sentence::DEFAULT_TEXT_MESSAGE) {
            data.extend_from_slice( s.as_str().as_bytes());
            data.extend_from_slice( b"\r\n");
        }
        data.extend_from_slice( b"$GNTXT,01,01,01,\xff\xfe*00\r\n"); // line noise
        data.extend_from_slice( b"$GNRMC,123457.00\r\n");

        let mut stats = StreamStats::new( false);
        read_stream( io::Cursor::new( data), &mut stats).unwrap();

        assert_eq!( stats.n_lines, 10);  // reading did not stop at the garbled line
        assert_eq!( stats.format_errors, 2);
        assert_eq!( stats.checksum_errors, 0);
        assert_eq!( stats.tags.get("GNRMC"), Some(&1));
        assert_eq!( stats.tags.get("GNTXT"), Some(&1));
    }
}
