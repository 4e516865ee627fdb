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

use std::{fs, path::PathBuf};
use odin_gpsim::{
    sample::{Fix, PositionSample, TrackSchema, DEFAULT_SATS},
    sentence,
    store::{CsvSampleStore, MemoryTrack, Pull, SampleStore},
};

const TRACK: &str = "\
UTC_time,coordinates,gps_course,gps_speed_knots,hdop,sats
17:07:30,\"[51.459595, -0.547948]\",45.0,0.1,2.3,6
17:07:31,\"[51.459600, -0.547900]\",46.5,0.2,2.1,0
17:07:32,,47.0,0.3,2.0,7
17:07:33,\"[51.459700, -0.547800]\",,,,
";

fn pull_all<S: SampleStore> (store: &mut S)->Vec<PositionSample> {
    let mut samples = Vec::new();
    while let Pull::Sample(s) = store.next_sample() {
        samples.push(s);
    }
    samples
}

#[test]
fn test_read_track () {
    let mut store = CsvSampleStore::new( MemoryTrack::new( TRACK));
    store.open().unwrap();
    assert!( store.is_open());

    let samples = pull_all( &mut store);
    for s in &samples { println!("{s}") }
    assert_eq!( samples.len(), 4);
    assert_eq!( store.position(), 4);

    let s = &samples[0];
    assert!( s.valid);
    assert_eq!( s.line, 1);
    assert_eq!( s.source_time.as_deref(), Some("17:07:30"));
    assert_eq!( (s.latitude, s.longitude), (51.459595, -0.547948));
    assert_eq!( s.sats, 6);
    assert_eq!( s.hdop, 2.3);
    assert_eq!( s.course, 45.0);
    assert_eq!( s.speed_knots, 0.1);

    assert_eq!( samples[1].sats, DEFAULT_SATS); // explicit 0
    assert!( !samples[2].valid);                // no coordinates
    assert_eq!( samples[2].line, 3);

    let s = &samples[3];                        // only coordinates
    assert!( s.valid);
    assert_eq!( (s.sats, s.hdop, s.course, s.speed_knots), (DEFAULT_SATS, 0.0, 0.0, 0.0));

    assert_eq!( store.next_sample(), Pull::Exhausted); // stays exhausted
}

#[test]
fn test_column_order_and_extra_columns () {
    let track = "\
sats,extra,coordinates,time,hdop,gps_speed_knots,gps_course,battery
9,x,\"[10.5, 20.25]\",12:00:00,1.5,3.25,270.0,87
";
    let mut store = CsvSampleStore::new( MemoryTrack::new( track));
    store.open().unwrap();

    let schema = store.schema().unwrap();
    println!("{schema:?}");
    assert_eq!( schema.coords, 2);
    assert_eq!( schema.sats, Some(0));

    let samples = pull_all( &mut store);
    assert_eq!( samples.len(), 1);
    let s = &samples[0];
    assert_eq!( (s.latitude, s.longitude, s.sats, s.hdop, s.speed_knots, s.course), (10.5, 20.25, 9, 1.5, 3.25, 270.0));
}

#[test]
fn test_unquoted_brackets () {
    // coordinate field written without quotes gets split at the inner comma
    let track = "\
UTC_time,coordinates,gps_course,gps_speed_knots,hdop,sats
17:07:30,[51.459595, -0.547948],45.0,0.1,2.3,6
";
    let mut store = CsvSampleStore::new( MemoryTrack::new( track));
    store.open().unwrap();

    let samples = pull_all( &mut store);
    let s = &samples[0];
    println!("{s}");
    assert!( s.valid);
    assert_eq!( (s.latitude, s.longitude, s.course, s.sats), (51.459595, -0.547948, 45.0, 6));
}

#[test]
fn test_free_text_column () {
    // an unterminated '[' in another column must not swallow the fields after it
    let track = "\
UTC_time,comment,coordinates,gps_course,remark,sats
17:07:30,[unclosed note,[51.459595, -0.547948],45.0,[draft,7
";
    let mut store = CsvSampleStore::new( MemoryTrack::new( track));
    store.open().unwrap();

    let samples = pull_all( &mut store);
    let s = &samples[0];
    println!("{s}");
    assert!( s.valid);
    assert_eq!( (s.latitude, s.longitude, s.course, s.sats), (51.459595, -0.547948, 45.0, 7));
}

#[test]
fn test_negative_zero_fields () {
    let track = "\
UTC_time,coordinates,gps_course,gps_speed_knots,hdop,sats
17:07:30,\"[51.459595, -0.547948]\",-0.0,-0,-0.0,6
";
    let mut store = CsvSampleStore::new( MemoryTrack::new( track));
    store.open().unwrap();

    let samples = pull_all( &mut store);
    let fix = Fix::new( &samples[0], chrono::Utc::now());
    for s in sentence::render_cycle( &fix, sentence::DEFAULT_TEXT_MESSAGE) {
        println!("{}", s.as_str());
        assert!( !s.as_str().contains(",-0."), "signed zero in {}", s.as_str());
        assert!( sentence::validate( s.as_str()).is_ok(), "invalid {}", s.as_str());
    }
}

#[test]
fn test_rewind () {
    let mut store = CsvSampleStore::new( MemoryTrack::new( TRACK));
    store.open().unwrap();
    let first = pull_all( &mut store);

    store.rewind().unwrap();
    assert_eq!( store.position(), 0);
    let second = pull_all( &mut store);
    assert_eq!( first, second);
}

#[test]
fn test_unavailable () {
    let track = MemoryTrack::new( TRACK);
    let mut store = CsvSampleStore::new( track.clone());
    assert!( store.is_available());

    track.remove();
    assert!( !store.is_available());
    let e = store.open().unwrap_err();
    println!("{e}");
    assert!( e.is_store_unavailable());
    assert_eq!( store.next_sample(), Pull::Exhausted);

    let mut store = CsvSampleStore::from_path( "/this/does/not/exist.csv");
    assert!( store.open().unwrap_err().is_store_unavailable());

    // header without coordinates column
    let mut store = CsvSampleStore::new( MemoryTrack::new( "time,lat,lon\n1,2,3\n"));
    assert!( store.open().unwrap_err().is_store_unavailable());
}

#[test]
fn test_file_store () {
    let path: PathBuf = std::env::temp_dir().join( format!("odin_gpsim_track_{}.csv", std::process::id()));
    fs::write( &path, TRACK).unwrap();

    let mut store = CsvSampleStore::from_path( &path);
    store.open().unwrap();
    assert_eq!( pull_all( &mut store).len(), 4);

    fs::remove_file( &path).unwrap();
    assert!( !store.is_available());
    assert!( store.rewind().unwrap_err().is_store_unavailable());
}

#[test]
fn test_schema_header_names () {
    let schema = TrackSchema::from_header( ["\u{feff}Timestamp", " COORDS ", "COG", "sog"]).unwrap();
    assert_eq!( schema.time, Some(0));
    assert_eq!( schema.coords, 1);
    assert_eq!( schema.course, Some(2));
    assert_eq!( schema.speed, Some(3));
    assert_eq!( schema.hdop, None);
}
