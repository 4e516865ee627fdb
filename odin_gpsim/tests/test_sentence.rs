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

use chrono::{DateTime, TimeZone, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use odin_gpsim::{
    checksum,
    sample::{Fix, PositionSample},
    sentence::{self, CyclePart, CYCLE, DEFAULT_TEXT_MESSAGE, MAX_SENTENCE_LEN},
};

fn fix_time ()->DateTime<Utc> {
    Utc.with_ymd_and_hms( 2025, 7, 22, 12, 34, 56).unwrap()
}

/// decimal degrees from a "(d)ddmm.mmmmm" field and its hemisphere indicator
fn reconstruct (field: &str, hemi: &str, deg_digits: usize)->f64 {
    let d: f64 = field[..deg_digits].parse().unwrap();
    let m: f64 = field[deg_digits..].parse().unwrap();
    let v = d + m / 60.0;
    if hemi == "S" || hemi == "W" { -v } else { v }
}

#[test]
fn test_gga_scenario () {
    let sample = PositionSample::new( 51.459595, -0.547948).with_sats(6).with_hdop(2.3).with_course(45.0).with_speed_knots(0.1);
    let fix = Fix::new( &sample, fix_time());

    let gga = sentence::render( CyclePart::Gga, &fix, DEFAULT_TEXT_MESSAGE);
    println!("{gga}");
    assert!( gga.as_str().starts_with("$GNGGA,123456.00,5127.57570,N,00032.87688,W,1,6,2.30,"));
    assert_eq!( gga.as_str(), "$GNGGA,123456.00,5127.57570,N,00032.87688,W,1,6,2.30,56.3,M,46.9,M,,*52");
    assert!( checksum::verify( gga.as_str()).is_ok());

    let rmc = sentence::render( CyclePart::Rmc, &fix, DEFAULT_TEXT_MESSAGE);
    println!("{rmc}");
    assert_eq!( rmc.as_str(), "$GNRMC,123456.00,A,5127.57570,N,00032.87688,W,0.100,45.0,220725,,,A,V*16");

    let txt = sentence::render( CyclePart::Txt, &fix, DEFAULT_TEXT_MESSAGE);
    assert_eq!( txt.as_str(), "$GNTXT,01,01,01,ANTENNA OK*2B");
}

#[test]
fn test_cycle_order () {
    let sample = PositionSample::new( 37.4, -122.1);
    let fix = Fix::new( &sample, fix_time());
    let cycle = sentence::render_cycle( &fix, DEFAULT_TEXT_MESSAGE);

    let tags: Vec<&str> = cycle.iter().map( |s| s.tag()).collect();
    assert_eq!( tags, vec!["GNRMC","GNGGA","GNGSA","GNGSA","GPGSV","GPGSV","BDGSV","GNTXT"]);
    assert_eq!( cycle.len(), CYCLE.len());

    for s in &cycle {
        println!("{s}");
        assert_eq!( sentence::validate( s.as_str()).unwrap(), s.tag());
    }
}

#[test]
fn test_coordinate_reconstruction () {
    let mut rng = StdRng::seed_from_u64( 4711);
    let time = fix_time();

    for _ in 0..10_000 {
        let lat: f64 = rng.random_range( -90.0..=90.0);
        let lon: f64 = rng.random_range( -180.0..=180.0);
        let sample = PositionSample::new( lat, lon);
        let gga = sentence::gga_body( &Fix::new( &sample, time));

        let fields: Vec<&str> = gga.split(',').collect();
        assert_eq!( fields[2].len(), 10, "lat field {}", fields[2]); // ddmm.mmmmm
        assert_eq!( fields[4].len(), 11, "lon field {}", fields[4]); // dddmm.mmmmm

        let lat1 = reconstruct( fields[2], fields[3], 2);
        let lon1 = reconstruct( fields[4], fields[5], 3);
        assert!( (lat1 - lat).abs() <= 1e-5, "lat {lat} -> {}", fields[2]);
        assert!( (lon1 - lon).abs() <= 1e-5, "lon {lon} -> {}", fields[4]);
    }
}

#[test]
fn test_random_samples_validate () {
    let mut rng = StdRng::seed_from_u64( 1);

    for i in 0..2000 {
        let sample = PositionSample::new( rng.random_range( -90.0..=90.0), rng.random_range( -180.0..=180.0))
            .with_sats( rng.random_range( 1..=24))
            .with_hdop( rng.random_range( 0.0..50.0))
            .with_course( rng.random_range( 0.0..360.0))
            .with_speed_knots( rng.random_range( 0.0..500.0));
        let time = fix_time() + chrono::Duration::seconds( i * 3607);
        let fix = Fix::new( &sample, time);

        for s in sentence::render_cycle( &fix, DEFAULT_TEXT_MESSAGE) {
            assert!( s.as_str().len() <= MAX_SENTENCE_LEN, "too long: {s}");
            if let Err(e) = sentence::validate( s.as_str()) {
                panic!("{s} failed: {e}");
            }
        }
    }
}

#[test]
fn test_edge_values () {
    let time = fix_time();

    // course that would round up to 360.0
    let sample = PositionSample::new( 0.0, 0.0).with_course( 359.97);
    let rmc = sentence::rmc_body( &Fix::new( &sample, time));
    println!("{rmc}");
    assert!( rmc.contains(",0.0,220725,"));

    // minute fraction that would round up to 60
    let sample = PositionSample::new( 9.9999999999, -179.9999999999);
    let gga = sentence::gga_body( &Fix::new( &sample, time));
    println!("{gga}");
    assert!( gga.contains(",1000.00000,N,18000.00000,W,"));

    // year rollover of the date field
    let t = Utc.with_ymd_and_hms( 2100, 1, 2, 0, 0, 0).unwrap();
    let rmc = sentence::rmc_body( &Fix::new( &sample, t));
    assert!( rmc.contains(",020100,"));
}

#[test]
fn test_validate_rejects () {
    assert!( sentence::validate( "$GNXXX,1,2*41").is_err());
    assert!( sentence::validate( &checksum::finalize( "$GNGGA,123456.00,5127.5757,N,00032.87688,W,1,6,2.30,56.3,M,46.9,M,,")).is_err());
    assert!( sentence::validate( &checksum::finalize( "$GNTXT,1,1,01,ANTENNA OK")).is_err());
}
