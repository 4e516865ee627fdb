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

use rand::{Rng, SeedableRng, rngs::StdRng};
use odin_gpsim::{OdinGpsimError, checksum::{self, checksum, finalize, split_sentence, verify}};

/// run with "cargo test --test test_checksum -- --nocapture"

fn random_body (rng: &mut StdRng)->String {
    let len = rng.random_range( 1..70);
    let mut body = String::from("$");
    for _ in 0..len {
        let c = loop {
            let c = rng.random_range( 0x20u8..0x7f) as char;
            if c != '$' && c != '*' { break c }
        };
        body.push(c);
    }
    body
}

#[test]
fn test_round_trip () {
    let mut rng = StdRng::seed_from_u64( 42);

    for _ in 0..5000 {
        let body = random_body( &mut rng);
        let sentence = finalize( &body);

        let (b, cs) = split_sentence( &sentence).unwrap();
        assert_eq!( b, body);
        assert_eq!( checksum( b), cs);

        let hex = &sentence[sentence.len()-2..];
        assert!( hex.bytes().all( |c| c.is_ascii_digit() || (b'A'..=b'F').contains(&c)), "not uppercase hex: {sentence}");
        assert!( verify( &sentence).is_ok());
    }
}

#[test]
fn test_known_sentences () {
    let s = finalize( "$GNGGA,123456.00,5127.57570,N,00032.87688,W,1,6,2.30,56.3,M,46.9,M,,");
    println!("{s}");
    assert!( s.ends_with("*52"));

    // a marker in front does not change the sum
    assert_eq!( checksum( "$GNTXT,01,01,01,ANTENNA OK"), checksum( "GNTXT,01,01,01,ANTENNA OK"));
    assert_eq!( finalize( "$GNTXT,01,01,01,ANTENNA OK"), "$GNTXT,01,01,01,ANTENNA OK*2B");
}

#[test]
fn test_verify_terminated_line () {
    assert!( verify( "$GNTXT,01,01,01,ANTENNA OK*2B\r\n").is_ok());
}

#[test]
fn test_reject_corrupted () {
    match verify( "$GNTXT,01,01,01,ANTENNA OX*2B") {
        Err(OdinGpsimError::ChecksumError{expected,actual}) => {
            println!("expected {expected:02X}, got {actual:02X}");
            assert_eq!( expected, 0x2b);
            assert_ne!( actual, expected);
        }
        other => panic!("unexpected result {other:?}")
    }

    assert!( matches!( verify( "GNTXT,01,01,01,ANTENNA OK*2B"), Err(OdinGpsimError::FormatError(_)))); // no '$'
    assert!( matches!( verify( "$GNTXT,01,01,01,ANTENNA OK*2b"), Err(OdinGpsimError::FormatError(_)))); // lowercase
    assert!( matches!( verify( "$GNTXT,01,01,01,ANTENNA OK*B"), Err(OdinGpsimError::FormatError(_))));
    assert!( matches!( verify( "$GNTXT,01,01,01,ANTENNA OK"), Err(OdinGpsimError::FormatError(_))));
}

#[test]
fn test_append_in_place () {
    let mut buf = String::from("$AA");
    checksum::append_checksum( &mut buf);
    assert_eq!( buf, "$AA*00");
}
