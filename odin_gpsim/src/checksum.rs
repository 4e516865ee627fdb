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

//! NMEA 0183 integrity checksum: XOR over all bytes between the '$' start marker and the '*' delimiter

use crate::errors::{OdinGpsimError,Result,format_error};

pub const START_MARKER: u8 = b'$';
pub const CHECKSUM_DELIMITER: u8 = b'*';

const HEX_DIGITS: &[u8;16] = b"0123456789ABCDEF";

/// XOR-fold the body. A leading start marker is skipped, folding stops at a checksum delimiter
pub fn checksum (body: &str)->u8 {
    let bytes = body.as_bytes();
    let bytes = bytes.strip_prefix( &[START_MARKER]).unwrap_or(bytes);

    bytes.iter()
        .take_while( |b| **b != CHECKSUM_DELIMITER)
        .fold( 0u8, |acc, b| acc ^ b)
}

/// append the delimiter and the checksum as exactly two uppercase hex digits
pub fn finalize (body: &str)->String {
    let mut s = String::with_capacity( body.len() + 3);
    s.push_str( body);
    append_checksum( &mut s);
    s
}

/// in-place version of `finalize` for sentences that are assembled in a reused buffer
pub fn append_checksum (buf: &mut String) {
    let cs = checksum( buf.as_str());
    buf.push( CHECKSUM_DELIMITER as char);
    buf.push( HEX_DIGITS[(cs >> 4) as usize] as char);
    buf.push( HEX_DIGITS[(cs & 0x0f) as usize] as char);
}

/// split a complete sentence (optionally CR/LF terminated) into body and transmitted checksum
pub fn split_sentence (sentence: &str)->Result<(&str,u8)> {
    let sentence = sentence.trim_end_matches( ['\r','\n']);

    if !sentence.starts_with( START_MARKER as char) {
        return Err( format_error!("sentence does not start with '$': {}", sentence))
    }
    let Some(idx) = sentence.rfind( CHECKSUM_DELIMITER as char) else {
        return Err( format_error!("no checksum delimiter in: {}", sentence))
    };

    let hex = &sentence[idx+1..];
    if hex.len() != 2 || !hex.bytes().all( |b| HEX_DIGITS.contains(&b)) {
        return Err( format_error!("checksum is not two uppercase hex digits: '{}'", hex))
    }
    let cs = u8::from_str_radix( hex, 16).map_err( |e| format_error!("invalid checksum '{}': {}", hex, e))?;

    Ok( (&sentence[..idx], cs) )
}

/// re-compute the checksum of a complete sentence and compare with the transmitted value
pub fn verify (sentence: &str)->Result<()> {
    let (body,expected) = split_sentence( sentence)?;
    let actual = checksum( body);

    if actual == expected { Ok(()) } else { Err( OdinGpsimError::ChecksumError{ expected, actual }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_checksum () {
        // reference sentence from a u-blox receiver
        let s = finalize( "$GNTXT,01,01,02,upcounting timer is at 1");
        assert!( s.ends_with("*0C"), "got {s}");
    }

    #[test]
    fn test_zero_padding () {
        // 'A' ^ 'A' == 0
        assert_eq!( finalize("$AA"), "$AA*00");
        assert_eq!( finalize("$\x01"), "$\x01*01");
    }
}
