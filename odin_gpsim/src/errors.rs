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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinGpsimError>;

#[derive(Error,Debug)]
pub enum OdinGpsimError {

    #[error("track store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed record in line {line}: {msg}")]
    MalformedRecord { line: usize, msg: String },

    #[error("operation '{op}' not allowed in state {state}")]
    InvalidState { op: &'static str, state: String },

    #[error("channel config error {0}")]
    ChannelConfigError(String),

    #[error("checksum error: expected {expected:02X}, got {actual:02X}")]
    ChecksumError { expected: u8, actual: u8 },

    #[error("sentence format error {0}")]
    FormatError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("CSV error {0}")]
    CsvError( #[from] csv::Error),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

impl OdinGpsimError {
    /// store unavailability is the only condition that prevents the scheduler from running
    pub fn is_store_unavailable (&self)->bool {
        matches!( self, OdinGpsimError::StoreUnavailable(_))
    }
}

macro_rules! format_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinGpsimError::FormatError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use format_error;

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinGpsimError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
