// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.

use clap::Args;
use cr_core::ScanReading;

/// Location and quality readings attached to a scan.
#[derive(Args, Clone, Debug, Default)]
pub struct ScanArgs {
    /// Latitude of the device when scanning
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the device when scanning
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// GPS accuracy in meters
    #[arg(long)]
    pub accuracy: Option<f64>,

    /// Distance from the expected drop-off point in meters
    #[arg(long)]
    pub distance: Option<f64>,

    /// Anomaly flagged by the scanner
    #[arg(long)]
    pub anomaly: Option<String>,
}

impl ScanArgs {
    /// Builds the reading for `asset_id`.
    pub fn reading(&self, asset_id: &str, scan_type: &str) -> ScanReading {
        ScanReading {
            asset_id: asset_id.to_string(),
            scan_type: scan_type.to_string(),
            lat: self.lat,
            lon: self.lon,
            accuracy: self.accuracy,
            distance: self.distance,
            anomaly: self.anomaly.clone(),
        }
    }
}
