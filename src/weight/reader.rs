// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::weight::event_channels::RawReadingSender;
use crate::weight::interface::AsyncStrainGaugeInterface;
use defmt::{info, trace, warn};
use embassy_time::{with_timeout, Duration, Timer};

/// The HX711 converts at 10 SPS, a second without data means it is gone.
const READING_TIMEOUT: Duration = Duration::from_millis(1000);
const RECOVERY_DELAY: Duration = Duration::from_millis(500);

/// Pump conversions from the gauge into the reading channel forever. Failures are logged
/// and the gauge is power cycled. The controller notices the missing data on its own.
pub async fn strain_gauge_reader<SG>(
    mut strain_gauge: SG,
    readings: RawReadingSender<'static>,
) -> !
where
    SG: AsyncStrainGaugeInterface,
{
    while strain_gauge.initialize().await.is_err() {
        warn!("Strain gauge init failed, retrying");
        Timer::after(RECOVERY_DELAY).await;
    }
    info!(
        "Strain gauge ready, {} bit readings",
        strain_gauge.get_adc_bit_count()
    );

    loop {
        match with_timeout(READING_TIMEOUT, strain_gauge.get_next_reading()).await {
            Ok(Ok(raw)) => {
                trace!("Raw reading {}", raw);
                if readings.try_send(raw).is_err() {
                    warn!("Reading queue full, dropped {}", raw);
                }
            }
            Ok(Err(_)) => {
                warn!("Strain gauge read failed");
                power_cycle(&mut strain_gauge).await;
            }
            Err(_) => {
                warn!("No data from strain gauge for {} ms", READING_TIMEOUT.as_millis());
                power_cycle(&mut strain_gauge).await;
            }
        }
    }
}

async fn power_cycle<SG: AsyncStrainGaugeInterface>(strain_gauge: &mut SG) {
    if strain_gauge.power_down().await.is_err() || strain_gauge.power_up().await.is_err() {
        warn!("Strain gauge power cycle failed");
        Timer::after(RECOVERY_DELAY).await;
    }
}
