//! Assembly of calibrated waveforms and the multi-channel waveform table.

use std::collections::BTreeMap;

use crate::{SampleCodes, WaveformDescriptor};

/// Number of horizontal divisions on the screen of the scope.
pub const HORIZONTAL_DIVISIONS: f64 = 10.0;

/// One point of a waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time relative to the trigger in seconds.
    pub time_s: f64,
    /// Voltage in volts.
    pub volts: f64,
}

/// The calibrated waveform of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Channel the waveform was read from, 1 to 4.
    pub channel: u8,
    /// The samples, with strictly increasing times.
    pub samples: Vec<Sample>,
}

impl Waveform {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the waveform has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterator over the times in seconds.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.time_s)
    }

    /// Iterator over the voltages in volts.
    pub fn volts(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.volts)
    }

    /// Voltage at exactly the given time, if the waveform has a sample there.
    pub fn volts_at(&self, time_s: f64) -> Option<f64> {
        self.samples
            .binary_search_by(|s| s.time_s.total_cmp(&time_s))
            .ok()
            .map(|idx| self.samples[idx].volts)
    }
}

/// Convert codes into a waveform with the calibration of the descriptor.
///
/// The voltage of code `c` is `c / codes_per_division * vertical_gain - vertical_offset`. Sample
/// `i` is at `-trigger_delay - time_per_division * HORIZONTAL_DIVISIONS / 2 + i * interval`, i.e.,
/// the first sample sits at the left edge of the screen.
pub fn assemble(codes: &SampleCodes, descriptor: &WaveformDescriptor) -> Waveform {
    let t0 = -descriptor.trigger_delay_seconds
        - descriptor.time_per_division_seconds * HORIZONTAL_DIVISIONS / 2.0;
    let samples = codes
        .calibrated()
        .enumerate()
        .map(|(i, c)| Sample {
            time_s: t0 + i as f64 * descriptor.sample_interval_seconds,
            volts: c / descriptor.codes_per_division * descriptor.vertical_gain
                - descriptor.vertical_offset,
        })
        .collect();
    Waveform {
        channel: descriptor.channel_id,
        samples,
    }
}

/// One row of a [`WaveformTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Time of the row in seconds.
    pub time_s: f64,
    /// Voltage of every channel of the table, in the order of [`WaveformTable::channels`].
    /// Channels without a sample at this time are `None`.
    pub volts: Vec<Option<f64>>,
}

/// Waveforms of several channels, one column per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformTable {
    columns: BTreeMap<u8, Waveform>,
}

impl WaveformTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a waveform, replacing the column of its channel if there was one.
    pub fn insert(&mut self, waveform: Waveform) {
        self.columns.insert(waveform.channel, waveform);
    }

    /// Get the waveform of a channel.
    pub fn get(&self, channel: u8) -> Option<&Waveform> {
        self.columns.get(&channel)
    }

    /// Channels in the table, in ascending order.
    pub fn channels(&self) -> Vec<u8> {
        self.columns.keys().copied().collect()
    }

    /// Number of channels in the table.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no channels.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Remove all channels.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Iterate over the waveforms in ascending channel order.
    pub fn iter(&self) -> impl Iterator<Item = &Waveform> {
        self.columns.values()
    }

    /// The table as rows on the union of the time axes of all channels.
    pub fn rows(&self) -> Vec<TableRow> {
        let mut times: Vec<f64> = self.iter().flat_map(Waveform::times).collect();
        times.sort_by(f64::total_cmp);
        times.dedup_by(|a, b| a.total_cmp(b).is_eq());

        times
            .into_iter()
            .map(|time_s| TableRow {
                time_s,
                volts: self.iter().map(|wf| wf.volts_at(time_s)).collect(),
            })
            .collect()
    }
}

/// Everything the driver keeps from previous acquisitions.
#[derive(Debug, Default)]
pub(crate) struct WaveformStore {
    pub(crate) descriptors: BTreeMap<u8, WaveformDescriptor>,
    pub(crate) waveforms: WaveformTable,
}

impl WaveformStore {
    pub(crate) fn clear(&mut self) {
        self.descriptors.clear();
        self.waveforms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    use crate::{decode_descriptor, preamble::layout, preamble::tests::BlockBuilder};

    fn descriptor(
        interval: f32,
        delay: f64,
        tdiv_idx: i16,
        cpd: f32,
        gain: f32,
    ) -> WaveformDescriptor {
        let block = BlockBuilder::new()
            .f32(layout::HORIZONTAL_INTERVAL, interval)
            .f64(layout::HORIZONTAL_OFFSET, delay)
            .i16(layout::TIMEBASE, tdiv_idx)
            .f32(layout::CODES_PER_DIV, cpd)
            .f32(layout::VERTICAL_GAIN, gain)
            .build();
        decode_descriptor::<_, crate::DecodeError>(&block, || Ok(1)).unwrap()
    }

    fn waveform(channel: u8, points: &[(f64, f64)]) -> Waveform {
        Waveform {
            channel,
            samples: points
                .iter()
                .map(|&(time_s, volts)| Sample { time_s, volts })
                .collect(),
        }
    }

    /// 1 us interval, no delay, 1 ms/div: the first sample is at -5 ms.
    #[rstest]
    fn test_assemble_time() {
        let desc = descriptor(1e-6, 0.0, 20, 25.0, 0.1);
        let codes = SampleCodes {
            codes: vec![0, 0, 0],
            bit_depth: 8,
        };
        let wf = assemble(&codes, &desc);
        let interval = f64::from(1e-6_f32);
        assert_eq!(wf.channel, 1);
        assert_eq!(wf.samples[0].time_s, -5e-3);
        assert_eq!(wf.samples[1].time_s, -5e-3 + interval);
        assert!(wf.samples.windows(2).all(|w| w[1].time_s > w[0].time_s));
    }

    #[rstest]
    fn test_assemble_delay() {
        let desc = descriptor(1e-6, 1e-3, 20, 25.0, 0.1);
        let codes = SampleCodes {
            codes: vec![0],
            bit_depth: 8,
        };
        let t0 = assemble(&codes, &desc).samples[0].time_s;
        assert!((t0 + 6e-3).abs() < 1e-12, "{t0}");
    }

    /// 25 codes per division at 0.1 V/div: 25 codes are 0.1 V.
    #[rstest]
    #[case(8, 25, 0.1)]
    #[case(8, -50, -0.2)]
    #[case(10, 100, 0.1)]
    fn test_assemble_voltage(#[case] bit_depth: u8, #[case] code: i32, #[case] volts: f64) {
        let desc = descriptor(1e-6, 0.0, 20, 25.0, 0.1);
        let codes = SampleCodes {
            codes: vec![code],
            bit_depth,
        };
        let v = assemble(&codes, &desc).samples[0].volts;
        assert!((v - volts).abs() < 1e-6, "{v} != {volts}");
    }

    #[rstest]
    fn test_table_insert_replaces() {
        let mut table = WaveformTable::new();
        table.insert(waveform(3, &[(0.0, 1.0)]));
        table.insert(waveform(1, &[(0.0, 2.0)]));
        table.insert(waveform(3, &[(0.0, 5.0), (1.0, 6.0)]));

        assert_eq!(table.channels(), vec![1, 3]);
        assert_eq!(table.get(3).unwrap().len(), 2);
        assert_eq!(table.get(1).unwrap().volts().collect::<Vec<_>>(), vec![2.0]);
        assert!(table.get(2).is_none());

        table.clear();
        assert!(table.is_empty());
    }

    #[rstest]
    fn test_table_rows() {
        let mut table = WaveformTable::new();
        table.insert(waveform(2, &[(0.0, 1.0), (1.0, 2.0)]));
        table.insert(waveform(4, &[(1.0, 3.0), (2.0, 4.0)]));

        let rows = table.rows();
        assert_eq!(
            rows,
            vec![
                TableRow {
                    time_s: 0.0,
                    volts: vec![Some(1.0), None]
                },
                TableRow {
                    time_s: 1.0,
                    volts: vec![Some(2.0), Some(3.0)]
                },
                TableRow {
                    time_s: 2.0,
                    volts: vec![None, Some(4.0)]
                },
            ]
        );
    }
}
