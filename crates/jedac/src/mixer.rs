//! Mixer control surface.
//!
//! The sound-card layer exposes two controls: a stereo "Master Playback
//! Volume" whose values run the other way round from the board's
//! attenuation (0 = mute, 80 = loudest), and an enumerated "Input Source".
//! Put operations return whether the control value changed, as ALSA's
//! `put` callbacks do.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use heapless::String;

use crate::audio_types::{AttenuationDb, MixerVolume};
use crate::board::Board;
use crate::error::Error;
use crate::input::InputSelection;
use crate::transport::RegisterTransport;

/// Name of the stereo volume control.
pub const MASTER_VOLUME_NAME: &str = "Master Playback Volume";
/// Name of the input selection control.
pub const INPUT_SOURCE_NAME: &str = "Input Source";

/// Longest input label ("Spdif 4").
pub const LABEL_CAPACITY: usize = 8;

/// Number of entries in the input enumeration (I2S plus S/PDIF inputs).
pub fn input_source_count(spdif_inputs: u8) -> u8 {
    spdif_inputs.saturating_add(1)
}

/// Label of enumeration entry `index`: "I2S", then "Spdif 1".."Spdif N".
pub fn input_source_label(index: u8, spdif_inputs: u8) -> Option<String<LABEL_CAPACITY>> {
    let selection = InputSelection::from_index(index, spdif_inputs).ok()?;
    let mut label = String::new();
    write!(label, "{selection}").ok()?;
    Some(label)
}

/// Current volume control value, `[left, right]`.
pub fn get_master_volume<T, P, D>(board: &Board<T, P, D>) -> [MixerVolume; 2]
where
    T: RegisterTransport,
    P: StatefulOutputPin,
    D: DelayNs,
{
    let (l, r) = board.get_volume();
    [
        MixerVolume::from(AttenuationDb::new(l)),
        MixerVolume::from(AttenuationDb::new(r)),
    ]
}

/// Apply a volume control value. Returns whether the value changed.
pub fn put_master_volume<T, P, D>(
    board: &mut Board<T, P, D>,
    [left, right]: [MixerVolume; 2],
) -> Result<bool, Error>
where
    T: RegisterTransport,
    P: StatefulOutputPin,
    D: DelayNs,
{
    let changed = get_master_volume(board) != [left, right];
    board.set_volume(
        AttenuationDb::from(left).get(),
        AttenuationDb::from(right).get(),
    )?;
    Ok(changed)
}

/// Current input enumeration index.
pub fn get_input_source<T, P, D>(board: &Board<T, P, D>) -> u8
where
    T: RegisterTransport,
    P: StatefulOutputPin,
    D: DelayNs,
{
    board.get_input().index()
}

/// Select an input by enumeration index. Returns whether the hardware
/// selection changed.
pub fn put_input_source<T, P, D>(board: &mut Board<T, P, D>, index: u8) -> Result<bool, Error>
where
    T: RegisterTransport,
    P: StatefulOutputPin,
    D: DelayNs,
{
    board.switch_input(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(input_source_label(0, 4).as_deref(), Some("I2S"));
        assert_eq!(input_source_label(1, 4).as_deref(), Some("Spdif 1"));
        assert_eq!(input_source_label(4, 4).as_deref(), Some("Spdif 4"));
        assert_eq!(input_source_label(5, 4), None);
    }

    #[test]
    fn count_includes_i2s() {
        assert_eq!(input_source_count(4), 5);
    }
}
