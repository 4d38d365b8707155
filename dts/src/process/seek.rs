use log::trace;

use crate::structs::header::StreamHeader;

/// Full scale of a positional seek request.
pub const SEEK_FRACTION_MAX: u16 = u16::MAX;

/// Frame aligned seek destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTarget {
    /// Absolute byte offset of the frame.
    pub offset: u64,
    /// Index of the frame, for restarting timestamps.
    pub frame_index: u64,
}

fn align(header: &StreamHeader, payload_pos: u64) -> SeekTarget {
    let frame_index = payload_pos
        .checked_div(header.frame_size as u64)
        .unwrap_or(0);
    let offset = header.data_start + frame_index * header.frame_size as u64;

    trace!("seek to payload byte {payload_pos}: frame {frame_index} at offset {offset}");

    SeekTarget {
        offset,
        frame_index,
    }
}

/// Seeks to `fraction / 65535` of the stream payload.
///
/// The interpolated position is truncated to a frame boundary and made
/// absolute by adding the data start offset.
pub fn seek_to_fraction(fraction: u16, header: &StreamHeader, stream_length: u64) -> SeekTarget {
    let payload = stream_length.saturating_sub(header.data_start);
    let pos = payload as u128 * fraction as u128 / SEEK_FRACTION_MAX as u128;

    align(header, pos as u64)
}

/// Seeks to `time_ms` milliseconds into the stream.
///
/// The time is converted to a payload position using the total stream
/// duration, then aligned like a positional seek. Times past the end
/// clamp to the end of the payload.
pub fn seek_to_time(time_ms: u64, header: &StreamHeader, stream_length: u64) -> SeekTarget {
    let payload = stream_length.saturating_sub(header.data_start);
    let duration = header.duration_ms(stream_length);
    if duration == 0 {
        return align(header, 0);
    }

    let pos = (payload as u128 * time_ms as u128 / duration as u128).min(payload as u128);

    align(header, pos as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::header::BitstreamFormat;

    fn header() -> StreamHeader {
        StreamHeader {
            format: BitstreamFormat::Le14,
            sample_rate: 44100,
            frame_size: 2300,
            samples_per_frame: 512,
            data_start: 44,
            channels: Some(5),
            lfe: true,
            bit_rate: Some(1_411_200),
        }
    }

    #[test]
    fn fraction_seek_is_frame_aligned() {
        let header = header();
        let len = 44 + 2300 * 1000;

        assert_eq!(
            seek_to_fraction(0, &header, len),
            SeekTarget {
                offset: 44,
                frame_index: 0
            }
        );

        let half = seek_to_fraction(32768, &header, len);
        assert_eq!(half.frame_index, 500);
        assert_eq!(half.offset, 44 + 500 * 2300);

        let end = seek_to_fraction(SEEK_FRACTION_MAX, &header, len);
        assert_eq!(end.frame_index, 1000);

        for fraction in (0..=u16::MAX).step_by(977) {
            let target = seek_to_fraction(fraction, &header, len);
            assert_eq!((target.offset - header.data_start) % 2300, 0);
            assert!(target.offset <= len);
        }
    }

    #[test]
    fn time_seek_uses_stream_duration() {
        let header = header();
        let len = 44 + 2300 * 1000;
        let duration = header.duration_ms(len);
        assert_eq!(duration, 512_000 * 1000 / 44100);

        let target = seek_to_time(duration / 4, &header, len);
        assert!((249..=250).contains(&target.frame_index));
        assert_eq!(target.offset, 44 + target.frame_index * 2300);

        assert_eq!(seek_to_time(duration * 10, &header, len).frame_index, 1000);
    }

    #[test]
    fn empty_stream() {
        let header = header();
        assert_eq!(seek_to_fraction(40000, &header, 10).offset, 44);
        assert_eq!(seek_to_time(1000, &header, 0).offset, 44);
    }

    #[test]
    fn zero_frame_size_seeks_to_data_start() {
        let header = StreamHeader {
            sample_rate: 0,
            frame_size: 0,
            ..header()
        };
        let len = 44 + 2300 * 1000;

        let target = seek_to_fraction(32768, &header, len);
        assert_eq!(target.frame_index, 0);
        assert_eq!(target.offset, 44);
        assert_eq!(seek_to_time(5000, &header, len).offset, 44);
    }
}
