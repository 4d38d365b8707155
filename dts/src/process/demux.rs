use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};

use crate::process::seek::{SeekTarget, seek_to_fraction, seek_to_time};
use crate::structs::header::StreamHeader;
use crate::utils::timing::Timing;

/// A single stored DTS frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index of the frame counted from the first sync word.
    pub index: u64,
    /// Presentation timestamp in 90 kHz ticks.
    pub pts: u64,
    pub data: Arc<[u8]>,
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Reads fixed size frames from a synchronized stream.
///
/// Every read returns one frame of `frame_size` bytes tagged with its
/// timestamp. The final frame may be shorter when the stream ends early.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use std::io::Read;
/// use dts::process::{ProbeOptions, probe, demux::FrameReader};
///
/// let mut file = File::open("track.wav")?;
/// let mut preview = vec![0u8; 7168];
/// let n = file.read(&mut preview)?;
///
/// let header = probe(&preview[..n], &ProbeOptions::default())?;
/// for frame in FrameReader::new(file, header)? {
///     let frame = frame?;
///     println!("frame {} at {}", frame.index, frame.pts);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    header: StreamHeader,
    stream_length: u64,
    next_index: u64,
    finished: bool,
}

impl<R: Read + Seek> FrameReader<R> {
    /// Positions `reader` at the first frame of the stream described by `header`.
    pub fn new(mut reader: R, header: StreamHeader) -> Result<Self> {
        let stream_length = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(header.data_start))?;

        debug!(
            "Reading {} frames of {} bytes",
            header.frame_count(stream_length),
            header.frame_size
        );

        Ok(Self {
            reader,
            header,
            stream_length,
            next_index: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn stream_length(&self) -> u64 {
        self.stream_length
    }

    /// Index of the frame returned by the next read.
    pub fn position(&self) -> u64 {
        self.next_index
    }

    /// Seeks to `fraction / 65535` of the payload.
    pub fn seek_fraction(&mut self, fraction: u16) -> Result<SeekTarget> {
        let target = seek_to_fraction(fraction, &self.header, self.stream_length);
        self.seek_to(target)
    }

    /// Seeks to `time_ms` milliseconds into the stream.
    pub fn seek_time(&mut self, time_ms: u64) -> Result<SeekTarget> {
        let target = seek_to_time(time_ms, &self.header, self.stream_length);
        self.seek_to(target)
    }

    fn seek_to(&mut self, target: SeekTarget) -> Result<SeekTarget> {
        self.reader.seek(SeekFrom::Start(target.offset))?;
        self.next_index = target.frame_index;
        self.finished = false;
        Ok(target)
    }

    /// Reads the next frame, or `None` at the end of the stream.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.header.frame_size as usize];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            }
        }

        if filled == 0 {
            self.finished = true;
            return Ok(None);
        }
        if filled < buf.len() {
            warn!(
                "Truncated frame {}: {filled} of {} bytes",
                self.next_index,
                buf.len()
            );
            buf.truncate(filled);
            self.finished = true;
        }

        let frame = Frame {
            index: self.next_index,
            pts: self.header.pts(self.next_index),
            data: buf.into(),
        };
        self.next_index += 1;

        Ok(Some(frame))
    }
}

impl<R: Read + Seek> Iterator for FrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::process::tests::wrapped_stream;
    use crate::process::{ProbeOptions, probe};

    fn reader(frames: usize, tail: usize) -> Result<FrameReader<Cursor<Vec<u8>>>> {
        let (mut stream, _) = wrapped_stream(frames);
        stream.extend(vec![0xAA; tail]);
        let header = probe(&stream, &ProbeOptions::default())?;
        FrameReader::new(Cursor::new(stream), header)
    }

    #[test]
    fn frames_are_timestamped() -> Result<()> {
        let reader = reader(5, 0)?;
        let frame_size = reader.header().frame_size as usize;
        let duration = reader.header().frame_duration();

        let frames = reader.collect::<Result<Vec<_>>>()?;
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index, i as u64);
            assert_eq!(frame.data.len(), frame_size);
            assert_eq!(frame.data[..4], [0xFF, 0x1F, 0x00, 0xE8]);
            assert!(frame.pts >= i as u64 * duration);
        }
        // 512 samples at 44.1 kHz
        assert_eq!(frames[1].pts, 1044);

        Ok(())
    }

    #[test]
    fn short_final_frame() -> Result<()> {
        let frames = reader(2, 100)?.collect::<Result<Vec<_>>>()?;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].data.len(), 100);
        assert_eq!(frames[2].index, 2);

        Ok(())
    }

    #[test]
    fn seek_restarts_timestamps() -> Result<()> {
        let mut reader = reader(10, 0)?;
        assert_eq!(reader.by_ref().count(), 10);
        assert!(reader.read_frame()?.is_none());

        let target = reader.seek_fraction(u16::MAX / 2)?;
        assert_eq!(target.frame_index, 4);
        let frame = reader.read_frame()?.unwrap();
        assert_eq!(frame.index, 4);
        assert_eq!(frame.pts, reader.header().pts(4));
        assert_eq!(frame.data[4], 0xF0);

        let target = reader.seek_time(0)?;
        assert_eq!(target.offset, 44);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.count(), 10);

        Ok(())
    }
}
