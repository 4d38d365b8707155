#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error(
        "WAVE format is not 16-bit stereo 44100 Hz PCM: format tag {format_tag:#06X}, {channels} channels, {sample_rate} Hz, {bits_per_sample} bits"
    )]
    UnexpectedPcmFormat {
        format_tag: u16,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    },

    #[error("No data chunk within the first {0} bytes of the WAVE container")]
    MissingDataChunk(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("No DTS sync word found in {0} bytes")]
    NotFound(usize),

    #[error("Frame header truncated: need {needed} bytes from offset {offset}, have {available}")]
    TruncatedHeader {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid sample rate index {0}")]
    InvalidSampleRate(u8),

    #[error("Invalid frame size: {0} bytes")]
    InvalidFrameSize(u32),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Missing scheme separator \"://\"")]
    MissingSchemeSeparator,

    #[error("Empty scheme")]
    EmptyScheme,

    #[error("Empty user name before '@'")]
    EmptyUser,

    #[error("Empty password after ':'")]
    EmptyPassword,

    #[error("Empty host")]
    EmptyHost,

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    #[error("Unterminated IPv6 address literal")]
    UnterminatedIpv6,
}
