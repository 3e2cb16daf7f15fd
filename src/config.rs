/// Settings for the external image and entropy codecs.
///
/// A value of this type is handed to every decode and encode call that may
/// reach an external codec, so that concurrent calls can use different
/// settings.
///
/// ```
/// use grib_codec::CodecConfig;
///
/// let config = CodecConfig::default()
///     .with_jpeg2000_threads(4)
///     .with_ccsds_block_size(16);
/// assert_eq!(config.jpeg2000_threads, 4);
/// assert_eq!(config.ccsds_rsi, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecConfig {
    /// Number of threads OpenJPEG may use.
    pub jpeg2000_threads: u32,
    /// Whether JPEG 2000 encoding uses the reversible 5/3 wavelet when the
    /// template asks for lossless compression.
    pub jpeg2000_reversible: bool,
    /// CCSDS block size used when the template leaves it zero.
    pub ccsds_block_size: u32,
    /// CCSDS reference sample interval used when the template leaves it zero.
    pub ccsds_rsi: u32,
    /// CCSDS compression option mask used when the template leaves it zero.
    pub ccsds_flags: u8,
}

/// `AEC_DATA_MSB | AEC_DATA_PREPROCESS`
const DEFAULT_CCSDS_FLAGS: u8 = 0b1100;

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            jpeg2000_threads: 1,
            jpeg2000_reversible: true,
            ccsds_block_size: 32,
            ccsds_rsi: 128,
            ccsds_flags: DEFAULT_CCSDS_FLAGS,
        }
    }
}

impl CodecConfig {
    pub fn with_jpeg2000_threads(self, jpeg2000_threads: u32) -> Self {
        Self {
            jpeg2000_threads,
            ..self
        }
    }

    pub fn with_jpeg2000_reversible(self, jpeg2000_reversible: bool) -> Self {
        Self {
            jpeg2000_reversible,
            ..self
        }
    }

    pub fn with_ccsds_block_size(self, ccsds_block_size: u32) -> Self {
        Self {
            ccsds_block_size,
            ..self
        }
    }

    pub fn with_ccsds_rsi(self, ccsds_rsi: u32) -> Self {
        Self { ccsds_rsi, ..self }
    }

    pub fn with_ccsds_flags(self, ccsds_flags: u8) -> Self {
        Self {
            ccsds_flags,
            ..self
        }
    }
}
