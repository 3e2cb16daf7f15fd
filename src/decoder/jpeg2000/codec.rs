use std::ptr::NonNull;

use openjpeg_sys as opj;

use super::{image::Image, stream::Stream};

pub(crate) struct Codec(NonNull<opj::opj_codec_t>);

impl Drop for Codec {
    fn drop(&mut self) {
        unsafe {
            opj::opj_destroy_codec(self.0.as_ptr());
        }
    }
}

impl Codec {
    pub(crate) fn j2k_decompress() -> Result<Self, &'static str> {
        NonNull::new(unsafe { opj::opj_create_decompress(opj::OPJ_CODEC_FORMAT::OPJ_CODEC_J2K) })
            .map(Self)
            .ok_or("setup of the JPEG 2000 decoder codec failed")
    }

    pub(crate) fn j2k_compress() -> Result<Self, &'static str> {
        NonNull::new(unsafe { opj::opj_create_compress(opj::OPJ_CODEC_FORMAT::OPJ_CODEC_J2K) })
            .map(Self)
            .ok_or("setup of the JPEG 2000 encoder codec failed")
    }

    pub(crate) fn set_threads(&self, num_threads: u32) -> Result<(), &'static str> {
        if num_threads <= 1 {
            return Ok(());
        }
        let num_threads = i32::try_from(num_threads).unwrap_or(i32::MAX);
        if unsafe { opj::opj_codec_set_threads(self.as_ptr(), num_threads) } != 1 {
            return Err("setting the number of JPEG 2000 codec threads failed");
        }
        Ok(())
    }

    pub(crate) fn as_ptr(&self) -> *mut opj::opj_codec_t {
        self.0.as_ptr()
    }
}

pub(crate) struct DecodeParams(opj::opj_dparameters);

impl Default for DecodeParams {
    fn default() -> Self {
        let mut params = unsafe { std::mem::zeroed::<opj::opj_dparameters>() };
        unsafe { opj::opj_set_default_decoder_parameters(&mut params) };
        Self(params)
    }
}

pub(crate) struct EncodeParams(opj::opj_cparameters_t);

impl EncodeParams {
    /// Single quality layer and a single resolution level, as GRIB2 code
    /// streams hold one row or a small grid of samples. A compression ratio
    /// of 0 means lossless.
    pub(crate) fn new(reversible: bool, compression_ratio: u32) -> Self {
        let mut params = unsafe { std::mem::zeroed::<opj::opj_cparameters_t>() };
        unsafe { opj::opj_set_default_encoder_parameters(&mut params) };
        params.tcp_numlayers = 1;
        params.tcp_rates[0] = compression_ratio as f32;
        params.cp_disto_alloc = 1;
        params.irreversible = i32::from(!reversible);
        params.numresolution = 1;
        Self(params)
    }
}

// Codec is always assumed to be J2K.
pub(crate) struct Decoder<'a> {
    codec: Codec,
    stream: Stream<'a>,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(stream: Stream<'a>, num_threads: u32) -> Result<Self, &'static str> {
        let codec = Codec::j2k_decompress()?;
        codec.set_threads(num_threads)?;
        Ok(Self { codec, stream })
    }

    pub(crate) fn setup(&self, mut params: DecodeParams) -> Result<(), &'static str> {
        if unsafe { opj::opj_setup_decoder(self.codec.as_ptr(), &mut params.0) } != 1 {
            return Err("setup of the JPEG 2000 decoder failed");
        }
        Ok(())
    }

    pub(crate) fn read_header(&self) -> Result<Image, &'static str> {
        let mut img: *mut opj::opj_image_t = std::ptr::null_mut();
        let result =
            unsafe { opj::opj_read_header(self.stream.as_ptr(), self.codec.as_ptr(), &mut img) };
        let img = Image::new(img)?;
        if result == 1 {
            Ok(img)
        } else {
            Err("reading of the JPEG 2000 image header failed")
        }
    }

    pub(crate) fn decode(&self, img: &Image) -> Result<(), &'static str> {
        let codec = self.codec.as_ptr();
        let stream = self.stream.as_ptr();
        if unsafe { opj::opj_decode(codec, stream, img.as_ptr()) } != 1 {
            return Err("decoding of the JPEG 2000 image failed");
        }
        if unsafe { opj::opj_end_decompress(codec, stream) } != 1 {
            return Err("finishing the JPEG 2000 decoding failed");
        }
        Ok(())
    }
}

pub(crate) struct Encoder {
    codec: Codec,
}

impl Encoder {
    pub(crate) fn new(num_threads: u32) -> Result<Self, &'static str> {
        let codec = Codec::j2k_compress()?;
        codec.set_threads(num_threads)?;
        Ok(Self { codec })
    }

    /// Compresses `image` into a raw J2K code stream.
    pub(crate) fn encode(
        &self,
        mut params: EncodeParams,
        image: &Image,
    ) -> Result<Vec<u8>, &'static str> {
        let codec = self.codec.as_ptr();
        if unsafe { opj::opj_setup_encoder(codec, &mut params.0, image.as_ptr()) } != 1 {
            return Err("setup of the JPEG 2000 encoder failed");
        }

        let stream = Stream::writer()?;
        if unsafe { opj::opj_start_compress(codec, image.as_ptr(), stream.as_ptr()) } != 1 {
            return Err("starting the JPEG 2000 encoding failed");
        }
        if unsafe { opj::opj_encode(codec, stream.as_ptr()) } != 1 {
            return Err("encoding of the JPEG 2000 image failed");
        }
        if unsafe { opj::opj_end_compress(codec, stream.as_ptr()) } != 1 {
            return Err("finishing the JPEG 2000 encoding failed");
        }
        Ok(stream.into_written())
    }
}
