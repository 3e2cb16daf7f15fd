use std::{ffi::c_void, marker::PhantomData};

use openjpeg_sys as opj;

struct Slice<'a> {
    offset: usize,
    buf: &'a [u8],
}

impl<'a> Slice<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { offset: 0, buf }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn seek(&mut self, new_offset: usize) -> usize {
        self.offset = self.buf.len().min(new_offset);
        self.offset
    }

    fn consume(&mut self, nb_bytes: usize) -> usize {
        let new_offset = self.offset.saturating_add(nb_bytes);
        self.seek(new_offset)
    }

    fn read_into(&mut self, out_buffer: &mut [u8]) -> Option<usize> {
        let remaining = self.remaining();
        if remaining == 0 {
            return None;
        }

        let nb_bytes_read = remaining.min(out_buffer.len());
        let offset = self.offset;
        let end_off = self.consume(nb_bytes_read);
        out_buffer[..nb_bytes_read].copy_from_slice(&self.buf[offset..end_off]);
        Some(nb_bytes_read)
    }
}

extern "C" fn slice_read_fn(p_buffer: *mut c_void, nb_bytes: usize, p_data: *mut c_void) -> usize {
    if p_buffer.is_null() || nb_bytes == 0 {
        return usize::MAX;
    }

    let slice = unsafe { &mut *(p_data as *mut Slice) };
    let out_buf = unsafe { std::slice::from_raw_parts_mut(p_buffer as *mut u8, nb_bytes) };
    slice.read_into(out_buf).unwrap_or(usize::MAX)
}

extern "C" fn slice_skip_fn(nb_bytes: i64, p_data: *mut c_void) -> i64 {
    let slice = unsafe { &mut *(p_data as *mut Slice) };
    let before = slice.offset;
    (slice.consume(nb_bytes.max(0) as usize) - before) as i64
}

extern "C" fn slice_seek_fn(nb_bytes: i64, p_data: *mut c_void) -> i32 {
    let slice = unsafe { &mut *(p_data as *mut Slice) };
    let seek_offset = nb_bytes.max(0) as usize;
    let new_offset = slice.seek(seek_offset);
    i32::from(seek_offset == new_offset)
}

extern "C" fn slice_free_fn(p_data: *mut c_void) {
    drop(unsafe { Box::from_raw(p_data as *mut Slice) })
}

/// Growable output of an encoding stream. OpenJPEG seeks back to patch
/// markers, so writes may land before the end.
#[derive(Default)]
struct Sink {
    buf: Vec<u8>,
    pos: usize,
}

impl Sink {
    fn ensure_len(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
    }

    fn write(&mut self, data: &[u8]) {
        let end = self.pos + data.len();
        self.ensure_len(end);
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
    }
}

extern "C" fn sink_write_fn(p_buffer: *mut c_void, nb_bytes: usize, p_data: *mut c_void) -> usize {
    if p_buffer.is_null() {
        return usize::MAX;
    }
    let sink = unsafe { &mut *(p_data as *mut Sink) };
    let data = unsafe { std::slice::from_raw_parts(p_buffer as *const u8, nb_bytes) };
    sink.write(data);
    nb_bytes
}

extern "C" fn sink_skip_fn(nb_bytes: i64, p_data: *mut c_void) -> i64 {
    let sink = unsafe { &mut *(p_data as *mut Sink) };
    let new_pos = (sink.pos as i64).saturating_add(nb_bytes).max(0) as usize;
    sink.ensure_len(new_pos);
    let skipped = new_pos as i64 - sink.pos as i64;
    sink.pos = new_pos;
    skipped
}

extern "C" fn sink_seek_fn(offset: i64, p_data: *mut c_void) -> i32 {
    if offset < 0 {
        return 0;
    }
    let sink = unsafe { &mut *(p_data as *mut Sink) };
    sink.pos = offset as usize;
    sink.ensure_len(sink.pos);
    1
}

/// An OpenJPEG stream reading from a borrowed buffer or writing to an owned
/// one.
pub(crate) struct Stream<'a> {
    ptr: *mut opj::opj_stream_t,
    // Output streams keep their sink here so that it can be taken back once
    // the stream is destroyed.
    sink: Option<Box<Sink>>,
    _input: PhantomData<&'a [u8]>,
}

impl Drop for Stream<'_> {
    fn drop(&mut self) {
        unsafe {
            opj::opj_stream_destroy(self.ptr);
        }
    }
}

impl<'a> Stream<'a> {
    pub(crate) fn from_bytes(buf: &'a [u8]) -> Result<Self, &'static str> {
        let len = buf.len();
        let data = Box::new(Slice::new(buf));

        let ptr = unsafe { opj::opj_stream_default_create(1) };
        if ptr.is_null() {
            return Err("creation of JPEG 2000 input stream failed");
        }
        unsafe {
            opj::opj_stream_set_read_function(ptr, Some(slice_read_fn));
            opj::opj_stream_set_skip_function(ptr, Some(slice_skip_fn));
            opj::opj_stream_set_seek_function(ptr, Some(slice_seek_fn));
            opj::opj_stream_set_user_data_length(ptr, len as u64);
            opj::opj_stream_set_user_data(
                ptr,
                Box::into_raw(data) as *mut c_void,
                Some(slice_free_fn),
            );
        }
        Ok(Self {
            ptr,
            sink: None,
            _input: PhantomData,
        })
    }

    pub(crate) fn writer() -> Result<Self, &'static str> {
        let mut sink = Box::<Sink>::default();

        let ptr = unsafe { opj::opj_stream_default_create(0) };
        if ptr.is_null() {
            return Err("creation of JPEG 2000 output stream failed");
        }
        unsafe {
            opj::opj_stream_set_write_function(ptr, Some(sink_write_fn));
            opj::opj_stream_set_skip_function(ptr, Some(sink_skip_fn));
            opj::opj_stream_set_seek_function(ptr, Some(sink_seek_fn));
            opj::opj_stream_set_user_data(ptr, &mut *sink as *mut Sink as *mut c_void, None);
        }
        Ok(Self {
            ptr,
            sink: Some(sink),
            _input: PhantomData,
        })
    }

    /// Destroys the stream, flushing it, and returns what was written.
    pub(crate) fn into_written(mut self) -> Vec<u8> {
        let sink = self.sink.take();
        drop(self);
        sink.map(|s| s.buf).unwrap_or_default()
    }

    pub(crate) fn as_ptr(&self) -> *mut opj::opj_stream_t {
        self.ptr
    }
}
