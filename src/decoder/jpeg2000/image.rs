use std::ptr::NonNull;

use openjpeg_sys as opj;

#[derive(Debug)]
pub(crate) struct Image(NonNull<opj::opj_image_t>);

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            opj::opj_image_destroy(self.0.as_ptr());
        }
    }
}

impl Image {
    pub(crate) fn new(ptr: *mut opj::opj_image_t) -> Result<Self, &'static str> {
        NonNull::new(ptr)
            .map(Self)
            .ok_or("initialization of the JPEG 2000 image failed")
    }

    /// Creates a single-component grayscale image of `width` x `height`
    /// samples, `prec` bits deep, filled with `samples`.
    pub(crate) fn grayscale(
        samples: &[i32],
        width: u32,
        height: u32,
        prec: u32,
    ) -> Result<Self, &'static str> {
        if samples.len() != width as usize * height as usize {
            return Err("number of samples does not match the image size");
        }

        let mut param = unsafe { std::mem::zeroed::<opj::opj_image_cmptparm_t>() };
        param.dx = 1;
        param.dy = 1;
        param.w = width;
        param.h = height;
        param.prec = prec;
        param.sgnd = 0;

        let ptr = unsafe {
            opj::opj_image_create(1, &mut param, opj::OPJ_COLOR_SPACE::OPJ_CLRSPC_GRAY)
        };
        let mut image = Self::new(ptr)?;
        {
            let inner = image.inner_mut();
            inner.x0 = 0;
            inner.y0 = 0;
            inner.x1 = width;
            inner.y1 = height;
        }
        let component = image
            .components_mut()
            .first_mut()
            .ok_or("JPEG 2000 image has no component")?;
        let data = component.data_mut();
        if data.len() != samples.len() {
            return Err("allocation of JPEG 2000 image samples failed");
        }
        data.copy_from_slice(samples);
        Ok(image)
    }

    fn inner(&self) -> &opj::opj_image_t {
        unsafe { &(*self.0.as_ptr()) }
    }

    fn inner_mut(&mut self) -> &mut opj::opj_image_t {
        unsafe { &mut (*self.0.as_ptr()) }
    }

    pub(crate) fn components(&self) -> &[ImageComponent] {
        let img = self.inner();
        if img.comps.is_null() {
            return &[];
        }
        unsafe {
            std::slice::from_raw_parts(img.comps as *const ImageComponent, img.numcomps as usize)
        }
    }

    fn components_mut(&mut self) -> &mut [ImageComponent] {
        let img = self.inner_mut();
        if img.comps.is_null() {
            return &mut [];
        }
        unsafe {
            std::slice::from_raw_parts_mut(img.comps as *mut ImageComponent, img.numcomps as usize)
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut opj::opj_image_t {
        self.0.as_ptr()
    }
}

#[repr(transparent)]
pub(crate) struct ImageComponent(opj::opj_image_comp_t);

impl ImageComponent {
    fn len(&self) -> usize {
        self.0.w as usize * self.0.h as usize
    }

    pub(crate) fn data(&self) -> &[i32] {
        if self.0.data.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.0.data, self.len()) }
    }

    fn data_mut(&mut self) -> &mut [i32] {
        if self.0.data.is_null() {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.0.data, self.len()) }
    }
}
