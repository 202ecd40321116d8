use std::fmt;

use bytes::Bytes;

use crate::{
    error::{Error, Result},
    mime::ImageFormat,
};

/// Image bytes whose format has been confirmed by sniffing.
///
/// The only way to build one is through [`ImageBlob::new`], so holding an
/// `ImageBlob` means the bytes passed the format check.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    data: Bytes,
    format: ImageFormat,
}

impl ImageBlob {
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let format = ImageFormat::sniff(&data).ok_or(Error::UnsupportedFormat)?;
        Ok(Self { data, format })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlob")
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}
