//! Shared codec handle with scoped acquisition.

use std::fmt;
use std::sync::Arc;

use image::Rgba32FImage;
use parking_lot::{Mutex, MutexGuard};

use super::{BlockCodec, CodecError, NativeCodec};
use crate::format::PixelFormatInfo;

/// A codec passed explicitly to the converter.
///
/// Clones share both the codec and its lock, so one handle can serve a
/// whole batch running on many threads.
#[derive(Clone)]
pub struct CodecHandle {
    codec: Arc<dyn BlockCodec>,
    lock: Arc<Mutex<()>>,
}

impl CodecHandle {
    pub fn new<C: BlockCodec + 'static>(codec: C) -> Self {
        Self::from_arc(Arc::new(codec))
    }

    pub fn from_arc(codec: Arc<dyn BlockCodec>) -> Self {
        Self {
            codec,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Handle over the built-in [`NativeCodec`].
    pub fn native() -> Self {
        Self::new(NativeCodec::new())
    }

    pub fn name(&self) -> &str {
        self.codec.name()
    }

    /// Acquires the codec for one or more calls.
    ///
    /// For non-reentrant codecs this holds the shared lock until the
    /// session is dropped, including on error paths.
    pub fn session(&self) -> CodecSession<'_> {
        let guard = if self.codec.is_reentrant() {
            None
        } else {
            Some(self.lock.lock())
        };
        CodecSession {
            codec: self.codec.as_ref(),
            _guard: guard,
        }
    }
}

impl Default for CodecHandle {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Debug for CodecHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecHandle")
            .field("codec", &self.codec.name())
            .field("reentrant", &self.codec.is_reentrant())
            .finish()
    }
}

/// Scoped access to a codec; releases the lock on drop.
pub struct CodecSession<'a> {
    codec: &'a dyn BlockCodec,
    _guard: Option<MutexGuard<'a, ()>>,
}

impl CodecSession<'_> {
    pub fn decode(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        format: &PixelFormatInfo,
    ) -> Result<Rgba32FImage, CodecError> {
        self.codec.decode(data, width, height, format)
    }

    pub fn encode(&self, image: &Rgba32FImage, format: &PixelFormatInfo) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(image, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Records the maximum number of calls observed in flight.
    struct CountingCodec {
        reentrant: bool,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingCodec {
        fn new(reentrant: bool) -> Self {
            Self {
                reentrant,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl BlockCodec for CountingCodec {
        fn name(&self) -> &str {
            "counting"
        }

        fn decode(
            &self,
            _data: &[u8],
            width: u32,
            height: u32,
            _format: &PixelFormatInfo,
        ) -> Result<Rgba32FImage, CodecError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Rgba32FImage::new(width, height))
        }

        fn encode(&self, _image: &Rgba32FImage, format: &PixelFormatInfo) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::Unsupported(format.name.to_string()))
        }

        fn is_reentrant(&self) -> bool {
            self.reentrant
        }
    }

    fn bc1() -> &'static PixelFormatInfo {
        crate::format::FormatRegistry::global()
            .lookup(crate::format::FormatId::Bc1Unorm)
            .unwrap()
    }

    fn run_concurrently(codec: Arc<CountingCodec>) -> usize {
        let handle = CodecHandle::from_arc(codec.clone());
        thread::scope(|scope| {
            for _ in 0..4 {
                let handle = handle.clone();
                scope.spawn(move || {
                    for _ in 0..3 {
                        handle.session().decode(&[0; 8], 4, 4, bc1()).unwrap();
                    }
                });
            }
        });
        codec.peak.load(Ordering::SeqCst)
    }

    #[test]
    fn test_non_reentrant_codec_is_serialized() {
        assert_eq!(run_concurrently(Arc::new(CountingCodec::new(false))), 1);
    }

    #[test]
    fn test_lock_released_after_error() {
        let handle = CodecHandle::new(CountingCodec::new(false));
        let image = Rgba32FImage::new(4, 4);
        assert!(handle.session().encode(&image, bc1()).is_err());
        // A second session would deadlock if the first guard leaked.
        assert!(handle.session().decode(&[0; 8], 4, 4, bc1()).is_ok());
    }

    #[test]
    fn test_debug_names_codec() {
        let handle = CodecHandle::new(CountingCodec::new(true));
        let text = format!("{:?}", handle);
        assert!(text.contains("counting"));
        assert!(text.contains("reentrant: true"));
    }
}
