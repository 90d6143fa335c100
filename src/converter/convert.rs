//! Connects a Rust type to the [`Converter`] the top-level serializer uses
//! for it.
//!
//! Plays the same role as a hand-implemented `Serialize` trait: implemented here for every
//! primitive and for the handful of standard-library wrappers the format
//! gives special treatment (`Option<T>`, `Rc<T>`); your own object,
//! enumerable, dictionary, or union type implements it by naming its own
//! shape's converter constructor, same as it names its own `*Model` impl by
//! hand (there is no derive macro to do it for you).

use alloc::rc::Rc;

use super::{
    BinaryConverter, BoolConverter, Converter, ConverterCache, FloatConverter, IntConverter, NilConverter,
    NullableConverter, ReferencePreservingConverter, StringConverter, UintConverter,
};

/// Resolves the [`Converter`] a serializer uses for `Self`, building it (or
/// fetching it from the cache if another shape already needed it) on first
/// use.
pub trait Convert: Sized + 'static {
    /// Build or fetch the converter for `Self`.
    fn converter(cache: &ConverterCache) -> Rc<dyn Converter<Self>>;
}

impl ConverterCache {
    /// Resolve `T`'s converter through [`Convert`], going through
    /// [`Self::get_or_build`] so a recursive shape sees a
    /// [`super::DelayedConverter`] instead of looping forever.
    pub fn resolve<T: Convert>(&self) -> Rc<dyn Converter<T>> {
        self.get_or_build::<T>(T::converter)
    }
}

macro_rules! impl_convert_scalar {
    ($ty:ty, $converter:expr) => {
        impl Convert for $ty {
            fn converter(_cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
                Rc::new($converter)
            }
        }
    };
}

impl_convert_scalar!((), NilConverter);
impl_convert_scalar!(bool, BoolConverter);
impl_convert_scalar!(u8, UintConverter::<u8>::default());
impl_convert_scalar!(u16, UintConverter::<u16>::default());
impl_convert_scalar!(u32, UintConverter::<u32>::default());
impl_convert_scalar!(u64, UintConverter::<u64>::default());
impl_convert_scalar!(i8, IntConverter::<i8>::default());
impl_convert_scalar!(i16, IntConverter::<i16>::default());
impl_convert_scalar!(i32, IntConverter::<i32>::default());
impl_convert_scalar!(i64, IntConverter::<i64>::default());
impl_convert_scalar!(f32, FloatConverter::<f32>::default());
impl_convert_scalar!(f64, FloatConverter::<f64>::default());
impl_convert_scalar!(alloc::string::String, StringConverter);
impl_convert_scalar!(alloc::vec::Vec<u8>, BinaryConverter);

impl<T: Convert> Convert for Option<T> {
    fn converter(cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(NullableConverter::new(cache.resolve::<T>()))
    }
}

impl<T: Convert> Convert for Rc<T> {
    fn converter(cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(ReferencePreservingConverter::new(cache.resolve::<T>()))
    }
}
