//! The converter for [`DictionaryModel`] types: a map header followed by each
//! key/value pair through their own converters.

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::{ContextualError, Error, ErrorKind};
use crate::reader::Reader;
use crate::shape::DictionaryModel;
use crate::writer::Writer;

/// Converts any [`DictionaryModel`] type via its key and value converters.
pub struct DictionaryConverter<C: DictionaryModel> {
    key: Rc<dyn Converter<C::Key>>,
    value: Rc<dyn Converter<C::Value>>,
}

impl<C: DictionaryModel> DictionaryConverter<C> {
    /// Build a converter for `C`, delegating keys to `key` and values to
    /// `value`.
    pub fn new(key: Rc<dyn Converter<C::Key>>, value: Rc<dyn Converter<C::Value>>) -> Self {
        Self { key, value }
    }
}

impl<C: DictionaryModel> Converter<C> for DictionaryConverter<C> {
    fn write(&self, w: &mut Writer<'_>, value: &C, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        let entries = value.entries();
        w.write_map_header(entries.len() as u32);
        for (index, (k, v)) in entries.into_iter().enumerate() {
            self.key.write(w, k, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}].key")))?;
            self.value.write(w, v, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}].value")))?;
        }
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<C, Error> {
        let _guard = ctx.depth_step()?;
        let len = r.read_map_header()?;
        if len as u64 > usize::MAX as u64 {
            return Err(ErrorKind::OutOfRange { from: len as i128, to: "usize" }.into());
        }
        let mut entries = Vec::with_capacity(len as usize);
        for index in 0..len {
            let k = self.key.read(r, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}].key")))?;
            let v = self.value.read(r, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}].value")))?;
            entries.push((k, v));
        }
        Ok(C::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::converter::{StringConverter, UintConverter};
    use crate::io::{Position, SegmentedBuffer, VecSink};
    use crate::shape::{HasShape, Shape, ShapeKind};
    use alloc::string::String;
    use core::any::TypeId;

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Scores(Vec<(String, u32)>);

    impl HasShape for Scores {
        fn shape() -> Shape {
            Shape { id: TypeId::of::<Scores>(), name: "Scores", kind: ShapeKind::Dictionary }
        }
    }

    impl DictionaryModel for Scores {
        type Key = String;
        type Value = u32;

        fn len(&self) -> usize {
            self.0.len()
        }

        fn entries(&self) -> Vec<(&String, &u32)> {
            self.0.iter().map(|(k, v)| (k, v)).collect()
        }

        fn from_entries(entries: Vec<(String, u32)>) -> Self {
            Scores(entries)
        }
    }

    #[test]
    fn round_trips_pairs_in_order() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = DictionaryConverter::<Scores>::new(Rc::new(StringConverter), Rc::new(UintConverter::<u32>::default()));
        let value = Scores(alloc::vec![(String::from("a"), 1), (String::from("b"), 2)]);
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &value, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), value);
    }
}
