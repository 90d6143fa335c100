//! The converter for [`ObjectModel`] types: map-layout (name-keyed) or
//! array-layout (index-keyed) structures with a fixed, declared member set.

use alloc::string::String;
use alloc::vec::Vec;

use super::Converter;
use crate::config::DefaultValuePolicy;
use crate::context::SerializationContext;
use crate::error::{ContextualError, Error, ErrorKind};
use crate::reader::Reader;
use crate::shape::{MemberDescriptor, ObjectModel, PartialObject};
use crate::writer::Writer;

/// Which wire position an unused-data-packet entry was captured at, so the
/// declared sink member can report it back the same way on a later write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnusedDataKey {
    /// Captured under a map-layout member name.
    Name(String),
    /// Captured under an array-layout index beyond the declared members.
    Index(u32),
}

/// One member skipped during a read because no declared member claimed it,
/// retained verbatim so a later write can merge it back in at the same name
/// or index (see [`MemberDescriptor::is_unused_data_sink`] and
/// [`ObjectModel::unused_data`](crate::shape::ObjectModel::unused_data)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedDataEntry {
    /// Where this entry was found.
    pub key: UnusedDataKey,
    /// Its raw, unparsed msgpack bytes.
    pub raw: Vec<u8>,
}

/// Converts any [`ObjectModel`] type, choosing array or map layout per
/// [`crate::config::SerializerOptions::use_array_layout`] and the type's
/// declared keys.
pub struct ObjectConverter<O> {
    _marker: core::marker::PhantomData<fn() -> O>,
}

impl<O: ObjectModel> Default for ObjectConverter<O> {
    fn default() -> Self {
        Self { _marker: core::marker::PhantomData }
    }
}

impl<O: ObjectModel> ObjectConverter<O> {
    /// A converter for `O`. Stateless; `O::MEMBERS` supplies everything it
    /// needs.
    pub fn new() -> Self {
        Self::default()
    }

    fn should_emit(&self, member: &MemberDescriptor<O>, value: &O, policy: DefaultValuePolicy) -> bool {
        match policy {
            DefaultValuePolicy::Always => true,
            DefaultValuePolicy::Never => !(member.is_default)(value),
            DefaultValuePolicy::Required => member.required || !(member.is_default)(value),
        }
    }

    fn all_members_keyed(&self) -> bool {
        O::MEMBERS.iter().filter(|m| !m.is_unused_data_sink).all(|m| m.explicit_key.is_some())
    }
}

impl<O: ObjectModel> Converter<O> for ObjectConverter<O> {
    fn write(&self, w: &mut Writer<'_>, value: &O, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        let policy = ctx.options().serialize_default_values;
        if ctx.options().use_array_layout(self.all_members_keyed()) {
            self.write_array_layout(w, value, ctx, policy)
        } else {
            self.write_map_layout(w, value, ctx, policy)
        }
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<O, Error> {
        let _guard = ctx.depth_step()?;
        if ctx.options().use_array_layout(self.all_members_keyed()) {
            self.read_array_layout(r, ctx)
        } else {
            self.read_map_layout(r, ctx)
        }
    }
}

impl<O: ObjectModel> ObjectConverter<O> {
    fn write_map_layout(
        &self,
        w: &mut Writer<'_>,
        value: &O,
        ctx: &SerializationContext,
        policy: DefaultValuePolicy,
    ) -> Result<(), Error> {
        let emitted: Vec<&MemberDescriptor<O>> =
            O::MEMBERS.iter().filter(|m| !m.is_unused_data_sink && self.should_emit(m, value, policy)).collect();
        let unused = value.unused_data().unwrap_or(&[]);
        let merged: Vec<&UnusedDataEntry> = unused
            .iter()
            .filter(|e| match &e.key {
                UnusedDataKey::Name(name) => !emitted.iter().any(|m| m.name == name),
                UnusedDataKey::Index(_) => false,
            })
            .collect();
        w.write_map_header((emitted.len() + merged.len()) as u32);
        for member in emitted {
            w.write_string(member.name);
            (member.write)(value, w, ctx).map_err(|e| e.enclose(member.name))?;
        }
        for entry in merged {
            if let UnusedDataKey::Name(name) = &entry.key {
                w.write_string(name);
            }
            w.write_raw(&entry.raw);
        }
        Ok(())
    }

    fn write_array_layout(
        &self,
        w: &mut Writer<'_>,
        value: &O,
        ctx: &SerializationContext,
        policy: DefaultValuePolicy,
    ) -> Result<(), Error> {
        let unused = value.unused_data().unwrap_or(&[]);
        let declared_highest = O::MEMBERS.iter().filter_map(|m| m.explicit_key).max();
        let unused_highest = unused.iter().filter_map(|e| match e.key {
            UnusedDataKey::Index(i) => Some(i),
            UnusedDataKey::Name(_) => None,
        }).max();
        let highest = match (declared_highest, unused_highest) {
            (None, None) => {
                w.write_array_header(0);
                return Ok(());
            }
            (a, b) => a.into_iter().chain(b).max().unwrap(),
        };
        w.write_array_header(highest + 1);
        for index in 0..=highest {
            if let Some(member) = O::MEMBERS.iter().find(|m| !m.is_unused_data_sink && m.explicit_key == Some(index)) {
                if self.should_emit(member, value, policy) {
                    (member.write)(value, w, ctx).map_err(|e| e.enclose(member.name))?;
                    continue;
                }
            }
            match unused.iter().find(|e| matches!(e.key, UnusedDataKey::Index(i) if i == index)) {
                Some(entry) => w.write_raw(&entry.raw),
                None => w.write_nil(),
            }
        }
        Ok(())
    }

    fn read_map_layout(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<O, Error> {
        let len = r.read_map_header()?;
        let mut partial = PartialObject::<O>::new();
        let mut unused = Vec::new();
        for _ in 0..len {
            let name = r.read_string(ctx)?.into_owned();
            match O::MEMBERS.iter().position(|m| !m.is_unused_data_sink && m.name == name) {
                Some(index) => (O::MEMBERS[index].read_into)(&mut partial, r, ctx)
                    .map_err(|e| e.enclose(O::MEMBERS[index].name))?,
                None => unused
                    .push(UnusedDataEntry { key: UnusedDataKey::Name(name.clone()), raw: r.read_raw(ctx).map_err(|e| e.enclose(&name))? }),
            }
        }
        self.finish(partial, unused)
    }

    fn read_array_layout(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<O, Error> {
        let len = r.read_array_header()?;
        let mut partial = PartialObject::<O>::new();
        let mut unused = Vec::new();
        for index in 0..len {
            match O::MEMBERS.iter().position(|m| !m.is_unused_data_sink && m.explicit_key == Some(index)) {
                Some(member_idx) => (O::MEMBERS[member_idx].read_into)(&mut partial, r, ctx)
                    .map_err(|e| e.enclose(O::MEMBERS[member_idx].name))?,
                None => unused.push(UnusedDataEntry {
                    key: UnusedDataKey::Index(index),
                    raw: r.read_raw(ctx).map_err(|e| e.enclose(&alloc::format!("[{index}]")))?,
                }),
            }
        }
        self.finish(partial, unused)
    }

    fn finish(&self, mut partial: PartialObject<O>, unused: Vec<UnusedDataEntry>) -> Result<O, Error> {
        if let Some(sink) = O::UNUSED_DATA_SINK {
            partial.set(sink, unused);
        }
        for (index, member) in O::MEMBERS.iter().enumerate() {
            if member.required && !partial.is_set(index) {
                return Err(ErrorKind::MissingRequiredMember { name: member.name }.into());
            }
        }
        O::build(partial)
    }
}
