//! Per-instance, immutable serializer configuration.

#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;
#[cfg(feature = "alloc")]
use alloc::string::String;

/// Controls which members an object converter emits on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultValuePolicy {
    /// Skip members that equal their declared default.
    #[default]
    Never,
    /// Emit every member regardless of its value.
    Always,
    /// Emit members marked required, plus any differing from their default.
    Required,
}

/// Immutable policy set shared by every call a [`crate::serializer::Serializer`]
/// instance makes. Built once via [`SerializerOptions::default`] and
/// `with_*` chaining, an immutable builder style rather than a global/static
/// config.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializerOptions {
    pub(crate) max_depth: u32,
    pub(crate) preserve_references: bool,
    pub(crate) intern_strings: bool,
    pub(crate) serialize_default_values: DefaultValuePolicy,
    pub(crate) perf_over_schema_stability: bool,
    pub(crate) disable_hardware_acceleration: bool,
    pub(crate) ignore_key_attributes: bool,
    pub(crate) object_reference_extension_type: i8,
    #[cfg(feature = "alloc")]
    pub(crate) starting_context: BTreeMap<String, i64>,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            preserve_references: false,
            intern_strings: false,
            serialize_default_values: DefaultValuePolicy::Never,
            perf_over_schema_stability: false,
            disable_hardware_acceleration: false,
            ignore_key_attributes: false,
            object_reference_extension_type: 100,
            #[cfg(feature = "alloc")]
            starting_context: BTreeMap::new(),
        }
    }
}

impl SerializerOptions {
    /// The recursion depth allowed before a `write`/`read` fails with
    /// `DepthExceeded`.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Whether shared object identity is preserved across a round-trip.
    pub fn preserve_references(&self) -> bool {
        self.preserve_references
    }

    /// The extension type code reserved for reference back-references.
    pub fn object_reference_extension_type(&self) -> i8 {
        self.object_reference_extension_type
    }

    /// Set the recursion depth limit.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Turn reference preservation on or off.
    pub fn with_preserve_references(mut self, on: bool) -> Self {
        self.preserve_references = on;
        self
    }

    /// Turn string interning on or off.
    pub fn with_intern_strings(mut self, on: bool) -> Self {
        self.intern_strings = on;
        self
    }

    /// Select which members the object converter emits.
    pub fn with_serialize_default_values(mut self, policy: DefaultValuePolicy) -> Self {
        self.serialize_default_values = policy;
        self
    }

    /// Permit array layout for objects with no explicit keys.
    pub fn with_perf_over_schema_stability(mut self, on: bool) -> Self {
        self.perf_over_schema_stability = on;
        self
    }

    /// Forbid the hardware-accelerated bulk primitive-array path.
    pub fn with_disable_hardware_acceleration(mut self, on: bool) -> Self {
        self.disable_hardware_acceleration = on;
        self
    }

    /// Force map layout regardless of explicit key attributes. Takes
    /// precedence over [`Self::with_perf_over_schema_stability`].
    pub fn with_ignore_key_attributes(mut self, on: bool) -> Self {
        self.ignore_key_attributes = on;
        self
    }

    /// Set the extension type code used for reference back-references.
    pub fn with_object_reference_extension_type(mut self, code: i8) -> Self {
        self.object_reference_extension_type = code;
        self
    }

    /// Pre-populate the starting context dictionary a converter may read via
    /// its [`crate::context::SerializationContext`].
    #[cfg(feature = "alloc")]
    pub fn with_context_value(mut self, key: impl Into<String>, value: i64) -> Self {
        self.starting_context.insert(key.into(), value);
        self
    }

    /// Whether the object converter should use array layout for `members`
    /// given their explicit-key coverage.
    pub(crate) fn use_array_layout(&self, all_members_keyed: bool) -> bool {
        if self.ignore_key_attributes {
            return false;
        }
        all_members_keyed || self.perf_over_schema_stability
    }
}
