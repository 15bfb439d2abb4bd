use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::entity::ObjectReference;
use crate::ordered::OrderedMap;
use crate::value::Value;

/// The property shapes a save document can carry, one per `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// `BoolProperty`
    Bool,
    /// `Int32Property`
    Int32,
    /// `Uint32Property`
    Uint32,
    /// `FloatProperty`
    Float,
    /// `StrProperty`
    Str,
    /// `ObjectProperty`
    Object,
    /// `ObjectArrayProperty`
    ObjectArray,
    /// `EnumProperty`
    Enum,
    /// `ByteProperty`
    Byte,
    /// `StructProperty`
    Struct,
    /// `StructArrayProperty`
    StructArray,
    /// `MapProperty`
    Map,
    /// `Uint32SetProperty`
    Uint32Set,
}

impl PropertyKind {
    /// Every kind, in declaration order.
    pub const ALL: [PropertyKind; 13] = [
        Self::Bool,
        Self::Int32,
        Self::Uint32,
        Self::Float,
        Self::Str,
        Self::Object,
        Self::ObjectArray,
        Self::Enum,
        Self::Byte,
        Self::Struct,
        Self::StructArray,
        Self::Map,
        Self::Uint32Set,
    ];

    /// The `type` tag this kind is written with.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bool => "BoolProperty",
            Self::Int32 => "Int32Property",
            Self::Uint32 => "Uint32Property",
            Self::Float => "FloatProperty",
            Self::Str => "StrProperty",
            Self::Object => "ObjectProperty",
            Self::ObjectArray => "ObjectArrayProperty",
            Self::Enum => "EnumProperty",
            Self::Byte => "ByteProperty",
            Self::Struct => "StructProperty",
            Self::StructArray => "StructArrayProperty",
            Self::Map => "MapProperty",
            Self::Uint32Set => "Uint32SetProperty",
        }
    }

    /// Look up a kind by its `type` tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// A property whose payload is a single `value` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalarProperty<T> {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// The decoded payload.
    pub value: T,
}

/// `BoolProperty`.
pub type BoolProperty = ScalarProperty<bool>;
/// `Int32Property`.
pub type Int32Property = ScalarProperty<i32>;
/// `Uint32Property`.
pub type Uint32Property = ScalarProperty<u32>;
/// `FloatProperty`. Saves store both single and double precision here.
pub type FloatProperty = ScalarProperty<f64>;
/// `StrProperty`.
pub type StrProperty = ScalarProperty<String>;
/// `ObjectProperty`.
pub type ObjectProperty = ScalarProperty<ObjectReference>;
/// `EnumProperty`.
pub type EnumProperty = ScalarProperty<EnumValue>;
/// `ByteProperty`.
pub type ByteProperty = ScalarProperty<ByteValue>;

/// Payload of an enum property: the enum type and the selected variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumValue {
    /// The enum type name.
    pub name: String,
    /// The selected variant.
    pub value: String,
}

/// Payload of a byte property: a small integer tagged with its enum type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ByteValue {
    /// The byte's enum type, or `"None"` for plain bytes.
    #[serde(rename = "type")]
    pub kind: String,
    /// The numeric value.
    pub value: i64,
}

/// `ObjectArrayProperty`: a list of references to other objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectArrayProperty {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// Element type of the array.
    pub subtype: String,
    /// The referenced objects, in saved order.
    pub values: Vec<ObjectReference>,
}

/// `StructProperty`: an engine struct saved as a free-form field bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructProperty {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// The struct type, e.g. `Vector` or `InventoryStack`.
    pub subtype: String,
    /// The struct payload.
    pub value: Value,
}

/// `StructArrayProperty`: a list of engine structs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructArrayProperty {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// Element struct type.
    pub subtype: String,
    /// Field name to field type for the element struct.
    pub struct_value_fields: OrderedMap<String>,
    /// The elements.
    pub values: Vec<Value>,
}

/// `MapProperty`: key/value entries saved as a list of field bags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapProperty {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// Engine type of the keys.
    pub key_type: String,
    /// Engine type of the values.
    pub value_type: String,
    /// Serialization mode of the map.
    pub mode_type: i32,
    /// Opaque mode data.
    pub mode_unk2: String,
    /// Opaque mode data.
    pub mode_unk3: String,
    /// The entries, in saved order.
    pub values: Vec<Value>,
}

/// `Uint32SetProperty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Uint32SetProperty {
    /// The engine's own type name for the property.
    pub ue_type: String,
    /// The declared property name.
    pub name: String,
    /// Element type of the set.
    pub subtype: String,
    /// The members.
    pub values: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A decoded property: one variant per [`PropertyKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Property {
    /// A boolean.
    #[serde(rename = "BoolProperty")]
    Bool(BoolProperty),
    /// A signed 32-bit integer.
    #[serde(rename = "Int32Property")]
    Int32(Int32Property),
    /// An unsigned 32-bit integer.
    #[serde(rename = "Uint32Property")]
    Uint32(Uint32Property),
    /// A floating-point number.
    #[serde(rename = "FloatProperty")]
    Float(FloatProperty),
    /// A string.
    #[serde(rename = "StrProperty")]
    Str(StrProperty),
    /// A reference to another object.
    #[serde(rename = "ObjectProperty")]
    Object(ObjectProperty),
    /// A list of references to other objects.
    #[serde(rename = "ObjectArrayProperty")]
    ObjectArray(ObjectArrayProperty),
    /// An enum variant.
    #[serde(rename = "EnumProperty")]
    Enum(EnumProperty),
    /// A typed byte.
    #[serde(rename = "ByteProperty")]
    Byte(ByteProperty),
    /// A free-form struct.
    #[serde(rename = "StructProperty")]
    Struct(StructProperty),
    /// A list of free-form structs.
    #[serde(rename = "StructArrayProperty")]
    StructArray(StructArrayProperty),
    /// A map saved as a list of entries.
    #[serde(rename = "MapProperty")]
    Map(MapProperty),
    /// A set of unsigned 32-bit integers.
    #[serde(rename = "Uint32SetProperty")]
    Uint32Set(Uint32SetProperty),
}

impl Property {
    /// Decode a raw entry into the shape named by `kind`.
    ///
    /// Missing fields take their zero value; a field of the wrong JSON type
    /// is an error.
    pub fn decode(kind: PropertyKind, raw: serde_json::Value) -> serde_json::Result<Self> {
        use serde_json::from_value;

        Ok(match kind {
            PropertyKind::Bool => Self::Bool(from_value(raw)?),
            PropertyKind::Int32 => Self::Int32(from_value(raw)?),
            PropertyKind::Uint32 => Self::Uint32(from_value(raw)?),
            PropertyKind::Float => Self::Float(from_value(raw)?),
            PropertyKind::Str => Self::Str(from_value(raw)?),
            PropertyKind::Object => Self::Object(from_value(raw)?),
            PropertyKind::ObjectArray => Self::ObjectArray(from_value(raw)?),
            PropertyKind::Enum => Self::Enum(from_value(raw)?),
            PropertyKind::Byte => Self::Byte(from_value(raw)?),
            PropertyKind::Struct => Self::Struct(from_value(raw)?),
            PropertyKind::StructArray => Self::StructArray(from_value(raw)?),
            PropertyKind::Map => Self::Map(from_value(raw)?),
            PropertyKind::Uint32Set => Self::Uint32Set(from_value(raw)?),
        })
    }

    /// The kind of this property.
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int32(_) => PropertyKind::Int32,
            Self::Uint32(_) => PropertyKind::Uint32,
            Self::Float(_) => PropertyKind::Float,
            Self::Str(_) => PropertyKind::Str,
            Self::Object(_) => PropertyKind::Object,
            Self::ObjectArray(_) => PropertyKind::ObjectArray,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Byte(_) => PropertyKind::Byte,
            Self::Struct(_) => PropertyKind::Struct,
            Self::StructArray(_) => PropertyKind::StructArray,
            Self::Map(_) => PropertyKind::Map,
            Self::Uint32Set(_) => PropertyKind::Uint32Set,
        }
    }

    /// The declared property name.
    pub fn name(&self) -> &str {
        self.header().1
    }

    /// The engine's own type name for the property.
    pub fn ue_type(&self) -> &str {
        self.header().0
    }

    fn header(&self) -> (&str, &str) {
        match self {
            Self::Bool(p) => (&p.ue_type, &p.name),
            Self::Int32(p) => (&p.ue_type, &p.name),
            Self::Uint32(p) => (&p.ue_type, &p.name),
            Self::Float(p) => (&p.ue_type, &p.name),
            Self::Str(p) => (&p.ue_type, &p.name),
            Self::Object(p) => (&p.ue_type, &p.name),
            Self::ObjectArray(p) => (&p.ue_type, &p.name),
            Self::Enum(p) => (&p.ue_type, &p.name),
            Self::Byte(p) => (&p.ue_type, &p.name),
            Self::Struct(p) => (&p.ue_type, &p.name),
            Self::StructArray(p) => (&p.ue_type, &p.name),
            Self::Map(p) => (&p.ue_type, &p.name),
            Self::Uint32Set(p) => (&p.ue_type, &p.name),
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyBag
// ---------------------------------------------------------------------------

/// The properties of one game object, grouped by kind and keyed by name.
///
/// A name appears at most once across all kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    by_kind: BTreeMap<PropertyKind, BTreeMap<String, Property>>,
}

macro_rules! typed_getter {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $shape:ty) => {
        $(#[$doc])*
        pub fn $fn_name(&self, name: &str) -> Option<&$shape> {
            match self.get(PropertyKind::$variant, name)? {
                Property::$variant(p) => Some(p),
                _ => None,
            }
        }
    };
}

impl PropertyBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw entries into a bag.
    ///
    /// Each entry is dispatched on its `type` tag. An entry with an unknown
    /// tag, or one that does not fit the shape its tag names, is dropped and
    /// decoding continues with the next entry.
    pub fn decode(raw: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut bag = Self::new();
        for (name, entry) in raw {
            let Some(tag) = entry.get("type").and_then(serde_json::Value::as_str) else {
                trace!(property = %name, "dropping property without a type tag");
                continue;
            };
            let Some(kind) = PropertyKind::from_tag(tag) else {
                trace!(property = %name, tag, "dropping property with unknown type tag");
                continue;
            };
            match Property::decode(kind, entry) {
                Ok(property) => {
                    bag.insert(name, property);
                }
                Err(err) => {
                    trace!(property = %name, %kind, error = %err, "dropping malformed property");
                }
            }
        }
        bag
    }

    /// Insert a property under `name`, replacing any property of any kind
    /// previously stored under that name.
    pub fn insert(&mut self, name: impl Into<String>, property: Property) -> Option<Property> {
        let name = name.into();
        let previous = self.remove(&name);
        self.by_kind
            .entry(property.kind())
            .or_default()
            .insert(name, property);
        previous
    }

    /// Remove the property stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let kind = self
            .by_kind
            .iter()
            .find_map(|(kind, props)| props.contains_key(name).then_some(*kind))?;
        let props = self.by_kind.get_mut(&kind)?;
        let removed = props.remove(name);
        if props.is_empty() {
            self.by_kind.remove(&kind);
        }
        removed
    }

    /// Look up a property of a given kind by name.
    pub fn get(&self, kind: PropertyKind, name: &str) -> Option<&Property> {
        self.by_kind.get(&kind)?.get(name)
    }

    /// Iterate the properties of one kind, ordered by name.
    pub fn of_kind(&self, kind: PropertyKind) -> impl Iterator<Item = (&str, &Property)> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flat_map(|props| props.iter().map(|(n, p)| (n.as_str(), p)))
    }

    /// Iterate all properties, grouped by kind and ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.by_kind
            .values()
            .flat_map(|props| props.iter().map(|(n, p)| (n.as_str(), p)))
    }

    /// Total number of properties.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(BTreeMap::len).sum()
    }

    /// Whether the bag holds no properties.
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    typed_getter!(
        /// A boolean property by name.
        bool, Bool, BoolProperty
    );
    typed_getter!(
        /// A signed 32-bit integer property by name.
        int32, Int32, Int32Property
    );
    typed_getter!(
        /// An unsigned 32-bit integer property by name.
        uint32, Uint32, Uint32Property
    );
    typed_getter!(
        /// A float property by name.
        float, Float, FloatProperty
    );
    typed_getter!(
        /// A string property by name.
        str, Str, StrProperty
    );
    typed_getter!(
        /// An object reference property by name.
        object, Object, ObjectProperty
    );
    typed_getter!(
        /// An object reference array property by name.
        object_array, ObjectArray, ObjectArrayProperty
    );
    typed_getter!(
        /// An enum property by name.
        enumeration, Enum, EnumProperty
    );
    typed_getter!(
        /// A byte property by name.
        byte, Byte, ByteProperty
    );
    typed_getter!(
        /// A struct property by name.
        structure, Struct, StructProperty
    );
    typed_getter!(
        /// A struct array property by name.
        struct_array, StructArray, StructArrayProperty
    );
    typed_getter!(
        /// A map property by name.
        map, Map, MapProperty
    );
    typed_getter!(
        /// A uint32 set property by name.
        uint32_set, Uint32Set, Uint32SetProperty
    );
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let by_name: BTreeMap<&str, &Property> = self.iter().collect();
        by_name.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(raw.map(Self::decode).unwrap_or_default())
    }
}
