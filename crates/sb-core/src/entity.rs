use serde::{Deserialize, Serialize};

use crate::property::{Property, PropertyBag};
use crate::value::{Value, null_as_default};

/// A reference to another object: the level it lives in and its path name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReference {
    /// Level holding the referenced object.
    pub level_name: String,
    /// Fully-qualified path of the referenced object.
    pub path_name: String,
}

impl ObjectReference {
    /// Create a reference.
    pub fn new(level_name: impl Into<String>, path_name: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            path_name: path_name.into(),
        }
    }
}

/// A 3D vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// A rotation quaternion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// W component.
    pub w: f64,
}

/// Placement of an object in the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    /// Position.
    pub translation: Vector3,
    /// Orientation.
    pub rotation: Quaternion,
    /// Per-axis scale.
    #[serde(rename = "scale3D")]
    pub scale_3d: Vector3,
}

/// Record fields that are carried through but play no part in indexing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDetails {
    /// Root object the record was saved under.
    pub root_object: String,
    /// Engine object flags.
    pub flags: i64,
    /// Class-specific extra data.
    pub special_properties: Value,
    /// Unparsed bytes following the properties.
    pub trailing_data: Vec<Value>,
    /// Per-object save version.
    pub save_custom_version: i64,
    /// Whether references should migrate to the persistent level.
    pub should_migrate_object_refs_to_persistent: bool,
    /// Record type, `SaveEntity` or `SaveComponent`.
    pub record_type: String,
    /// Whether the transform must be applied on load.
    pub need_transform: bool,
    /// Whether the object was placed in the level by the designers.
    pub was_placed_in_level: bool,
    /// Outer object reference.
    pub parent_object: ObjectReference,
    /// Placement in the world.
    pub transform: Transform,
}

/// A game object: a building, a component, a circuit, or anything else the
/// save records.
///
/// Identity and hierarchy are read-only. The short `instance` and
/// `simple_type` names are derived once, when the object is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GameObjectRecord", into = "GameObjectRecord")]
pub struct GameObject {
    type_path: String,
    instance_name: String,
    parent_entity_name: String,
    components: Vec<ObjectReference>,
    properties: PropertyBag,
    /// Remaining record fields.
    pub details: ObjectDetails,
    instance: String,
    simple_type: String,
}

impl GameObject {
    /// Create an object with the given class and instance path.
    pub fn new(type_path: impl Into<String>, instance_name: impl Into<String>) -> Self {
        let type_path = type_path.into();
        let instance_name = instance_name.into();
        Self {
            instance: last_segment(&instance_name).to_owned(),
            simple_type: last_segment(&type_path).to_owned(),
            type_path,
            instance_name,
            parent_entity_name: String::new(),
            components: Vec::new(),
            properties: PropertyBag::new(),
            details: ObjectDetails::default(),
        }
    }

    /// Set the owning entity.
    pub fn with_parent(mut self, parent_entity_name: impl Into<String>) -> Self {
        self.parent_entity_name = parent_entity_name.into();
        self
    }

    /// Append a component reference.
    pub fn with_component(mut self, component: ObjectReference) -> Self {
        self.components.push(component);
        self
    }

    /// Add a property under its declared name.
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.insert(property.name().to_owned(), property);
        self
    }

    /// Fully-qualified class path, e.g. `/Script/FactoryGame.FGPowerCircuit`.
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// Fully-qualified instance path.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Instance name of the owning entity. Empty for top-level objects.
    pub fn parent_entity_name(&self) -> &str {
        &self.parent_entity_name
    }

    /// References to this object's components, in saved order.
    pub fn components(&self) -> &[ObjectReference] {
        &self.components
    }

    /// Decoded properties.
    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// Last `.`-separated segment of the instance name.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Last `.`-separated segment of the type path.
    pub fn simple_type(&self) -> &str {
        &self.simple_type
    }
}

/// The final `.`-separated segment of `path`; the whole string when there is
/// no separator.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Wire shape of a game object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GameObjectRecord {
    type_path: String,
    root_object: String,
    instance_name: String,
    flags: i64,
    properties: PropertyBag,
    special_properties: Value,
    #[serde(deserialize_with = "null_as_default")]
    trailing_data: Vec<Value>,
    save_custom_version: i64,
    should_migrate_object_refs_to_persistent: bool,
    #[serde(deserialize_with = "null_as_default")]
    parent_entity_name: String,
    #[serde(rename = "type")]
    record_type: String,
    need_transform: bool,
    was_placed_in_level: bool,
    #[serde(deserialize_with = "null_as_default")]
    parent_object: ObjectReference,
    #[serde(deserialize_with = "null_as_default")]
    transform: Transform,
    #[serde(deserialize_with = "null_as_default")]
    components: Vec<ObjectReference>,
}

impl From<GameObjectRecord> for GameObject {
    fn from(record: GameObjectRecord) -> Self {
        let mut object = Self::new(record.type_path, record.instance_name);
        object.parent_entity_name = record.parent_entity_name;
        object.components = record.components;
        object.properties = record.properties;
        object.details = ObjectDetails {
            root_object: record.root_object,
            flags: record.flags,
            special_properties: record.special_properties,
            trailing_data: record.trailing_data,
            save_custom_version: record.save_custom_version,
            should_migrate_object_refs_to_persistent: record
                .should_migrate_object_refs_to_persistent,
            record_type: record.record_type,
            need_transform: record.need_transform,
            was_placed_in_level: record.was_placed_in_level,
            parent_object: record.parent_object,
            transform: record.transform,
        };
        object
    }
}

impl From<GameObject> for GameObjectRecord {
    fn from(object: GameObject) -> Self {
        let details = object.details;
        Self {
            type_path: object.type_path,
            root_object: details.root_object,
            instance_name: object.instance_name,
            flags: details.flags,
            properties: object.properties,
            special_properties: details.special_properties,
            trailing_data: details.trailing_data,
            save_custom_version: details.save_custom_version,
            should_migrate_object_refs_to_persistent: details
                .should_migrate_object_refs_to_persistent,
            parent_entity_name: object.parent_entity_name,
            record_type: details.record_type,
            need_transform: details.need_transform,
            was_placed_in_level: details.was_placed_in_level,
            parent_object: details.parent_object,
            transform: details.transform,
            components: object.components,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::property::FloatProperty;

    #[test]
    fn derives_instance_and_simple_type() {
        let object = GameObject::new(
            "/Game/FactoryGame/Buildable/Factory/GeneratorFuel/Build_GeneratorFuel.Build_GeneratorFuel_C",
            "Persistent_Level:PersistentLevel.Build_GeneratorFuel_C_2",
        );
        assert_eq!(object.instance(), "Build_GeneratorFuel_C_2");
        assert_eq!(
            object.instance_name(),
            "Persistent_Level:PersistentLevel.Build_GeneratorFuel_C_2"
        );
        assert_eq!(object.simple_type(), "Build_GeneratorFuel_C");
    }

    #[test]
    fn no_separator_yields_whole_string() {
        let object = GameObject::new("Plain", "");
        assert_eq!(object.simple_type(), "Plain");
        assert_eq!(object.instance(), "");
    }

    #[test]
    fn decodes_record_fields() {
        let object: GameObject = serde_json::from_value(json!({
            "typePath": "/Script/FactoryGame.FGPowerInfoComponent",
            "rootObject": "Persistent_Level",
            "instanceName": "Persistent_Level:PersistentLevel.Build_GeneratorFuel_C_2.powerInfo",
            "flags": 2883584,
            "properties": {
                "mDynamicProductionCapacity": { "type": "FloatProperty", "name": "mDynamicProductionCapacity", "value": 75.0 }
            },
            "specialProperties": { "type": "EmptySpecialProperties" },
            "trailingData": [],
            "saveCustomVersion": 46,
            "shouldMigrateObjectRefsToPersistent": false,
            "parentEntityName": "Persistent_Level:PersistentLevel.Build_GeneratorFuel_C_2",
            "type": "SaveComponent"
        }))
        .unwrap();

        assert_eq!(object.instance(), "powerInfo");
        assert_eq!(object.simple_type(), "FGPowerInfoComponent");
        assert_eq!(
            object.parent_entity_name(),
            "Persistent_Level:PersistentLevel.Build_GeneratorFuel_C_2"
        );
        assert!(object.components().is_empty());
        assert_eq!(object.details.record_type, "SaveComponent");
        assert_eq!(object.details.save_custom_version, 46);
        assert_eq!(
            object
                .properties()
                .float("mDynamicProductionCapacity")
                .map(|p| p.value),
            Some(75.0)
        );
    }

    #[test]
    fn null_lists_and_references_default() {
        let object: GameObject = serde_json::from_value(json!({
            "typePath": "/Script/FactoryGame.FGPowerCircuit",
            "instanceName": "Persistent_Level:PersistentLevel.CircuitSubsystem.FGPowerCircuit_1",
            "components": null,
            "parentObject": null,
            "trailingData": null,
            "parentEntityName": null
        }))
        .unwrap();
        assert!(object.components().is_empty());
        assert_eq!(object.parent_entity_name(), "");
        assert_eq!(object.details.parent_object, ObjectReference::default());
    }

    #[test]
    fn wrong_component_shape_fails_the_record() {
        let result = serde_json::from_value::<GameObject>(json!({
            "typePath": "/Script/FactoryGame.FGBuildable",
            "instanceName": "A",
            "components": "not a list"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn builder_sets_hierarchy_and_properties() {
        let object = GameObject::new("/Script/FactoryGame.FGPowerInfoComponent", "L.Build_X.info")
            .with_parent("L.Build_X")
            .with_component(ObjectReference::new("L", "L.Build_X.conn"))
            .with_property(Property::Float(FloatProperty {
                name: "mTargetConsumption".into(),
                value: 4.0,
                ..Default::default()
            }));
        assert_eq!(object.parent_entity_name(), "L.Build_X");
        assert_eq!(object.components()[0].path_name, "L.Build_X.conn");
        assert!(object.properties().float("mTargetConsumption").is_some());
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let object = GameObject::new("/Script/A.B", "L:P.B_1").with_parent("L:P.Owner");
        let out = serde_json::to_value(&object).unwrap();
        assert_eq!(out["typePath"], "/Script/A.B");
        assert_eq!(out["instanceName"], "L:P.B_1");
        assert_eq!(out["parentEntityName"], "L:P.Owner");
        assert!(out.get("instance").is_none());
    }

    proptest! {
        #[test]
        fn last_segment_never_contains_separator(path in "[a-zA-Z0-9_.:/]{0,40}") {
            let segment = last_segment(&path);
            prop_assert!(!segment.contains('.'));
            prop_assert!(path.ends_with(segment));
        }

        #[test]
        fn last_segment_of_dotless_path_is_identity(path in "[a-zA-Z0-9_:/]{0,40}") {
            prop_assert_eq!(last_segment(&path), path.as_str());
        }
    }
}
