//! Integration tests for world indexing.

use sb_core::world::{CIRCUIT_COMPONENTS_PROPERTY, POWER_CIRCUIT_TYPE};
use sb_core::{CoreError, NO_CIRCUIT, World};
use serde_json::json;

fn power_save() -> serde_json::Value {
    json!({
        "header": { "saveName": "Northern Forest", "mapName": "Persistent_Level", "saveDateTime": "1700000000" },
        "levels": {
            "Persistent_Level": {
                "name": "Persistent_Level",
                "objects": [
                    {
                        "typePath": POWER_CIRCUIT_TYPE,
                        "instanceName": "Persistent_Level:PersistentLevel.CircuitSubsystem.FGPowerCircuit_3",
                        "properties": {
                            "mCircuitID": { "type": "Int32Property", "ueType": "IntProperty", "name": "mCircuitID", "value": 3 },
                            "mComponents": { "type": "ObjectArrayProperty", "ueType": "ArrayProperty", "name": "mComponents", "subtype": "ObjectProperty", "values": [
                                { "levelName": "Persistent_Level", "pathName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.PowerConnection" }
                            ] },
                            "mFuture": { "type": "SetProperty<Vector>", "name": "mFuture", "values": [] }
                        }
                    },
                    {
                        "typePath": "/Game/FactoryGame/Buildable/Factory/ConstructorMk1/Build_ConstructorMk1.Build_ConstructorMk1_C",
                        "instanceName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1",
                        "components": [
                            { "levelName": "Persistent_Level", "pathName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.PowerConnection" },
                            { "levelName": "Persistent_Level", "pathName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.powerInfo" }
                        ],
                        "type": "SaveEntity"
                    }
                ],
                "collectables": []
            },
            "Level_Extra": {
                "name": "Level_Extra",
                "objects": [
                    {
                        "typePath": "/Script/FactoryGame.FGPowerConnectionComponent",
                        "instanceName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.PowerConnection",
                        "parentEntityName": "Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1",
                        "type": "SaveComponent"
                    }
                ]
            }
        }
    })
}

#[test]
fn decodes_and_indexes_a_save() {
    let world = World::from_json_str(&power_save().to_string()).unwrap();

    assert_eq!(world.header().save_name, "Northern Forest");
    assert_eq!(world.object_count(), 3);

    for entity in world.objects() {
        let found = world.get(entity.instance_name()).unwrap();
        assert_eq!(found.instance_name(), entity.instance_name());
    }

    let circuit = world
        .get("Persistent_Level:PersistentLevel.CircuitSubsystem.FGPowerCircuit_3")
        .unwrap();
    assert_eq!(circuit.properties().len(), 2);
    assert!(circuit.properties().object_array(CIRCUIT_COMPONENTS_PROPERTY).is_some());

    assert_eq!(
        world.circuit_id("Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.PowerConnection"),
        3
    );
    assert_eq!(
        world.circuit_id("Persistent_Level:PersistentLevel.Build_ConstructorMk1_C_1.powerInfo"),
        NO_CIRCUIT
    );
}

#[test]
fn circuit_with_malformed_member_list_fails_the_whole_build() {
    let mut save = power_save();
    save["levels"]["Persistent_Level"]["objects"][0]["properties"]["mComponents"]["values"] =
        json!("not a list");

    let err = World::from_json_str(&save.to_string()).unwrap_err();
    assert!(matches!(err, CoreError::MissingCircuitComponents { .. }));
    assert!(err.to_string().contains("FGPowerCircuit_3"));
}

#[test]
fn malformed_document_produces_no_world() {
    let mut save = power_save();
    save["levels"]["Persistent_Level"]["objects"] = json!({ "not": "a list" });

    let err = World::from_json_str(&save.to_string()).unwrap_err();
    assert!(matches!(err, CoreError::Malformed(_)));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("save.json");
    std::fs::write(&path, power_save().to_string()).unwrap();

    let world = World::load(&path).unwrap();
    assert_eq!(world.document().levels.len(), 2);
    assert_eq!(world.circuits().count(), 1);
}

#[test]
fn struct_payloads_keep_field_order_through_the_world() {
    let source = r#"{
        "levels": { "Persistent_Level": { "name": "Persistent_Level", "objects": [
            {
                "typePath": "/Game/FactoryGame/Buildable/Factory/StorageContainerMk1/Build_StorageContainerMk1.Build_StorageContainerMk1_C",
                "instanceName": "Persistent_Level:PersistentLevel.Build_StorageContainerMk1_C_4",
                "properties": {
                    "mLocation": { "type": "StructProperty", "name": "mLocation", "subtype": "Vector",
                                   "value": { "z": 3.0, "y": 2.0, "x": 1.0 } },
                    "mStack": { "type": "StructProperty", "name": "mStack", "subtype": "InventoryStack",
                                "value": { "b": 1, "a": 2, "b": 3 } }
                }
            }
        ] } }
    }"#;
    let world = World::from_json_str(source).unwrap();
    let container = world
        .get("Persistent_Level:PersistentLevel.Build_StorageContainerMk1_C_4")
        .unwrap();

    let location = container.properties().structure("mLocation").unwrap();
    let keys: Vec<_> = location.value.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "y", "x"]);

    let stack = container.properties().structure("mStack").unwrap();
    let fields = stack.value.as_object().unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), ["b", "a"]);
    assert_eq!(fields.get("b").and_then(|v| v.as_i64()), Some(3));

    let written = serde_json::to_string(&container.properties()).unwrap();
    let z = written.find("\"z\"").unwrap();
    let x = written.find("\"x\"").unwrap();
    assert!(z < x, "fields reordered on write: {written}");
}
