use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::entity::GameObject;
use crate::error::{CoreError, CoreResult};
use crate::save::{Header, SaveDocument};

/// Type path of power circuit objects.
pub const POWER_CIRCUIT_TYPE: &str = "/Script/FactoryGame.FGPowerCircuit";
/// Object array property listing a circuit's member components.
pub const CIRCUIT_COMPONENTS_PROPERTY: &str = "mComponents";
/// Int32 property holding a circuit's numeric id.
pub const CIRCUIT_ID_PROPERTY: &str = "mCircuitID";
/// Circuit id reported when a component belongs to no known circuit.
pub const NO_CIRCUIT: i32 = -1;

/// Position of an object inside the document: level index, then object index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Slot {
    level: usize,
    object: usize,
}

/// An indexed, immutable snapshot of a decoded save.
///
/// Both indices store object positions rather than references, so they stay
/// valid for as long as the world exists. When several objects share an
/// instance name, or several circuits list the same component, the one that
/// comes later in document order wins.
#[derive(Debug, Clone)]
pub struct World {
    document: SaveDocument,
    by_instance: HashMap<String, Slot>,
    circuit_of: HashMap<String, Slot>,
}

impl World {
    /// Index a decoded document in a single pass.
    ///
    /// Fails if a power circuit has no member list.
    pub fn build(document: SaveDocument) -> CoreResult<Self> {
        let mut by_instance = HashMap::new();
        let mut circuit_of = HashMap::new();

        for (level, (_, entries)) in document.levels.iter().enumerate() {
            for (object, entity) in entries.objects.iter().enumerate() {
                let slot = Slot { level, object };
                by_instance.insert(entity.instance_name().to_owned(), slot);

                if entity.type_path() != POWER_CIRCUIT_TYPE {
                    continue;
                }
                let members = entity
                    .properties()
                    .object_array(CIRCUIT_COMPONENTS_PROPERTY)
                    .ok_or_else(|| CoreError::MissingCircuitComponents {
                        instance_name: entity.instance_name().to_owned(),
                        property: CIRCUIT_COMPONENTS_PROPERTY,
                    })?;
                for member in &members.values {
                    circuit_of.insert(member.path_name.clone(), slot);
                }
            }
        }

        debug!(
            levels = document.levels.len(),
            objects = by_instance.len(),
            circuit_members = circuit_of.len(),
            "indexed world"
        );

        Ok(Self {
            document,
            by_instance,
            circuit_of,
        })
    }

    /// Decode and index a document from JSON text.
    pub fn from_json_str(source: &str) -> CoreResult<Self> {
        Self::build(SaveDocument::from_json_str(source)?)
    }

    /// Read, decode, and index a document from disk.
    pub fn load(path: &Path) -> CoreResult<Self> {
        Self::build(SaveDocument::load(path)?)
    }

    /// The underlying document.
    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    /// Save metadata.
    pub fn header(&self) -> &Header {
        &self.document.header
    }

    /// Look up an object by its full instance name.
    pub fn get(&self, instance_name: &str) -> Option<&GameObject> {
        self.by_instance
            .get(instance_name)
            .and_then(|slot| self.at(*slot))
    }

    /// The circuit that lists `component_path` as a member.
    pub fn circuit_for(&self, component_path: &str) -> Option<&GameObject> {
        self.circuit_of
            .get(component_path)
            .and_then(|slot| self.at(*slot))
    }

    /// The `mCircuitID` of the circuit owning `component_path`, or
    /// [`NO_CIRCUIT`] if the component is not registered or its circuit has
    /// no id.
    pub fn circuit_id(&self, component_path: &str) -> i32 {
        self.circuit_for(component_path)
            .and_then(|circuit| circuit.properties().int32(CIRCUIT_ID_PROPERTY))
            .map_or(NO_CIRCUIT, |id| id.value)
    }

    /// Every indexed object, one per instance name, in document order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.document
            .levels
            .values()
            .enumerate()
            .flat_map(|(level, entries)| {
                entries
                    .objects
                    .iter()
                    .enumerate()
                    .map(move |(object, entity)| (Slot { level, object }, entity))
            })
            .filter(|(slot, entity)| self.by_instance.get(entity.instance_name()) == Some(slot))
            .map(|(_, entity)| entity)
    }

    /// Number of distinct instance names.
    pub fn object_count(&self) -> usize {
        self.by_instance.len()
    }

    /// Number of component paths registered to a circuit.
    pub fn circuit_member_count(&self) -> usize {
        self.circuit_of.len()
    }

    /// Indexed objects whose type path is the power circuit type.
    pub fn circuits(&self) -> impl Iterator<Item = &GameObject> {
        self.objects()
            .filter(|entity| entity.type_path() == POWER_CIRCUIT_TYPE)
    }

    /// Count indexed objects by simple type.
    pub fn type_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for entity in self.objects() {
            *counts.entry(entity.simple_type()).or_default() += 1;
        }
        counts
    }

    fn at(&self, slot: Slot) -> Option<&GameObject> {
        let (_, level) = self.document.levels.get_index(slot.level)?;
        level.objects.get(slot.object)
    }
}
