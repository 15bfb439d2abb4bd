use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;

use crate::exposition;
use crate::power::PowerFact;

/// Label names shared by every power series, in exposition order.
pub const POWER_LABEL_NAMES: [&str; 5] = [
    "circuit",
    "building_id",
    "building_type",
    "building_name",
    "potential",
];

/// The exported power series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PowerSeries {
    /// Power produced by generators.
    Generation,
    /// Power drawn by consumers.
    Consumption,
    /// Maximum draw of consumers. Part of the label schema but not derived yet.
    MaxConsumption,
}

impl PowerSeries {
    /// Every series, in exposition order.
    pub const ALL: [PowerSeries; 3] = [Self::Generation, Self::Consumption, Self::MaxConsumption];

    /// Metric name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generation => "power_generation_mw",
            Self::Consumption => "power_consumption_mw",
            Self::MaxConsumption => "power_max_consumption_mw",
        }
    }

    /// Metric help text.
    pub fn help(self) -> &'static str {
        match self {
            Self::Generation => "Current power generation in MW",
            Self::Consumption => "Current power consumption in MW",
            Self::MaxConsumption => "Maximum power consumption capacity in MW",
        }
    }
}

impl fmt::Display for PowerSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Consumption => write!(f, "consumption"),
            Self::MaxConsumption => write!(f, "max consumption"),
        }
    }
}

/// The label set identifying one building's reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PowerLabels {
    /// Circuit id, `"-1"` when unknown.
    pub circuit: String,
    /// Short instance name of the building.
    pub building_id: String,
    /// Human-readable building type.
    pub building_type: String,
    /// Building name; currently the same as the type.
    pub building_name: String,
    /// Qualitative tag.
    pub potential: String,
}

impl PowerLabels {
    /// Label values in the order of [`POWER_LABEL_NAMES`].
    pub fn values(&self) -> [&str; 5] {
        [
            self.circuit.as_str(),
            self.building_id.as_str(),
            self.building_type.as_str(),
            self.building_name.as_str(),
            self.potential.as_str(),
        ]
    }
}

/// One gauge series: a value per label set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaugeVec {
    values: BTreeMap<PowerLabels, f64>,
}

impl GaugeVec {
    /// Set the value for a label set, replacing any earlier value.
    pub fn set(&mut self, labels: PowerLabels, value: f64) {
        self.values.insert(labels, value);
    }

    /// The value for a label set.
    pub fn get(&self, labels: &PowerLabels) -> Option<f64> {
        self.values.get(labels).copied()
    }

    /// Drop every value.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Number of label sets with a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate values ordered by label set.
    pub fn iter(&self) -> impl Iterator<Item = (&PowerLabels, f64)> {
        self.values.iter().map(|(labels, value)| (labels, *value))
    }
}

/// All power series together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerGauges {
    generation: GaugeVec,
    consumption: GaugeVec,
    max_consumption: GaugeVec,
}

impl PowerGauges {
    /// The gauge vector for a series.
    pub fn series(&self, series: PowerSeries) -> &GaugeVec {
        match series {
            PowerSeries::Generation => &self.generation,
            PowerSeries::Consumption => &self.consumption,
            PowerSeries::MaxConsumption => &self.max_consumption,
        }
    }

    /// Mutable access to the gauge vector for a series.
    pub fn series_mut(&mut self, series: PowerSeries) -> &mut GaugeVec {
        match series {
            PowerSeries::Generation => &mut self.generation,
            PowerSeries::Consumption => &mut self.consumption,
            PowerSeries::MaxConsumption => &mut self.max_consumption,
        }
    }

    /// Record a fact in its series.
    pub fn record(&mut self, fact: PowerFact) {
        self.series_mut(fact.series).set(fact.labels, fact.value_mw);
    }

    /// Clear every series.
    pub fn reset(&mut self) {
        for series in PowerSeries::ALL {
            self.series_mut(series).reset();
        }
    }

    /// Total number of values across all series.
    pub fn len(&self) -> usize {
        PowerSeries::ALL
            .into_iter()
            .map(|s| self.series(s).len())
            .sum()
    }

    /// Whether every series is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle to the exported power gauges.
///
/// Owned by the process and passed to whoever publishes or reads facts.
/// Readers always see either the previous fact set or the next one in full:
/// [`Registry::replace`] clears and repopulates under a single write lock.
#[derive(Debug, Default)]
pub struct Registry {
    gauges: RwLock<PowerGauges>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one value.
    pub fn set(&self, series: PowerSeries, labels: PowerLabels, value: f64) {
        self.gauges.write().series_mut(series).set(labels, value);
    }

    /// Clear every value.
    pub fn clear(&self) {
        self.gauges.write().reset();
    }

    /// Replace the whole fact set.
    pub fn replace(&self, facts: impl IntoIterator<Item = PowerFact>) {
        let mut next = PowerGauges::default();
        for fact in facts {
            next.record(fact);
        }
        *self.gauges.write() = next;
    }

    /// A copy of the current gauges.
    pub fn snapshot(&self) -> PowerGauges {
        self.gauges.read().clone()
    }

    /// Render the current gauges in the Prometheus text format.
    pub fn render(&self) -> String {
        exposition::render(&self.gauges.read())
    }
}
