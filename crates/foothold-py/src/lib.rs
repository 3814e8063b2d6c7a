//! # Foothold Python Bindings
//!
//! PyO3 bindings exposing the Foothold simulation core to a Python frontend.
//!
//! ## Usage
//!
//! ```python
//! import foothold
//! from foothold import Camp
//!
//! engine = foothold.PyEngine(seed=7)  # built-in test panel, default config
//!
//! # Player gesture: send half of node 0 to node 1
//! engine.order([0], 1, ratio=0.5)
//!
//! # Per rendered frame
//! engine.advance(16)
//! xy = engine.flight_positions()      # numpy float32, [x0, y0, x1, y1, ...]
//! for node in engine.node_snapshot():
//!     print(node.id, node.owner, node.value)
//! for event in engine.take_events():
//!     print(event.kind, event.at)
//!
//! # Raw dispatch accepts either the enum or a string
//! engine.dispatch(3, 2, Camp.RED, 5)
//! engine.dispatch(3, 2, "red", 5)
//! ```

use std::sync::Arc;

use numpy::{PyArray1, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use foothold_core::node::{Camp as CoreCamp, NodeId, NodeView};
use foothold_core::{Engine, EngineConfig, Event, EventLog, FlightView, GameResult, LevelDef};

/// Camp enum for Python.
///
/// # Python Usage
///
/// ```python
/// from foothold import Camp
///
/// engine.dispatch(0, 1, Camp.BLUE, 4)
/// ```
#[pyclass(name = "Camp", eq, eq_int, hash, frozen)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(non_camel_case_types, clippy::upper_case_acronyms)] // Python convention uses SCREAMING_SNAKE_CASE for enums
pub enum PyCamp {
    /// Player camp by default.
    BLUE,
    /// AI camp by default.
    RED,
    /// Unowned pool.
    NEUTRAL,
}

impl From<PyCamp> for CoreCamp {
    fn from(camp: PyCamp) -> Self {
        match camp {
            PyCamp::BLUE => CoreCamp::Blue,
            PyCamp::RED => CoreCamp::Red,
            PyCamp::NEUTRAL => CoreCamp::Neutral,
        }
    }
}

/// Accept either the Camp enum or its lowercase name.
#[derive(FromPyObject)]
enum CampOrStr {
    Camp(PyCamp),
    Str(String),
}

impl CampOrStr {
    fn into_camp(self) -> PyResult<CoreCamp> {
        match self {
            Self::Camp(camp) => Ok(camp.into()),
            Self::Str(name) => str_to_camp(&name),
        }
    }
}

fn str_to_camp(name: &str) -> PyResult<CoreCamp> {
    match name.to_lowercase().as_str() {
        "blue" => Ok(CoreCamp::Blue),
        "red" => Ok(CoreCamp::Red),
        "neutral" => Ok(CoreCamp::Neutral),
        other => Err(PyValueError::new_err(format!("unknown camp {other:?}"))),
    }
}

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Read-only node state for one frame.
#[pyclass(frozen)]
#[derive(Clone)]
pub struct PyNodeView {
    /// Node id.
    #[pyo3(get)]
    pub id: u32,
    /// Owner name: "blue", "red" or "neutral".
    #[pyo3(get)]
    pub owner: String,
    /// Troop value.
    #[pyo3(get)]
    pub value: f64,
}

impl From<&NodeView> for PyNodeView {
    fn from(view: &NodeView) -> Self {
        Self {
            id: view.id.as_u32(),
            owner: view.owner.to_string(),
            value: view.value,
        }
    }
}

#[pymethods]
impl PyNodeView {
    /// Whole troop count as displayed.
    #[getter]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn whole_value(&self) -> u32 {
        self.value.floor() as u32
    }

    fn __repr__(&self) -> String {
        format!(
            "NodeView(id={}, owner={}, value={:.2})",
            self.id, self.owner, self.value
        )
    }
}

/// Render state of one airborne unit.
#[pyclass(frozen)]
#[derive(Clone)]
pub struct PyFlightView {
    /// Unit id.
    #[pyo3(get)]
    pub id: u64,
    /// Owner name.
    #[pyo3(get)]
    pub owner: String,
    /// X position.
    #[pyo3(get)]
    pub x: f32,
    /// Y position.
    #[pyo3(get)]
    pub y: f32,
    /// Trip fraction in [0, 1].
    #[pyo3(get)]
    pub progress: f32,
}

impl From<&FlightView> for PyFlightView {
    fn from(view: &FlightView) -> Self {
        Self {
            id: view.id.as_u64(),
            owner: view.owner.to_string(),
            x: view.position.x,
            y: view.position.y,
            progress: view.progress,
        }
    }
}

#[pymethods]
impl PyFlightView {
    /// Get position as (x, y) tuple.
    #[getter]
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn __repr__(&self) -> String {
        format!(
            "FlightView(id={}, owner={}, x={:.2}, y={:.2}, progress={:.2})",
            self.id, self.owner, self.x, self.y, self.progress
        )
    }
}

/// One simulation event.
///
/// `kind` names the variant; `payload` is the full event as JSON.
#[pyclass(frozen)]
#[derive(Clone)]
pub struct PyEvent {
    /// "dispatched", "departed", "arrived", "collided", "captured" or "finished".
    #[pyo3(get)]
    pub kind: String,
    /// Event time in milliseconds.
    #[pyo3(get)]
    pub at: u64,
    /// JSON encoding of the event.
    #[pyo3(get)]
    pub payload: String,
}

impl From<&Event> for PyEvent {
    fn from(event: &Event) -> Self {
        let kind = match event {
            Event::Dispatched { .. } => "dispatched",
            Event::Departed { .. } => "departed",
            Event::Arrived { .. } => "arrived",
            Event::Collided { .. } => "collided",
            Event::Captured { .. } => "captured",
            Event::Finished { .. } => "finished",
        };
        Self {
            kind: kind.to_string(),
            at: event.at(),
            payload: serde_json::to_string(event).unwrap_or_default(),
        }
    }
}

#[pymethods]
impl PyEvent {
    fn __repr__(&self) -> String {
        format!("Event(kind={}, at={})", self.kind, self.at)
    }
}

/// Simulation engine wrapper for Python.
///
/// Every event is recorded and can be drained with `take_events()`.
#[pyclass]
pub struct PyEngine {
    inner: Engine,
    log: Arc<EventLog>,
}

#[pymethods]
impl PyEngine {
    /// Create an engine.
    ///
    /// Without `level_json` the built-in four-node test panel is used.
    /// `config_json` only needs the fields it overrides.
    #[new]
    #[pyo3(signature = (level_json=None, config_json=None, seed=0))]
    fn new(level_json: Option<&str>, config_json: Option<&str>, seed: u64) -> PyResult<Self> {
        let level = match level_json {
            Some(json) => LevelDef::from_json_str(json),
            None => LevelDef::test_panel(),
        }
        .map_err(value_error)?;
        let config = match config_json {
            Some(json) => EngineConfig::from_json_str(json).map_err(value_error)?,
            None => EngineConfig::default(),
        };

        let mut inner = Engine::new(level, config, seed).map_err(value_error)?;
        let log = Arc::new(EventLog::new());
        inner.subscribe(log.clone());
        Ok(Self { inner, log })
    }

    /// Raw dispatch. Returns the ids of the created units.
    fn dispatch(&mut self, from_id: u32, to_id: u32, owner: CampOrStr, amount: f64) -> PyResult<Vec<u64>> {
        let owner = owner.into_camp()?;
        let ids = self
            .inner
            .dispatch(NodeId::new(from_id), NodeId::new(to_id), owner, amount);
        Ok(ids.into_iter().map(|id| id.as_u64()).collect())
    }

    /// Validated player order from one or more sources.
    #[pyo3(signature = (from_ids, to_id, ratio=0.5))]
    fn order(&mut self, from_ids: Vec<u32>, to_id: u32, ratio: f64) -> PyResult<Vec<u64>> {
        let sources: Vec<NodeId> = from_ids.into_iter().map(NodeId::new).collect();
        let ids = self
            .inner
            .order(&sources, NodeId::new(to_id), ratio)
            .map_err(value_error)?;
        Ok(ids.into_iter().map(|id| id.as_u64()).collect())
    }

    /// Run every task up to `t` milliseconds.
    ///
    /// Releases the GIL during computation.
    fn advance_to(&mut self, py: Python, t: u64) {
        py.allow_threads(|| self.inner.advance_to(t));
    }

    /// Advance the clock by `dt` milliseconds.
    ///
    /// Releases the GIL during computation.
    fn advance(&mut self, py: Python, dt: u64) {
        py.allow_threads(|| self.inner.advance(dt));
    }

    /// Restore the level's initial state and start a new round now.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Current node states in id order.
    fn node_snapshot(&self) -> Vec<PyNodeView> {
        self.inner.node_snapshot().iter().map(PyNodeView::from).collect()
    }

    /// Airborne units at `now` (engine time by default).
    #[pyo3(signature = (now=None))]
    fn active_flight_units(&self, now: Option<u64>) -> Vec<PyFlightView> {
        let now = now.unwrap_or_else(|| self.inner.now());
        self.inner
            .active_flight_units(now)
            .iter()
            .map(PyFlightView::from)
            .collect()
    }

    /// Airborne unit positions as a flat float32 array `[x0, y0, x1, y1, ...]`.
    #[pyo3(signature = (now=None))]
    fn flight_positions<'py>(&self, py: Python<'py>, now: Option<u64>) -> Bound<'py, PyArray1<f32>> {
        let now = now.unwrap_or_else(|| self.inner.now());
        let flat: Vec<f32> = self
            .inner
            .active_flight_units(now)
            .iter()
            .flat_map(|view| [view.position.x, view.position.y])
            .collect();
        flat.to_pyarray(py)
    }

    /// "playing", "victory" or "defeat".
    fn result(&self) -> String {
        self.inner.result().to_string()
    }

    /// Winning camp once the round is over.
    #[getter]
    fn winner(&self) -> Option<String> {
        self.inner.winner().map(|camp| camp.to_string())
    }

    /// True once the round reached a terminal result.
    #[getter]
    fn finished(&self) -> bool {
        self.inner.result() != GameResult::Playing
    }

    /// Current time in milliseconds.
    #[getter]
    fn now(&self) -> u64 {
        self.inner.now()
    }

    /// Start of the current round in milliseconds.
    #[getter]
    fn round_started_at(&self) -> u64 {
        self.inner.round_started_at()
    }

    /// Active units, pending and airborne.
    #[getter]
    fn pending_flights(&self) -> usize {
        self.inner.pending_flights()
    }

    /// Drain recorded events in emission order.
    fn take_events(&self) -> Vec<PyEvent> {
        self.log.take_events().iter().map(PyEvent::from).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "PyEngine(level={:?}, now={}, result={}, flights={})",
            self.inner.level().name,
            self.inner.now(),
            self.inner.result(),
            self.inner.pending_flights()
        )
    }
}

/// Install a `tracing` subscriber printing core logs to stderr.
///
/// Returns False if a subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn enable_logging(level: &str) -> PyResult<bool> {
    let level: tracing::Level = level.parse().map_err(value_error)?;
    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok())
}

/// Python module definition.
#[pymodule]
fn _foothold(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEngine>()?;
    m.add_class::<PyCamp>()?;
    m.add_class::<PyNodeView>()?;
    m.add_class::<PyFlightView>()?;
    m.add_class::<PyEvent>()?;
    m.add_function(wrap_pyfunction!(enable_logging, m)?)?;
    Ok(())
}
