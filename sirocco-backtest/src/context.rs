//! Incremental evaluation context.
//!
//! Evals are pure, composable computations over inputs. The context
//! memoizes every evaluated eval together with the transitive set of
//! inputs it touched; updating an input evicts exactly the memos that
//! depend on it. Folds over incremental sequences additionally keep their
//! accumulator and consumed length across invalidations, so an appended
//! sequence is folded from where the previous evaluation stopped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::SimulationError;
use crate::input::{Input, SeqItem, Value};

/// Failure raised by a user-provided eval function.
///
/// Never recovered by the context; it propagates as a fatal
/// [`SimulationError::Eval`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalFailure(pub String);

impl EvalFailure {
    /// Creates a failure from any displayable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Function body of a derived eval.
pub type DerivedFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalFailure> + Send + Sync>;

/// Step function of a fold eval.
pub type FoldFn = Arc<dyn Fn(Value, SeqItem) -> Result<Value, EvalFailure> + Send + Sync>;

/// Stable identifier of an eval's structural identity.
pub type EvalId = u64;

enum EvalNode {
    /// Reads the value bound to an input
    InputRef(Input),
    /// Deterministic function of other evals' values
    Derived {
        name: String,
        deps: Vec<Eval>,
        body: DerivedFn,
    },
    /// Fold over an incremental sequence with a resumable accumulator
    Fold {
        name: String,
        over: Eval,
        seed: Value,
        step: FoldFn,
    },
}

/// A node in the evaluation DAG.
///
/// Cheap to clone; two evals with the same structural identity (same
/// name and children, or the same input) share an id and therefore a
/// memo slot. Closures have no structural identity in Rust, so derived
/// and fold nodes carry an explicit name that stands in for it: the same
/// name with the same children must always denote the same computation.
#[derive(Clone)]
pub struct Eval {
    id: EvalId,
    node: Arc<EvalNode>,
}

impl Eval {
    /// Creates an eval that reads `input`.
    #[must_use]
    pub fn input(input: Input) -> Self {
        let mut hasher = StructuralHasher::new();
        hasher.write_str("input");
        hasher.write_u64(u64::from(input.kind_rank()));
        hasher.write_str(&input.key());
        Self {
            id: hasher.finish(),
            node: Arc::new(EvalNode::InputRef(input)),
        }
    }

    /// Creates a derived eval computing `body` over the values of `deps`.
    #[must_use]
    pub fn derived(
        name: impl Into<String>,
        deps: Vec<Eval>,
        body: impl Fn(&[Value]) -> Result<Value, EvalFailure> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let mut hasher = StructuralHasher::new();
        hasher.write_str("derived");
        hasher.write_str(&name);
        for dep in &deps {
            hasher.write_u64(dep.id);
        }
        Self {
            id: hasher.finish(),
            node: Arc::new(EvalNode::Derived {
                name,
                deps,
                body: Arc::new(body),
            }),
        }
    }

    /// Creates a fold eval over the sequence produced by `over`.
    #[must_use]
    pub fn fold(
        name: impl Into<String>,
        over: Eval,
        seed: Value,
        step: impl Fn(Value, SeqItem) -> Result<Value, EvalFailure> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let mut hasher = StructuralHasher::new();
        hasher.write_str("fold");
        hasher.write_str(&name);
        hasher.write_u64(over.id);
        Self {
            id: hasher.finish(),
            node: Arc::new(EvalNode::Fold {
                name,
                over,
                seed,
                step: Arc::new(step),
            }),
        }
    }

    /// Structural identity of this eval.
    #[must_use]
    pub fn id(&self) -> EvalId {
        self.id
    }

    /// Human-readable name of this eval.
    #[must_use]
    pub fn name(&self) -> String {
        match self.node.as_ref() {
            EvalNode::InputRef(input) => input.to_string(),
            EvalNode::Derived { name, .. } | EvalNode::Fold { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eval")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for Eval {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Eval {}

/// FNV-1a over the eval's structural shape. Stable across runs and
/// platforms, which keeps replays reproducible.
struct StructuralHasher {
    state: u64,
}

impl StructuralHasher {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET,
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.state ^= u64::from(byte);
        self.state = self.state.wrapping_mul(Self::PRIME);
    }

    fn write_str(&mut self, value: &str) {
        for byte in value.as_bytes() {
            self.write_byte(*byte);
        }
        self.write_byte(0xff);
    }

    fn write_u64(&mut self, value: u64) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte);
        }
    }

    fn finish(&self) -> u64 {
        self.state
    }
}

struct MemoEntry {
    value: Value,
    inputs: HashSet<Input>,
}

struct FoldState {
    accumulator: Value,
    consumed: usize,
}

/// Memoized evaluator with precise invalidation.
///
/// The context is value-like: the simulation environment owns it
/// exclusively and every update happens through `&mut self`, which is
/// observationally identical to returning a fresh context.
#[derive(Default)]
pub struct Context {
    bindings: HashMap<Input, Value>,
    memo: HashMap<EvalId, MemoEntry>,
    reverse: HashMap<Input, HashSet<EvalId>>,
    folds: HashMap<EvalId, FoldState>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value currently bound to `input`.
    #[must_use]
    pub fn binding(&self, input: &Input) -> Option<&Value> {
        self.bindings.get(input)
    }

    /// Binds `input` to `value`, invalidating exactly the memoized evals
    /// whose transitive dependency set contains `input`.
    ///
    /// Fold resume state survives invalidation: sequences are append-only,
    /// so a fold re-evaluates only the appended tail.
    pub fn update_input(&mut self, input: Input, value: Value) {
        if let Some(dependents) = self.reverse.get(&input) {
            for id in dependents {
                self.memo.remove(id);
            }
        }
        self.bindings.insert(input, value);
    }

    /// Evaluates `eval`, memoizing the result.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InputNotBound` if an input reference has
    /// no binding, and `SimulationError::Eval` if a user eval fails.
    pub fn evaluate(&mut self, eval: &Eval) -> Result<Value, SimulationError> {
        self.evaluate_with_deps(eval).map(|(value, _)| value)
    }

    fn evaluate_with_deps(
        &mut self,
        eval: &Eval,
    ) -> Result<(Value, HashSet<Input>), SimulationError> {
        if let Some(entry) = self.memo.get(&eval.id) {
            return Ok((entry.value.clone(), entry.inputs.clone()));
        }

        let (value, inputs) = match eval.node.as_ref() {
            EvalNode::InputRef(input) => {
                let value = self
                    .bindings
                    .get(input)
                    .cloned()
                    .ok_or_else(|| SimulationError::InputNotBound(input.to_string()))?;
                let mut inputs = HashSet::new();
                inputs.insert(input.clone());
                (value, inputs)
            }
            EvalNode::Derived { name, deps, body } => {
                let name = name.clone();
                let deps = deps.clone();
                let body = Arc::clone(body);
                let mut values = Vec::with_capacity(deps.len());
                let mut inputs = HashSet::new();
                for dep in &deps {
                    let (value, dep_inputs) = self.evaluate_with_deps(dep)?;
                    values.push(value);
                    inputs.extend(dep_inputs);
                }
                let value = body(&values).map_err(|failure| SimulationError::Eval {
                    name,
                    reason: failure.0,
                })?;
                (value, inputs)
            }
            EvalNode::Fold {
                name,
                over,
                seed,
                step,
            } => {
                let name = name.clone();
                let over = over.clone();
                let seed = seed.clone();
                let step = Arc::clone(step);
                let (sequence, inputs) = self.evaluate_with_deps(&over)?;
                let len = sequence
                    .sequence_len()
                    .ok_or_else(|| SimulationError::Eval {
                        name: name.clone(),
                        reason: format!(
                            "fold target produced non-sequence value '{}'",
                            sequence.type_name()
                        ),
                    })?;

                // Resume from the previous accumulator when the sequence
                // only grew; a shorter sequence means the binding was
                // replaced, so start over from the seed.
                let state = self
                    .folds
                    .remove(&eval.id)
                    .filter(|state| state.consumed <= len);
                let (mut accumulator, consumed) = match state {
                    Some(state) => (state.accumulator, state.consumed),
                    None => (seed, 0),
                };
                for index in consumed..len {
                    let item = sequence.sequence_item(index).ok_or_else(|| {
                        SimulationError::Internal(format!(
                            "sequence item {index} missing during fold '{name}'"
                        ))
                    })?;
                    accumulator =
                        step(accumulator, item).map_err(|failure| SimulationError::Eval {
                            name: name.clone(),
                            reason: failure.0,
                        })?;
                }
                self.folds.insert(
                    eval.id,
                    FoldState {
                        accumulator: accumulator.clone(),
                        consumed: len,
                    },
                );
                (accumulator, inputs)
            }
        };

        for input in &inputs {
            self.reverse
                .entry(input.clone())
                .or_default()
                .insert(eval.id);
        }
        self.memo.insert(
            eval.id,
            MemoEntry {
                value: value.clone(),
                inputs: inputs.clone(),
            },
        );
        Ok((value, inputs))
    }
}
