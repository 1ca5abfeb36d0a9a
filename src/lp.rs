//! Solver-independent linear program representation.
//!
//! A compiled [`LpModel`] is an immutable, shareable base (variables, bounds,
//! constraints, objective) plus a small overlay of extra constraints. Cloning
//! a model for a what-if run copies only the overlay; the base is shared
//! behind an [`Arc`] and never mutated.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, ReferenceKind, Result};

/// Handle to one model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lower and upper bound of a variable. Every variable is nonnegative
/// unless fixed to a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub const NONNEGATIVE: Bounds = Bounds {
        lower: 0.0,
        upper: f64::INFINITY,
    };

    pub fn fixed(value: f64) -> Self {
        Bounds {
            lower: value,
            upper: value,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

/// Sparse linear expression `Σ coeff × var`.
///
/// Terms on the same variable are merged, and iteration follows variable
/// order, so two expressions built from the same terms compare equal.
///
/// ```
/// use flowplan::lp::{LinearExpr, VariableIndex};
///
/// let index = VariableIndex::declare(["A"], ["R"]);
/// let a = index.intermediate("A").unwrap();
/// let r = index.recipe("R").unwrap();
///
/// let mut expr = LinearExpr::new().term(a, 1.0).term(r, 2.0);
/// expr.add(a, 0.5);
/// assert_eq!(expr.coefficient(a), 1.5);
/// assert_eq!(expr.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`LinearExpr::add`].
    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.add(var, coeff);
        self
    }

    pub fn add(&mut self, var: VarId, coeff: f64) {
        if coeff != 0.0 {
            *self.terms.entry(var).or_insert(0.0) += coeff;
        }
    }

    /// Adds `scale × other` to this expression.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for (&var, &coeff) in &other.terms {
            self.add(var, coeff * scale);
        }
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under a full variable assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values.get(var.0).copied().unwrap_or(0.0))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Le,
    Ge,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Eq => "==",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        })
    }
}

/// `lhs op rhs`, labeled for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub label: String,
    pub lhs: LinearExpr,
    pub op: Comparison,
    pub rhs: f64,
}

impl Constraint {
    pub fn eq(label: impl Into<String>, lhs: LinearExpr, rhs: f64) -> Self {
        Constraint {
            label: label.into(),
            lhs,
            op: Comparison::Eq,
            rhs,
        }
    }

    pub fn le(label: impl Into<String>, lhs: LinearExpr, rhs: f64) -> Self {
        Constraint {
            label: label.into(),
            lhs,
            op: Comparison::Le,
            rhs,
        }
    }

    /// `var == expr`, written as `expr - var == 0`.
    pub fn defines(label: impl Into<String>, var: VarId, expr: LinearExpr) -> Self {
        Constraint::eq(label, expr.term(var, -1.0), 0.0)
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.op {
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
            Comparison::Le => lhs <= self.rhs + tolerance,
            Comparison::Ge => lhs >= self.rhs - tolerance,
        }
    }
}

/// Variable family of a per-item or per-recipe variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    /// External supply fed into the chain
    Input,
    /// Final delivered amount
    Output,
    /// Balanced internal flow
    Intermediate,
    /// Recipe utilization (machine-count proxy)
    Recipe,
}

impl Family {
    fn symbol(self) -> &'static str {
        match self {
            Family::Input => "n",
            Family::Output => "x",
            Family::Intermediate => "i",
            Family::Recipe => "r",
        }
    }
}

/// Scalar cost aggregates tied to the flow variables by equalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aggregate {
    PowerUse,
    ItemUse,
    BuildingUse,
    ResourceUse,
    BuildingsScaled,
    ResourcesScaled,
    SinkPoints,
}

impl Aggregate {
    pub const ALL: [Aggregate; 7] = [
        Aggregate::PowerUse,
        Aggregate::ItemUse,
        Aggregate::BuildingUse,
        Aggregate::ResourceUse,
        Aggregate::BuildingsScaled,
        Aggregate::ResourcesScaled,
        Aggregate::SinkPoints,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Aggregate::PowerUse => "power_use",
            Aggregate::ItemUse => "item_use",
            Aggregate::BuildingUse => "building_use",
            Aggregate::ResourceUse => "resource_use",
            Aggregate::BuildingsScaled => "buildings_scaled",
            Aggregate::ResourcesScaled => "resources_scaled",
            Aggregate::SinkPoints => "sink_points",
        }
    }
}

/// Maps typed keys to variable handles.
///
/// Variables are declared once, up front; lookups of undeclared keys return
/// `None` (or an error through [`VariableIndex::require`]) instead of
/// creating new variables.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableIndex {
    families: BTreeMap<Family, BTreeMap<String, VarId>>,
    aggregates: BTreeMap<Aggregate, VarId>,
    names: Vec<String>,
}

impl VariableIndex {
    /// Declares input, output and intermediate variables per item, one
    /// utilization variable per recipe, and every aggregate.
    pub fn declare<'a, I, R>(items: I, recipes: R) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        R: IntoIterator<Item = &'a str>,
    {
        let items: Vec<&str> = items.into_iter().collect();
        let mut index = VariableIndex {
            families: BTreeMap::new(),
            aggregates: BTreeMap::new(),
            names: Vec::new(),
        };
        for family in [Family::Input, Family::Output, Family::Intermediate] {
            for item in &items {
                index.push(family, item);
            }
        }
        for recipe in recipes {
            index.push(Family::Recipe, recipe);
        }
        for aggregate in Aggregate::ALL {
            let id = VarId(index.names.len());
            index.names.push(aggregate.name().to_string());
            index.aggregates.insert(aggregate, id);
        }
        index
    }

    fn push(&mut self, family: Family, key: &str) {
        let id = VarId(self.names.len());
        self.names.push(format!("{}[{}]", family.symbol(), key));
        self.families
            .entry(family)
            .or_default()
            .insert(key.to_string(), id);
    }

    pub fn get(&self, family: Family, key: &str) -> Option<VarId> {
        self.families.get(&family).and_then(|f| f.get(key)).copied()
    }

    /// Like [`VariableIndex::get`], failing with a reference error.
    pub fn require(&self, family: Family, key: &str, kind: ReferenceKind) -> Result<VarId> {
        self.get(family, key).ok_or_else(|| Error::unknown(kind, key))
    }

    pub fn input(&self, item: &str) -> Option<VarId> {
        self.get(Family::Input, item)
    }

    pub fn output(&self, item: &str) -> Option<VarId> {
        self.get(Family::Output, item)
    }

    pub fn intermediate(&self, item: &str) -> Option<VarId> {
        self.get(Family::Intermediate, item)
    }

    pub fn recipe(&self, recipe: &str) -> Option<VarId> {
        self.get(Family::Recipe, recipe)
    }

    pub fn aggregate(&self, aggregate: Aggregate) -> VarId {
        self.aggregates[&aggregate]
    }

    /// Keys and handles of one family, in key order.
    pub fn entries(&self, family: Family) -> impl Iterator<Item = (&str, VarId)> + '_ {
        self.families
            .get(&family)
            .into_iter()
            .flat_map(|f| f.iter().map(|(k, &v)| (k.as_str(), v)))
    }

    /// Every handle, in declaration order.
    pub fn vars(&self) -> impl Iterator<Item = VarId> {
        (0..self.names.len()).map(VarId)
    }

    /// Diagnostic name such as `r[Recipe_IronPlate_C]`.
    pub fn name(&self, var: VarId) -> &str {
        &self.names[var.0]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Accumulates bounds, constraints and the objective by value.
///
/// Each step consumes the builder and hands it back, so there is no shared
/// constraint list that free functions append to behind the scenes.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    index: VariableIndex,
    bounds: Vec<Bounds>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl ModelBuilder {
    pub fn new(index: VariableIndex) -> Self {
        let bounds = vec![Bounds::NONNEGATIVE; index.len()];
        ModelBuilder {
            index,
            bounds,
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    pub fn index(&self) -> &VariableIndex {
        &self.index
    }

    /// Fixes a variable to a value.
    pub fn fix(mut self, var: VarId, value: f64) -> Self {
        self.bounds[var.0] = Bounds::fixed(value);
        self
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_all(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Sets the expression to minimize.
    pub fn minimize(mut self, objective: LinearExpr) -> Self {
        self.objective = objective;
        self
    }

    pub fn build(self) -> LpModel {
        LpModel {
            base: Arc::new(ModelBase {
                index: self.index,
                bounds: self.bounds,
                constraints: self.constraints,
                objective: self.objective,
            }),
            overlay: Vec::new(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct ModelBase {
    index: VariableIndex,
    bounds: Vec<Bounds>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

/// A compiled minimization problem over nonnegative continuous variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LpModel {
    base: Arc<ModelBase>,
    overlay: Vec<Constraint>,
}

impl LpModel {
    /// Variable declarations shared by the base and every clone.
    pub fn index(&self) -> &VariableIndex {
        &self.base.index
    }

    /// Bounds per variable, indexed by [`VarId::index`].
    pub fn bounds(&self) -> &[Bounds] {
        &self.base.bounds
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.base.objective
    }

    /// Base constraints followed by overlay constraints.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.base.constraints.iter().chain(&self.overlay)
    }

    /// Constraints added on top of the shared base.
    pub fn overlay(&self) -> &[Constraint] {
        &self.overlay
    }

    pub fn variable_count(&self) -> usize {
        self.base.bounds.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.base.constraints.len() + self.overlay.len()
    }

    /// A copy of this model with one more constraint. The base is shared.
    pub fn with_constraint(&self, constraint: Constraint) -> LpModel {
        let mut overlay = self.overlay.clone();
        overlay.push(constraint);
        LpModel {
            base: Arc::clone(&self.base),
            overlay,
        }
    }

    /// A copy of this model with `var` forced to zero.
    pub fn with_zero(&self, var: VarId) -> LpModel {
        let label = format!("{} == 0", self.index().name(var));
        self.with_constraint(Constraint::eq(label, LinearExpr::new().term(var, 1.0), 0.0))
    }

    /// Whether two models share the same immutable base.
    pub fn shares_base(&self, other: &LpModel) -> bool {
        Arc::ptr_eq(&self.base, &other.base)
    }

    /// Objective evaluated at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.base.objective.evaluate(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_families_in_order() {
        let index = VariableIndex::declare(["A", "B"], ["R1"]);
        // 2 items × 3 families + 1 recipe + 7 aggregates
        assert_eq!(index.len(), 14);
        assert_eq!(index.name(index.input("A").unwrap()), "n[A]");
        assert_eq!(index.name(index.recipe("R1").unwrap()), "r[R1]");
        assert_eq!(index.name(index.aggregate(Aggregate::SinkPoints)), "sink_points");
        assert!(index.output("C").is_none());
    }

    #[test]
    fn require_reports_the_kind() {
        let index = VariableIndex::declare(["A"], Vec::<&str>::new());
        let err = index.require(Family::Output, "Z", ReferenceKind::Output).unwrap_err();
        assert_eq!(err.to_string(), "unknown output item 'Z'");
    }

    #[test]
    fn zero_terms_are_dropped() {
        let index = VariableIndex::declare(["A"], Vec::<&str>::new());
        let a = index.intermediate("A").unwrap();
        let expr = LinearExpr::new().term(a, 0.0);
        assert!(expr.is_empty());
    }

    #[test]
    fn defines_moves_target_to_lhs() {
        let index = VariableIndex::declare(["A"], ["R"]);
        let r = index.recipe("R").unwrap();
        let power = index.aggregate(Aggregate::PowerUse);
        let c = Constraint::defines("power", power, LinearExpr::new().term(r, 4.0));

        let mut values = vec![0.0; index.len()];
        values[r.index()] = 2.0;
        values[power.index()] = 8.0;
        assert!(c.is_satisfied(&values, 1e-9));
        values[power.index()] = 7.0;
        assert!(!c.is_satisfied(&values, 1e-9));
    }

    #[test]
    fn clones_share_base_and_isolate_overlay() {
        let index = VariableIndex::declare(["A"], ["R1", "R2"]);
        let r1 = index.recipe("R1").unwrap();
        let r2 = index.recipe("R2").unwrap();
        let base = ModelBuilder::new(index).build();

        let first = base.with_zero(r1);
        let second = base.with_zero(r2);

        assert!(first.shares_base(&base));
        assert!(second.shares_base(&first));
        assert!(base.overlay().is_empty());
        assert_eq!(first.overlay().len(), 1);
        assert_eq!(first.overlay()[0].label, "r[R1] == 0");
        assert_eq!(second.overlay()[0].label, "r[R2] == 0");
        assert_eq!(first.constraint_count(), base.constraint_count() + 1);
    }
}
