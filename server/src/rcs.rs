//! Reaction control system: low-thrust precision manoeuvring
//!
//! While precision mode is on, four side thrusters mounted at fixed angles
//! around the hull bleed off unwanted drift every frame, and a rotational
//! thruster damps spin. Thrust allocation is a pluggable strategy behind
//! [`ThrusterAllocator`]; the reference strategy solves a small linear
//! program, a greedy heuristic is available as a cheaper alternative.

use shared::{RcsSnapshot, TurnDirection, Vector2, RCS_MAX_ROTATIONAL_THRUST, RCS_MAX_THRUST};
use std::f64::consts::PI;

pub const THRUSTER_COUNT: usize = 4;

/// Mounting angles relative to the ship's heading.
pub const THRUSTER_ANGLES: [f64; THRUSTER_COUNT] = [0.0, PI / 2.0, PI, 3.0 * PI / 2.0];

/// Velocity components smaller than this are treated as exactly zero.
pub const EXCESS_EPSILON: f32 = 1e-6;

const PIVOT_EPSILON: f64 = 1e-12;
const MAX_PIVOTS: usize = 64;

/// Fixed bank of side thrusters for one frame's allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrusterBank {
    pub heading: f32,
    pub max_thrust: f32,
}

impl ThrusterBank {
    pub fn new(heading: f32) -> Self {
        Self {
            heading,
            max_thrust: RCS_MAX_THRUST,
        }
    }

    /// World-frame unit push of each thruster.
    pub fn directions(&self) -> [(f64, f64); THRUSTER_COUNT] {
        let mut out = [(0.0, 0.0); THRUSTER_COUNT];
        for (slot, offset) in out.iter_mut().zip(THRUSTER_ANGLES) {
            let angle = self.heading as f64 + offset;
            *slot = (angle.cos(), angle.sin());
        }
        out
    }

    pub fn net_force(&self, thrusts: &[f32; THRUSTER_COUNT]) -> Vector2 {
        let (mut x, mut y) = (0.0f64, 0.0f64);
        for ((dx, dy), t) in self.directions().iter().zip(thrusts) {
            x += dx * *t as f64;
            y += dy * *t as f64;
        }
        Vector2::new(x as f32, y as f32)
    }
}

/// Chooses per-thruster magnitudes that move velocity by at most
/// `correction` on each axis without crossing zero.
pub trait ThrusterAllocator: Send + Sync {
    fn allocate(&self, correction: Vector2, bank: &ThrusterBank) -> [f32; THRUSTER_COUNT];
}

/// Signed range `[lower, upper]` the combined push may take on one axis.
fn axis_bounds(correction: f32) -> (f64, f64) {
    let c = correction as f64;
    (c.min(0.0), c.max(0.0))
}

/// Reference allocator: maximise alignment-weighted thrust subject to
/// per-thruster and per-axis bounds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearProgramAllocator;

impl ThrusterAllocator for LinearProgramAllocator {
    fn allocate(&self, correction: Vector2, bank: &ThrusterBank) -> [f32; THRUSTER_COUNT] {
        let mut thrusts = [0.0; THRUSTER_COUNT];
        let unit = correction.normalize();
        if unit == Vector2::ZERO {
            return thrusts;
        }

        let directions = bank.directions();
        let objective: Vec<f64> = directions
            .iter()
            .map(|(dx, dy)| dx * unit.x as f64 + dy * unit.y as f64)
            .collect();

        let mut constraints: Vec<(Vec<f64>, f64)> = Vec::with_capacity(THRUSTER_COUNT + 4);
        for i in 0..THRUSTER_COUNT {
            let mut row = vec![0.0; THRUSTER_COUNT];
            row[i] = 1.0;
            constraints.push((row, bank.max_thrust as f64));
        }
        for (component, pick) in [
            (correction.x, 0usize),
            (correction.y, 1usize),
        ] {
            let (lower, upper) = axis_bounds(component);
            let row: Vec<f64> = directions
                .iter()
                .map(|(dx, dy)| if pick == 0 { *dx } else { *dy })
                .collect();
            let negated: Vec<f64> = row.iter().map(|v| -v).collect();
            constraints.push((row, upper));
            constraints.push((negated, -lower));
        }

        if let Some(solution) = simplex_maximize(&objective, &constraints) {
            for (slot, value) in thrusts.iter_mut().zip(solution) {
                *slot = (value as f32).clamp(0.0, bank.max_thrust);
            }
        }
        thrusts
    }
}

/// Greedy allocator: fire the best-aligned thrusters first, each as hard
/// as the remaining per-axis room allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestThrusterAllocator;

impl ThrusterAllocator for NearestThrusterAllocator {
    fn allocate(&self, correction: Vector2, bank: &ThrusterBank) -> [f32; THRUSTER_COUNT] {
        let mut thrusts = [0.0; THRUSTER_COUNT];
        let unit = correction.normalize();
        if unit == Vector2::ZERO {
            return thrusts;
        }

        let directions = bank.directions();
        let mut order: Vec<(usize, f64)> = directions
            .iter()
            .enumerate()
            .map(|(i, (dx, dy))| (i, dx * unit.x as f64 + dy * unit.y as f64))
            .filter(|(_, weight)| *weight > PIVOT_EPSILON)
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let (x_lower, x_upper) = axis_bounds(correction.x);
        let (y_lower, y_upper) = axis_bounds(correction.y);
        let (mut used_x, mut used_y) = (0.0f64, 0.0f64);

        for (i, _) in order {
            let (dx, dy) = directions[i];
            let mut t = bank.max_thrust as f64;
            t = t.min(room(dx, used_x, x_lower, x_upper));
            t = t.min(room(dy, used_y, y_lower, y_upper));
            if t <= 0.0 {
                continue;
            }
            used_x += dx * t;
            used_y += dy * t;
            thrusts[i] = t as f32;
        }
        thrusts
    }
}

/// Largest magnitude along `component` that keeps `used` inside the range.
fn room(component: f64, used: f64, lower: f64, upper: f64) -> f64 {
    if component > PIVOT_EPSILON {
        ((upper - used) / component).max(0.0)
    } else if component < -PIVOT_EPSILON {
        ((lower - used) / component).max(0.0)
    } else {
        f64::INFINITY
    }
}

/// Maximises `objective · x` subject to `row · x <= bound` for every
/// constraint and `x >= 0`. Every bound must be non-negative so the origin
/// is a feasible start. Pivoting follows Bland's rule, so identical inputs
/// always give identical output.
fn simplex_maximize(objective: &[f64], constraints: &[(Vec<f64>, f64)]) -> Option<Vec<f64>> {
    let n = objective.len();
    let m = constraints.len();
    let width = n + m + 1;

    let mut tableau = vec![vec![0.0; width]; m + 1];
    let mut basis: Vec<usize> = (n..n + m).collect();

    for (i, (row, bound)) in constraints.iter().enumerate() {
        if *bound < 0.0 {
            return None;
        }
        tableau[i][..n].copy_from_slice(row);
        tableau[i][n + i] = 1.0;
        tableau[i][width - 1] = *bound;
    }
    for (j, c) in objective.iter().enumerate() {
        tableau[m][j] = -c;
    }

    for _ in 0..MAX_PIVOTS {
        let Some(entering) = (0..n + m).find(|&j| tableau[m][j] < -PIVOT_EPSILON) else {
            break;
        };

        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..m {
            let coefficient = tableau[i][entering];
            if coefficient <= PIVOT_EPSILON {
                continue;
            }
            let ratio = tableau[i][width - 1] / coefficient;
            let better = match leaving {
                None => true,
                Some(current) => {
                    ratio < best_ratio - PIVOT_EPSILON
                        || ((ratio - best_ratio).abs() <= PIVOT_EPSILON
                            && basis[i] < basis[current])
                }
            };
            if better {
                leaving = Some(i);
                best_ratio = ratio;
            }
        }

        let pivot_row = leaving?;
        pivot(&mut tableau, pivot_row, entering);
        basis[pivot_row] = entering;
    }

    let mut solution = vec![0.0; n];
    for (i, &var) in basis.iter().enumerate() {
        if var < n {
            solution[var] = tableau[i][width - 1].max(0.0);
        }
    }
    Some(solution)
}

fn pivot(tableau: &mut [Vec<f64>], row: usize, column: usize) {
    let divisor = tableau[row][column];
    for value in tableau[row].iter_mut() {
        *value /= divisor;
    }
    let pivot_row = tableau[row].clone();
    for (i, other) in tableau.iter_mut().enumerate() {
        if i == row {
            continue;
        }
        let factor = other[column];
        if factor.abs() <= f64::EPSILON {
            continue;
        }
        for (value, p) in other.iter_mut().zip(&pivot_row) {
            *value -= factor * p;
        }
    }
}

/// Velocity the side thrusters should remove. Accelerating ships keep the
/// component along their heading; coasting ships shed everything.
pub fn excess_velocity(velocity: Vector2, heading: f32, accelerating: bool) -> Vector2 {
    let excess = if accelerating {
        let forward = Vector2::from_angle(heading);
        velocity.sub(&forward.scale(velocity.dot(&forward)))
    } else {
        velocity
    };
    Vector2::new(snap(excess.x), snap(excess.y))
}

fn snap(value: f32) -> f32 {
    if value.abs() < EXCESS_EPSILON {
        0.0
    } else {
        value
    }
}

/// Counter-spin from the rotational thruster. No correction while the
/// pilot is deliberately turning the way the ship already spins.
pub fn rotational_correction(rotation_velocity: f32, turn: TurnDirection) -> f32 {
    let turning_with_spin =
        turn != TurnDirection::None && turn.sign() * rotation_velocity > 0.0;
    if turning_with_spin {
        return 0.0;
    }
    (-rotation_velocity).clamp(-RCS_MAX_ROTATIONAL_THRUST, RCS_MAX_ROTATIONAL_THRUST)
}

/// Per-ship precision-control state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rcs {
    pub active: bool,
    pub thrusts: [f32; THRUSTER_COUNT],
    pub rotational_thrust: f32,
}

impl Rcs {
    /// Runs one frame of allocation and returns the velocity change the
    /// side thrusters produce.
    pub fn engage(
        &mut self,
        velocity: Vector2,
        heading: f32,
        accelerating: bool,
        allocator: &dyn ThrusterAllocator,
    ) -> Vector2 {
        let excess = excess_velocity(velocity, heading, accelerating);
        if excess == Vector2::ZERO {
            self.thrusts = [0.0; THRUSTER_COUNT];
            return Vector2::ZERO;
        }

        let bank = ThrusterBank::new(heading);
        self.thrusts = allocator.allocate(excess.scale(-1.0), &bank);
        bank.net_force(&self.thrusts)
    }

    pub fn disengage(&mut self) {
        self.active = false;
        self.thrusts = [0.0; THRUSTER_COUNT];
        self.rotational_thrust = 0.0;
    }

    pub fn snapshot(&self) -> RcsSnapshot {
        RcsSnapshot {
            active: self.active,
            thrusts: self.thrusts,
            rotational_thrust: self.rotational_thrust,
        }
    }
}
