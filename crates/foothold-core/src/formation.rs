//! Flight-unit positions.
//!
//! A unit travels in a straight line from the source center to the target
//! center at constant speed. On top of that path each unit carries a
//! deterministic formation offset derived from its queue slot:
//!
//! - lateral: `(row - center) * lane_spacing + lane_bias` along the path normal
//! - forward: `-(|row - center| * chevron_depth + column_stagger)` along the path
//!
//! where `center = (rows_in_column - 1) / 2`. The offset fades in with a
//! smoothstep over the first `emit_spread` units of distance and fades out
//! linearly over the last `absorb_distance` units, so every unit leaves and
//! lands exactly on a node center. Collision detection runs on these offset
//! positions.

use glam::Vec2;

use crate::config::FormationConfig;
use crate::flight::FlightUnit;

/// Queue slot of one unit inside its cohort.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slot {
    /// Row inside the column.
    pub row: u32,
    /// Column index, also the departure order.
    pub col: u32,
    /// Rows actually filled in this column.
    pub rows_in_column: u32,
    /// Extra lateral shift, half a lane on odd columns.
    pub lane_bias: f32,
    /// Extra backward shift, cycling over three columns.
    pub column_stagger: f32,
}

impl Slot {
    /// Computes the slot of unit `index` in a cohort of `amount` units.
    ///
    /// Cohorts smaller than `small_threshold` fly as one column; larger
    /// cohorts use columns of `column_size`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_index(
        index: u32,
        amount: u32,
        column_size: u32,
        small_threshold: u32,
        formation: &FormationConfig,
    ) -> Self {
        let per_column = if amount < small_threshold {
            amount.max(1)
        } else {
            column_size.max(1)
        };
        let col = index / per_column;
        let row = index % per_column;
        let rows_in_column = per_column.min(amount - col * per_column);
        let lane_bias = if col % 2 == 1 {
            formation.lane_spacing * 0.5
        } else {
            0.0
        };
        let column_stagger = (col % 3) as f32 * formation.stagger_step;
        Self {
            row,
            col,
            rows_in_column,
            lane_bias,
            column_stagger,
        }
    }

    /// Lateral and forward offset before fading.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset(&self, formation: &FormationConfig) -> (f32, f32) {
        let center = (self.rows_in_column.saturating_sub(1)) as f32 / 2.0;
        let from_center = self.row as f32 - center;
        let lateral = from_center * formation.lane_spacing + self.lane_bias;
        let forward = -(from_center.abs() * formation.chevron_depth + self.column_stagger);
        (lateral, forward)
    }
}

/// Fraction of the trip completed at `now`, or `None` before departure.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn progress(unit: &FlightUnit, now: u64) -> Option<f32> {
    let elapsed = now.checked_sub(unit.departure_at())?;
    if unit.travel_ms() == 0 {
        return Some(1.0);
    }
    Some((elapsed as f32 / unit.travel_ms() as f32).min(1.0))
}

/// Offset position of `unit` at `now`, or `None` before departure.
#[must_use]
pub fn position(
    unit: &FlightUnit,
    from: Vec2,
    to: Vec2,
    now: u64,
    formation: &FormationConfig,
) -> Option<Vec2> {
    let t = progress(unit, now)?;
    Some(offset_position(&unit.slot(), from, to, t, formation))
}

/// Offset position on the `from -> to` path at progress `t` in `[0, 1]`.
#[must_use]
pub fn offset_position(
    slot: &Slot,
    from: Vec2,
    to: Vec2,
    t: f32,
    formation: &FormationConfig,
) -> Vec2 {
    let path = to - from;
    let length = path.length();
    let base = from + path * t;
    if length <= f32::EPSILON {
        return base;
    }

    let dir = path / length;
    let normal = dir.perp();
    let travelled = length * t;
    let remaining = length - travelled;

    let emit = fade(travelled, formation.emit_spread);
    let emit = emit * emit * (3.0 - 2.0 * emit);
    let absorb = fade(remaining, formation.absorb_distance);
    let weight = emit.min(absorb);

    let (lateral, forward) = slot.offset(formation);
    base + normal * (lateral * weight) + dir * (forward * weight)
}

fn fade(distance: f32, window: f32) -> f32 {
    if window <= 0.0 {
        1.0
    } else {
        (distance / window).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formation() -> FormationConfig {
        FormationConfig::default()
    }

    mod slot_tests {
        use super::*;

        #[test]
        fn small_cohort_is_one_column() {
            let slots: Vec<Slot> = (0..2)
                .map(|i| Slot::for_index(i, 2, 5, 3, &formation()))
                .collect();
            assert!(slots.iter().all(|s| s.col == 0 && s.rows_in_column == 2));
            assert_eq!(slots[1].row, 1);
        }

        #[test]
        fn larger_cohort_uses_columns_of_five() {
            let slot = Slot::for_index(11, 12, 5, 3, &formation());
            assert_eq!(slot.col, 2);
            assert_eq!(slot.row, 1);
            assert_eq!(slot.rows_in_column, 2);
        }

        #[test]
        fn three_units_share_a_column_of_three() {
            let slot = Slot::for_index(2, 3, 5, 3, &formation());
            assert_eq!(slot.col, 0);
            assert_eq!(slot.rows_in_column, 3);
        }

        #[test]
        fn odd_columns_are_biased_half_a_lane() {
            let even = Slot::for_index(0, 10, 5, 3, &formation());
            let odd = Slot::for_index(5, 10, 5, 3, &formation());
            assert_eq!(even.lane_bias, 0.0);
            assert_eq!(odd.lane_bias, 3.5);
            assert_eq!(odd.column_stagger, 1.5);
        }

        #[test]
        fn center_row_has_no_offset() {
            let slot = Slot::for_index(2, 5, 5, 3, &formation());
            assert_eq!(slot.offset(&formation()), (0.0, 0.0));
        }

        #[test]
        fn outer_rows_form_a_chevron() {
            let top = Slot::for_index(0, 5, 5, 3, &formation());
            let bottom = Slot::for_index(4, 5, 5, 3, &formation());
            let (lat_top, fwd_top) = top.offset(&formation());
            let (lat_bottom, fwd_bottom) = bottom.offset(&formation());
            assert_eq!(lat_top, -14.0);
            assert_eq!(lat_bottom, 14.0);
            assert_eq!(fwd_top, -8.0);
            assert_eq!(fwd_top, fwd_bottom);
        }
    }

    mod position_tests {
        use super::*;

        fn outer_slot() -> Slot {
            Slot::for_index(0, 5, 5, 3, &formation())
        }

        #[test]
        fn starts_and_ends_on_node_centers() {
            let from = Vec2::ZERO;
            let to = Vec2::new(400.0, 0.0);
            let start = offset_position(&outer_slot(), from, to, 0.0, &formation());
            let end = offset_position(&outer_slot(), from, to, 1.0, &formation());
            assert_eq!(start, from);
            assert_eq!(end, to);
        }

        #[test]
        fn midway_offset_is_full() {
            let from = Vec2::ZERO;
            let to = Vec2::new(400.0, 0.0);
            let mid = offset_position(&outer_slot(), from, to, 0.5, &formation());
            // normal of +x is +y; outer row sits 14 to the left and 8 behind
            assert!((mid.x - 192.0).abs() < 1e-4);
            assert!((mid.y + 14.0).abs() < 1e-4);
        }

        #[test]
        fn offset_fades_in_near_source() {
            let from = Vec2::ZERO;
            let to = Vec2::new(400.0, 0.0);
            // 18 of 36 emit distance travelled: smoothstep(0.5) = 0.5
            let near = offset_position(&outer_slot(), from, to, 18.0 / 400.0, &formation());
            assert!((near.y + 7.0).abs() < 1e-3);
        }

        #[test]
        fn coincident_nodes_do_not_produce_nan() {
            let p = Vec2::new(5.0, 5.0);
            let pos = offset_position(&outer_slot(), p, p, 0.5, &formation());
            assert_eq!(pos, p);
        }
    }
}
