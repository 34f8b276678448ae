use serde::Serialize;
use std::collections::HashSet;

use crate::models::{ScreenGeometry, SeatCoordinate, SeatTier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutSeat {
    pub seat_number: u32,
    pub is_booked: bool,
    pub tier: SeatTier,
    pub seat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRow {
    pub row: String,
    pub seats: Vec<LayoutSeat>,
}

/// Render the seat grid row by row, marking every seat in `occupied` as booked.
///
/// Pure: the same geometry and occupancy always give the same grid.
pub fn generate_layout(geometry: &ScreenGeometry, occupied: &HashSet<SeatCoordinate>) -> Vec<LayoutRow> {
    let rows = geometry.rows();

    (1..=rows)
        .map(|row_index| {
            let label = SeatCoordinate::row_label(row_index);
            let tier = SeatTier::for_row(row_index, rows);
            let seats = (1..=geometry.seats_per_row())
                .map(|seat_number| {
                    let coordinate = SeatCoordinate::new(label.clone(), seat_number);
                    LayoutSeat {
                        seat_number,
                        is_booked: occupied.contains(&coordinate),
                        tier,
                        seat_id: coordinate.key(),
                    }
                })
                .collect();
            LayoutRow { row: label, seats }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: u32, per_row: u32) -> ScreenGeometry {
        ScreenGeometry::new(rows, per_row).unwrap()
    }

    #[test]
    fn ten_by_ten_tiers() {
        let layout = generate_layout(&grid(10, 10), &HashSet::new());
        assert_eq!(layout.len(), 10);

        for row in &layout {
            assert_eq!(row.seats.len(), 10);
            let expected = match row.row.as_str() {
                "A" | "B" | "C" => SeatTier::Premium,
                "I" | "J" => SeatTier::Recliner,
                _ => SeatTier::Regular,
            };
            assert!(row.seats.iter().all(|s| s.tier == expected), "row {}", row.row);
        }
    }

    #[test]
    fn marks_only_occupied_seats() {
        let occupied: HashSet<_> = [SeatCoordinate::new("B", 3), SeatCoordinate::new("E", 1)].into();
        let layout = generate_layout(&grid(5, 4), &occupied);

        let booked: Vec<&str> = layout
            .iter()
            .flat_map(|r| r.seats.iter())
            .filter(|s| s.is_booked)
            .map(|s| s.seat_id.as_str())
            .collect();
        assert_eq!(booked, vec!["B3", "E1"]);
    }

    #[test]
    fn seat_ids_are_ordered_and_keyed() {
        let layout = generate_layout(&grid(2, 3), &HashSet::new());
        let ids: Vec<_> = layout.iter().flat_map(|r| r.seats.iter().map(|s| s.seat_id.clone())).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
    }

    #[test]
    fn deterministic() {
        let occupied: HashSet<_> = [SeatCoordinate::new("A", 2)].into();
        assert_eq!(generate_layout(&grid(4, 4), &occupied), generate_layout(&grid(4, 4), &occupied));
    }
}
