//! Fleet generators used by scenarios and tests.

use super::incident::{Category, Incident};
use super::vehicle::{plate_for, Vehicle};

/// Builders for the vehicle sets a run starts from.
pub struct Fleet;

impl Fleet {
    /// `count` vehicles cycling Mechanical, Electrical, Bodywork.
    pub fn alternating(count: usize) -> Vec<Vehicle> {
        (0..count)
            .map(|i| {
                let category = Category::ALL[i % Category::ALL.len()];
                Self::vehicle(i + 1, category)
            })
            .collect()
    }

    /// `mechanical` Mechanical vehicles, then `electrical` Electrical, then
    /// `bodywork` Bodywork, with consecutive plates.
    pub fn by_category(mechanical: usize, electrical: usize, bodywork: usize) -> Vec<Vehicle> {
        let counts = [
            (Category::Mechanical, mechanical),
            (Category::Electrical, electrical),
            (Category::Bodywork, bodywork),
        ];
        counts
            .into_iter()
            .flat_map(|(category, n)| std::iter::repeat(category).take(n))
            .enumerate()
            .map(|(i, category)| Self::vehicle(i + 1, category))
            .collect()
    }

    fn vehicle(n: usize, category: Category) -> Vehicle {
        let incident_id = u32::try_from(n).unwrap_or(u32::MAX);
        Vehicle::new(plate_for(n), Incident::new(incident_id, category, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_cycles_categories() {
        let fleet = Fleet::alternating(5);
        let cats: Vec<_> = fleet.iter().map(Vehicle::category).collect();
        assert_eq!(
            cats,
            vec![
                Category::Mechanical,
                Category::Electrical,
                Category::Bodywork,
                Category::Mechanical,
                Category::Electrical,
            ]
        );
        assert_eq!(fleet[0].plate, "CAR001");
        assert_eq!(fleet[4].incident.id, 5);
    }

    #[test]
    fn by_category_groups_in_order() {
        let fleet = Fleet::by_category(2, 1, 3);
        assert_eq!(fleet.len(), 6);
        assert_eq!(fleet[1].category(), Category::Mechanical);
        assert_eq!(fleet[2].category(), Category::Electrical);
        assert_eq!(fleet[5].category(), Category::Bodywork);
        assert_eq!(fleet[5].plate, "CAR006");
    }

    #[test]
    fn empty_fleets() {
        assert!(Fleet::alternating(0).is_empty());
        assert!(Fleet::by_category(0, 0, 0).is_empty());
    }
}
