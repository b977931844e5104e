use serde::Serialize;
use thiserror::Error;

/// kg CO₂ per km driven.
pub const CAR_KG_PER_KM: f64 = 0.2;
/// kg CO₂ per meat meal.
pub const MEAT_KG_PER_MEAL: f64 = 5.0;
/// kg CO₂ per kWh of electricity.
pub const ELECTRICITY_KG_PER_KWH: f64 = 0.5;

/// Daily footprint in kg CO₂. Total over `car_km >= 0`, `electricity_kwh >= 0`.
pub fn compute(car_km: f64, meat_meals: u32, electricity_kwh: f64) -> f64 {
    car_km * CAR_KG_PER_KM
        + f64::from(meat_meals) * MEAT_KG_PER_MEAL
        + electricity_kwh * ELECTRICITY_KG_PER_KWH
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivityError {
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActivityLog {
    car_km: f64,
    meat_meals: u32,
    electricity_kwh: f64,
}

impl ActivityLog {
    pub fn new(car_km: f64, meat_meals: u32, electricity_kwh: f64) -> Result<Self, ActivityError> {
        Ok(Self {
            car_km: check_quantity("car_km", car_km)?,
            meat_meals,
            electricity_kwh: check_quantity("electricity_kwh", electricity_kwh)?,
        })
    }

    pub fn car_km(&self) -> f64 {
        self.car_km
    }

    pub fn meat_meals(&self) -> u32 {
        self.meat_meals
    }

    pub fn electricity_kwh(&self) -> f64 {
        self.electricity_kwh
    }

    pub fn with_car_km(self, car_km: f64) -> Result<Self, ActivityError> {
        Self::new(car_km, self.meat_meals, self.electricity_kwh)
    }

    pub fn with_meat_meals(self, meat_meals: u32) -> Self {
        Self { meat_meals, ..self }
    }

    pub fn with_electricity_kwh(self, electricity_kwh: f64) -> Result<Self, ActivityError> {
        Self::new(self.car_km, self.meat_meals, electricity_kwh)
    }

    pub fn estimate(&self) -> EmissionEstimate {
        EmissionEstimate {
            total_co2_kg: compute(self.car_km, self.meat_meals, self.electricity_kwh),
        }
    }

    /// Per-category emissions in chart order.
    pub fn breakdown(&self) -> [CategoryEmission; 3] {
        [
            CategoryEmission {
                label: "Car travel",
                co2_kg: self.car_km * CAR_KG_PER_KM,
            },
            CategoryEmission {
                label: "Meat meals",
                co2_kg: f64::from(self.meat_meals) * MEAT_KG_PER_MEAL,
            },
            CategoryEmission {
                label: "Electricity",
                co2_kg: self.electricity_kwh * ELECTRICITY_KG_PER_KWH,
            },
        ]
    }
}

fn check_quantity(field: &'static str, value: f64) -> Result<f64, ActivityError> {
    if !value.is_finite() {
        return Err(ActivityError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ActivityError::Negative { field, value });
    }
    // Normalise -0.0 so it renders as "0" in prompts.
    Ok(value + 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionEstimate {
    pub total_co2_kg: f64,
}

impl EmissionEstimate {
    pub fn display_kg(&self) -> String {
        format!("{:.2}", self.total_co2_kg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryEmission {
    pub label: &'static str,
    pub co2_kg: f64,
}

#[cfg(test)]
mod tests {
    use super::{compute, ActivityError, ActivityLog};

    const CAR_SAMPLES: &[f64] = &[0.0, 0.5, 1.0, 12.75, 480.0, 1.0e9];
    const MEAL_SAMPLES: &[u32] = &[0, 1, 3, 21, 100_000, u32::MAX];
    const KWH_SAMPLES: &[f64] = &[0.0, 0.25, 7.0, 33.3, 9_999.5, 1.0e12];

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() <= 1e-9 * left.abs().max(right.abs()).max(1.0)
    }

    #[test]
    fn zero_activity_emits_nothing() {
        assert_eq!(compute(0.0, 0, 0.0), 0.0);
        assert_eq!(ActivityLog::default().estimate().total_co2_kg, 0.0);
    }

    #[test]
    fn compute_matches_linear_formula_across_samples() {
        for &car in CAR_SAMPLES {
            for &meals in MEAL_SAMPLES {
                for &kwh in KWH_SAMPLES {
                    let expected = 0.2 * car + 5.0 * f64::from(meals) + 0.5 * kwh;
                    let got = compute(car, meals, kwh);
                    assert!(close(got, expected), "{car} {meals} {kwh}: {got} != {expected}");
                    assert!(got >= 0.0);
                }
            }
        }
    }

    #[test]
    fn compute_is_monotonic_in_each_argument() {
        for window in CAR_SAMPLES.windows(2) {
            assert!(compute(window[0], 2, 5.0) <= compute(window[1], 2, 5.0));
        }
        for window in MEAL_SAMPLES.windows(2) {
            assert!(compute(10.0, window[0], 5.0) <= compute(10.0, window[1], 5.0));
        }
        for window in KWH_SAMPLES.windows(2) {
            assert!(compute(10.0, 2, window[0]) <= compute(10.0, 2, window[1]));
        }
    }

    #[test]
    fn typical_day_estimate_and_breakdown() -> anyhow::Result<()> {
        let log = ActivityLog::new(10.0, 2, 5.0)?;
        let estimate = log.estimate();
        assert_eq!(estimate.total_co2_kg, 14.5);
        assert_eq!(estimate.display_kg(), "14.50");

        let breakdown = log.breakdown();
        let labels: Vec<&str> = breakdown.iter().map(|row| row.label).collect();
        assert_eq!(labels, vec!["Car travel", "Meat meals", "Electricity"]);
        assert_eq!(breakdown[0].co2_kg, 2.0);
        assert_eq!(breakdown[1].co2_kg, 10.0);
        assert_eq!(breakdown[2].co2_kg, 2.5);
        let summed: f64 = breakdown.iter().map(|row| row.co2_kg).sum();
        assert!(close(summed, estimate.total_co2_kg));
        Ok(())
    }

    #[test]
    fn display_rounds_without_touching_total() -> anyhow::Result<()> {
        let log = ActivityLog::new(0.333, 0, 0.0)?;
        let estimate = log.estimate();
        assert_eq!(estimate.display_kg(), "0.07");
        assert!(close(estimate.total_co2_kg, 0.0666));
        Ok(())
    }

    #[test]
    fn rejects_negative_and_non_finite_inputs() {
        assert_eq!(
            ActivityLog::new(-1.0, 0, 0.0),
            Err(ActivityError::Negative {
                field: "car_km",
                value: -1.0
            })
        );
        assert_eq!(
            ActivityLog::new(0.0, 0, f64::NAN),
            Err(ActivityError::NotFinite {
                field: "electricity_kwh"
            })
        );
        assert!(ActivityLog::new(f64::INFINITY, 0, 0.0).is_err());
    }

    #[test]
    fn setters_keep_other_fields() -> anyhow::Result<()> {
        let log = ActivityLog::default()
            .with_car_km(4.0)?
            .with_meat_meals(1)
            .with_electricity_kwh(2.0)?;
        assert_eq!(log, ActivityLog::new(4.0, 1, 2.0)?);
        assert!(log.with_car_km(-0.5).is_err());
        Ok(())
    }
}
