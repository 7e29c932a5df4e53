// Effect Interpretation
// Qualitative severity classification and casualty estimation from raw
// blast simulation output

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// =============================================================================
// SEVERITY CLASSIFICATION
// =============================================================================

// Threshold tables are scanned top-down; the first strictly-exceeded
// threshold wins, so a value sitting exactly on a boundary falls to the
// lower bucket. Thresholds follow Glasstone & Dolan style damage bands.

/// Structural damage description for a peak overpressure (kPa).
pub fn classify_blast(pressure_kpa: f64) -> &'static str {
    if pressure_kpa > 500.0 {
        "Total destruction of all structures"
    } else if pressure_kpa > 200.0 {
        "Reinforced concrete buildings destroyed"
    } else if pressure_kpa > 50.0 {
        "Residential buildings collapse"
    } else if pressure_kpa > 20.0 {
        "Glass windows shatter, moderate structural damage"
    } else if pressure_kpa > 5.0 {
        "Minor structural damage, broken windows"
    } else {
        "Minimal structural damage"
    }
}

/// Burn/ignition description for a thermal fluence (cal/cm²).
pub fn classify_thermal(energy_cal_per_cm2: f64) -> &'static str {
    if energy_cal_per_cm2 > 100.0 {
        "Third-degree burns, spontaneous ignition of materials"
    } else if energy_cal_per_cm2 > 25.0 {
        "Second-degree burns, clothing ignites"
    } else if energy_cal_per_cm2 > 10.0 {
        "First-degree burns, flammable materials ignite"
    } else if energy_cal_per_cm2 > 5.0 {
        "Painful burns, possible ignition of thin materials"
    } else {
        "Sunburn-like effects"
    }
}

/// Acute effect description for a prompt radiation dose (Sv).
pub fn classify_radiation(dose_sv: f64) -> &'static str {
    if dose_sv > 10.0 {
        "100% fatal within 48 hours"
    } else if dose_sv > 5.0 {
        "50% fatal within 30 days (LD50)"
    } else if dose_sv > 1.0 {
        "Radiation sickness, increased cancer risk"
    } else if dose_sv > 0.5 {
        "Temporary radiation sickness"
    } else {
        "Minimal acute effects"
    }
}

// =============================================================================
// POPULATION DENSITY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationDensityClass {
    Rural,
    Suburban,
    Urban,
    Dense,
}

impl PopulationDensityClass {
    /// Persons per km² for the class.
    pub fn density_per_km2(self) -> f64 {
        match self {
            Self::Rural => 10.0,
            Self::Suburban => 1000.0,
            Self::Urban => 10_000.0,
            Self::Dense => 50_000.0,
        }
    }
}

// =============================================================================
// CASUALTY ESTIMATION
// =============================================================================

/// Fraction of the population that fatalities saturate toward.
const FATALITY_CEILING: f64 = 0.7;
/// Overpressure (kPa) e-folding scale of the fatality response curve.
const FATALITY_DECAY_KPA: f64 = 50.0;
/// Fraction of the population that injuries saturate toward.
const INJURY_CEILING: f64 = 0.6;
/// Thermal fluence (cal/cm²) e-folding scale of the injury response curve.
const INJURY_DECAY_CAL: f64 = 15.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CasualtyEstimate {
    pub population: u64,
    pub fatalities: u64,
    pub injuries: u64,
    pub affected: u64,
}

impl CasualtyEstimate {
    pub fn fatalities_pct(&self) -> f64 {
        self.share(self.fatalities)
    }

    pub fn injuries_pct(&self) -> f64 {
        self.share(self.injuries)
    }

    pub fn affected_pct(&self) -> f64 {
        self.share(self.affected)
    }

    // Percentage of estimated population, clamped to [0,100]. An empty
    // population reports 0 rather than NaN.
    fn share(&self, count: u64) -> f64 {
        if self.population == 0 {
            return 0.0;
        }
        (count as f64 / self.population as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Apply the saturating response curves to a known population.
///
/// Negative physical inputs are clamped to zero before entering the
/// exponential, so counts are non-negative and monotone in the inputs.
pub fn estimate_for_population(
    population: u64,
    overpressure_kpa: f64,
    thermal_cal_per_cm2: f64,
) -> CasualtyEstimate {
    let overpressure = overpressure_kpa.max(0.0);
    let thermal = thermal_cal_per_cm2.max(0.0);

    let pop = population as f64;
    let fatalities =
        (pop * FATALITY_CEILING * (1.0 - (-overpressure / FATALITY_DECAY_KPA).exp())).floor()
            as u64;
    let injuries =
        (pop * INJURY_CEILING * (1.0 - (-thermal / INJURY_DECAY_CAL).exp())).floor() as u64;

    CasualtyEstimate {
        population,
        fatalities,
        injuries,
        // The individual curves stay below population, but their sum can
        // exceed u64 for a saturated population cast.
        affected: population.min(fatalities.saturating_add(injuries)),
    }
}

/// Estimate casualties inside the circle of the given radius around ground
/// zero, assuming a uniform density for the selected class.
///
/// The 1e6 divisor converts the m² disc area into km² before multiplying
/// the per-km² density.
pub fn estimate_casualties(
    overpressure_kpa: f64,
    thermal_cal_per_cm2: f64,
    distance_m: f64,
    density: PopulationDensityClass,
) -> CasualtyEstimate {
    let area_m2 = PI * distance_m * distance_m;
    let population = (area_m2 * density.density_per_km2() / 1e6).floor().max(0.0) as u64;
    estimate_for_population(population, overpressure_kpa, thermal_cal_per_cm2)
}
