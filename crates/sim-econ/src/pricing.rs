//! Plan naming and list-price suggestion.

use crate::EconError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sim_core::{PlanLevel, Region, ServerId};

/// Resources a plan hands to each subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanShape {
    pub cpu_cores: u32,
    pub ram_gb: u32,
    pub disk_gb: u32,
    pub bandwidth_mbps: u32,
}

/// Everything needed to publish a plan on a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanSpec {
    pub node: ServerId,
    pub level: PlanLevel,
    pub name: String,
    pub shape: PlanShape,
    pub price_monthly: Decimal,
}

/// Conventional plan name, e.g. `HK PRO 2C4G`.
pub fn plan_name(region: Region, level: PlanLevel, shape: &PlanShape) -> String {
    format!(
        "{} {} {}C{}G",
        region.as_str(),
        level.as_str(),
        shape.cpu_cores,
        shape.ram_gb
    )
    .to_uppercase()
}

/// List price: $2 per core, $1 per GB RAM, $0.10 per GB disk and $0.01 per
/// Mbps, times the regional multiplier, rounded up to the cent.
pub fn suggested_price(region: Region, shape: &PlanShape) -> Result<Decimal, EconError> {
    if shape.cpu_cores == 0 || shape.ram_gb == 0 {
        return Err(EconError::EmptyShape);
    }
    let base = Decimal::from(shape.cpu_cores) * Decimal::from(2)
        + Decimal::from(shape.ram_gb)
        + Decimal::from(shape.disk_gb) * Decimal::new(1, 1)
        + Decimal::from(shape.bandwidth_mbps) * Decimal::new(1, 2);
    let price = base * region.price_multiplier();
    Ok(price.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero))
}

/// A ready-to-publish plan for `node` in `region`.
pub fn suggest_plan(
    node: ServerId,
    region: Region,
    level: PlanLevel,
    shape: PlanShape,
) -> Result<PlanSpec, EconError> {
    let price_monthly = suggested_price(region, &shape)?;
    Ok(PlanSpec {
        node,
        level,
        name: plan_name(region, level, &shape),
        shape,
        price_monthly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SHAPE: PlanShape = PlanShape {
        cpu_cores: 2,
        ram_gb: 4,
        disk_gb: 40,
        bandwidth_mbps: 300,
    };

    #[test]
    fn names_are_upper_case() {
        assert_eq!(plan_name(Region::HK, PlanLevel::Pro, &SHAPE), "HK PRO 2C4G");
        assert_eq!(plan_name(Region::US, PlanLevel::SE, &SHAPE), "US SE 2C4G");
    }

    #[test]
    fn regional_prices() {
        // base = 4 + 4 + 4 + 3 = 15
        assert_eq!(suggested_price(Region::US, &SHAPE).unwrap(), Decimal::from(15));
        assert_eq!(suggested_price(Region::HK, &SHAPE).unwrap(), Decimal::new(375, 1));
        assert_eq!(suggested_price(Region::SG, &SHAPE).unwrap(), Decimal::from(27));
    }

    #[test]
    fn rounds_up_to_the_cent() {
        let shape = PlanShape {
            cpu_cores: 1,
            ram_gb: 1,
            disk_gb: 1,
            bandwidth_mbps: 1,
        };
        // 3.11 * 1.5 = 4.665
        assert_eq!(suggested_price(Region::JP, &shape).unwrap(), Decimal::new(467, 2));
    }

    #[test]
    fn empty_shape_rejected() {
        let shape = PlanShape { cpu_cores: 0, ..SHAPE };
        assert_eq!(suggested_price(Region::US, &shape), Err(EconError::EmptyShape));
    }

    #[test]
    fn spec_carries_node() {
        let spec = suggest_plan(ServerId(3), Region::DE, PlanLevel::Max, SHAPE).unwrap();
        assert_eq!(spec.node, ServerId(3));
        assert_eq!(spec.name, "DE MAX 2C4G");
        assert_eq!(spec.price_monthly, Decimal::from(15));
    }

    proptest! {
        #[test]
        fn price_never_below_raw(cpu in 1u32..64, ram in 1u32..256, disk in 0u32..2000, bw in 0u32..10_000) {
            let shape = PlanShape { cpu_cores: cpu, ram_gb: ram, disk_gb: disk, bandwidth_mbps: bw };
            let raw = Decimal::from(cpu * 2 + ram);
            let price = suggested_price(Region::US, &shape).unwrap();
            prop_assert!(price >= raw);
            prop_assert!(price.scale() <= 2);
        }
    }
}
