//! Measurement schema for Implexx sap flow sensors.
//!
//! One sensor is read through five command groups. Each group names the
//! trigger/read command pair that retrieves it, how long to wait between the
//! two, how many values the read returns, and which of those values are kept.
//! Variable names, units and record-table layout are all derived from this
//! table.

use alloc::vec::Vec;
use core::fmt::{self, Write};
use core::time::Duration;

use crate::common::timing::{ADDITIONAL_MEASURE_WAIT, NO_WAIT, STANDARD_MEASURE_WAIT};
use crate::common::{Command, GenerateError, Sdi12Addr, SchemaFault};

/// Longest alias suffix a data point may carry.
pub const MAX_ALIAS_LEN: usize = 8;

/// `S` + address + `_` + alias suffix.
pub const MAX_VAR_NAME_LEN: usize = 3 + MAX_ALIAS_LEN;

/// A program variable name. The capacity keeps names inside the logger's
/// identifier length limit.
pub type VarName = heapless::String<MAX_VAR_NAME_LEN>;

/// Unit label attached to a logged value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Ratio,
    Seconds,
    DegC,
}

impl Unit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Unit::Ratio => "ratio",
            Unit::Seconds => "sec",
            Unit::DegC => "degC",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value picked out of a group's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPoint {
    /// 0-based position in the response.
    pub response_index: u8,
    pub alias_suffix: &'static str,
    pub unit: Unit,
}

/// A trigger/read command pair and the values kept from its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandGroup {
    /// `None` is `aM!`, `Some(n)` is `aMn!`.
    pub measurement_index: Option<u8>,
    /// `n` in `aDn!`.
    pub data_index: u8,
    /// Delay between trigger and read. Zero means the group reads a
    /// measurement the previous group already triggered and waited for.
    pub wait: Duration,
    /// Number of values the read command returns.
    pub response_size: u8,
    pub data_points: &'static [DataPoint],
}

impl CommandGroup {
    pub fn trigger_command(&self, address: Sdi12Addr) -> Command {
        Command::StartMeasurement { address, measurement_index: self.measurement_index }
    }

    pub fn read_command(&self, address: Sdi12Addr) -> Command {
        Command::SendData { address, data_index: self.data_index }
    }

    /// True if this group reads the result of `previous`'s trigger instead of
    /// issuing its own.
    pub fn shares_trigger_with(&self, previous: &CommandGroup) -> bool {
        self.measurement_index == previous.measurement_index && self.wait == NO_WAIT
    }
}

const fn point(response_index: u8, alias_suffix: &'static str, unit: Unit) -> DataPoint {
    DataPoint { response_index, alias_suffix, unit }
}

/// The five command groups, in polling order.
pub static SAP_FLOW_SCHEMA: [CommandGroup; 5] = [
    // aM! / aD0!: total flow, SFD outer, SFD inner, alpha outer, alpha inner
    CommandGroup {
        measurement_index: None,
        data_index: 0,
        wait: STANDARD_MEASURE_WAIT,
        response_size: 5,
        data_points: &[point(3, "AlpOut", Unit::Ratio), point(4, "AlpInn", Unit::Ratio)],
    },
    // aM! / aD1!: beta outer, beta inner, tMaxT outer, tMaxT inner
    CommandGroup {
        measurement_index: None,
        data_index: 1,
        wait: NO_WAIT,
        response_size: 4,
        data_points: &[
            point(0, "BetOut", Unit::Ratio),
            point(1, "BetInn", Unit::Ratio),
            point(2, "tMxTout", Unit::Seconds),
            point(3, "tMxTinn", Unit::Seconds),
        ],
    },
    // aM1! / aD0!: outer needle temperatures
    CommandGroup {
        measurement_index: Some(1),
        data_index: 0,
        wait: ADDITIONAL_MEASURE_WAIT,
        response_size: 6,
        data_points: &[
            point(0, "TpDsOut", Unit::DegC),
            point(1, "dTDsOut", Unit::DegC),
            point(2, "TsDsOut", Unit::DegC),
            point(3, "TpUsOut", Unit::DegC),
            point(4, "dTUsOut", Unit::DegC),
            point(5, "TsUsOut", Unit::DegC),
        ],
    },
    // aM2! / aD0!: inner needle temperatures
    CommandGroup {
        measurement_index: Some(2),
        data_index: 0,
        wait: ADDITIONAL_MEASURE_WAIT,
        response_size: 6,
        data_points: &[
            point(0, "TpDsInn", Unit::DegC),
            point(1, "dTDsInn", Unit::DegC),
            point(2, "TsDsInn", Unit::DegC),
            point(3, "TpUsInn", Unit::DegC),
            point(4, "dTUsInn", Unit::DegC),
            point(5, "TsUsInn", Unit::DegC),
        ],
    },
    // aM5! / aD0!: upstream tMaxT, outer and inner
    CommandGroup {
        measurement_index: Some(5),
        data_index: 0,
        wait: ADDITIONAL_MEASURE_WAIT,
        response_size: 2,
        data_points: &[point(0, "tMxTUsO", Unit::Seconds), point(1, "tMxTUsI", Unit::Seconds)],
    },
];

/// Checks a schema for internal consistency.
///
/// Every response index must fall inside its group's response, every command
/// index must be one the protocol allows, and alias suffixes must be short
/// enough and unique across the whole schema so that no two variables of one
/// sensor collide.
pub fn check(schema: &[CommandGroup]) -> Result<(), GenerateError> {
    let fault = |group: usize, fault: SchemaFault| GenerateError::SchemaInconsistency { group, fault };
    let probe = Sdi12Addr::DEFAULT_ADDRESS;

    for (group_idx, group) in schema.iter().enumerate() {
        if group.data_points.is_empty() {
            return Err(fault(group_idx, SchemaFault::EmptyGroup));
        }
        if !group.trigger_command(probe).is_well_formed()
            || !group.read_command(probe).is_well_formed()
        {
            return Err(fault(group_idx, SchemaFault::InvalidCommandIndex));
        }

        for (point_idx, dp) in group.data_points.iter().enumerate() {
            if dp.response_index >= group.response_size {
                return Err(fault(
                    group_idx,
                    SchemaFault::IndexOutOfBounds { index: dp.response_index, size: group.response_size },
                ));
            }
            if dp.alias_suffix.is_empty() || dp.alias_suffix.len() > MAX_ALIAS_LEN {
                return Err(fault(group_idx, SchemaFault::AliasTooLong(dp.alias_suffix)));
            }

            let earlier_groups = schema[..group_idx].iter().flat_map(|g| g.data_points.iter());
            let earlier_in_group = group.data_points[..point_idx].iter();
            if earlier_groups
                .chain(earlier_in_group)
                .any(|other| other.alias_suffix == dp.alias_suffix)
            {
                return Err(fault(group_idx, SchemaFault::DuplicateAlias(dp.alias_suffix)));
            }
        }
    }
    Ok(())
}

/// Splits a schema into runs of groups served by one trigger command.
pub fn trigger_blocks(schema: &[CommandGroup]) -> impl Iterator<Item = &[CommandGroup]> {
    schema.chunk_by(|previous, next| next.shares_trigger_with(previous))
}

/// Distinct response sizes, ascending. One scratch buffer is declared per size.
pub fn response_sizes(schema: &[CommandGroup]) -> Vec<u8> {
    let mut sizes: Vec<u8> = schema.iter().map(|g| g.response_size).collect();
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}

/// Number of values logged per sensor.
pub fn points_per_sensor(schema: &[CommandGroup]) -> usize {
    schema.iter().map(|g| g.data_points.len()).sum()
}

/// A logged program variable, one per (sensor, data point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariable {
    pub name: VarName,
    pub unit: Unit,
}

impl GeneratedVariable {
    pub fn new(address: Sdi12Addr, point: &DataPoint) -> Result<Self, SchemaFault> {
        let mut name = VarName::new();
        write!(name, "S{}_{}", address, point.alias_suffix)
            .map_err(|_| SchemaFault::AliasTooLong(point.alias_suffix))?;
        Ok(Self { name, unit: point.unit })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Variables for one group of one sensor, in data point order.
pub fn group_variables(
    address: Sdi12Addr,
    group_idx: usize,
    group: &CommandGroup,
) -> Result<Vec<GeneratedVariable>, GenerateError> {
    group
        .data_points
        .iter()
        .map(|dp| {
            GeneratedVariable::new(address, dp)
                .map_err(|fault| GenerateError::SchemaInconsistency { group: group_idx, fault })
        })
        .collect()
}

/// All variables of one sensor, grouped by command group, then data point.
pub fn sensor_variables(
    address: Sdi12Addr,
    schema: &[CommandGroup],
) -> Result<Vec<GeneratedVariable>, GenerateError> {
    let mut vars = Vec::with_capacity(points_per_sensor(schema));
    for (group_idx, group) in schema.iter().enumerate() {
        vars.extend(group_variables(address, group_idx, group)?);
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(c: char) -> Sdi12Addr {
        Sdi12Addr::new(c).unwrap()
    }

    #[test]
    fn test_builtin_schema_is_consistent() {
        assert_eq!(check(&SAP_FLOW_SCHEMA), Ok(()));
    }

    #[test]
    fn test_builtin_schema_shape() {
        assert_eq!(points_per_sensor(&SAP_FLOW_SCHEMA), 20);
        assert_eq!(response_sizes(&SAP_FLOW_SCHEMA), vec![2, 4, 5, 6]);

        let wires: Vec<_> = SAP_FLOW_SCHEMA
            .iter()
            .map(|g| {
                (
                    g.trigger_command(addr('0')).to_string(),
                    g.read_command(addr('0')).to_string(),
                )
            })
            .collect();
        assert_eq!(
            wires,
            vec![
                ("0M!".to_string(), "0D0!".to_string()),
                ("0M!".to_string(), "0D1!".to_string()),
                ("0M1!".to_string(), "0D0!".to_string()),
                ("0M2!".to_string(), "0D0!".to_string()),
                ("0M5!".to_string(), "0D0!".to_string()),
            ]
        );
    }

    #[test]
    fn test_trigger_blocks_pair_standard_reads() {
        let blocks: Vec<_> = trigger_blocks(&SAP_FLOW_SCHEMA).map(|b| b.len()).collect();
        assert_eq!(blocks, vec![2, 1, 1, 1]);

        let first = trigger_blocks(&SAP_FLOW_SCHEMA).next().unwrap();
        assert_eq!(first[0].wait, STANDARD_MEASURE_WAIT);
        assert_eq!(first[1].data_index, 1);
    }

    #[test]
    fn test_same_trigger_with_own_wait_is_separate_block() {
        static SCHEMA: [CommandGroup; 2] = [
            CommandGroup {
                measurement_index: Some(1),
                data_index: 0,
                wait: ADDITIONAL_MEASURE_WAIT,
                response_size: 1,
                data_points: &[point(0, "A", Unit::Ratio)],
            },
            CommandGroup {
                measurement_index: Some(1),
                data_index: 0,
                wait: ADDITIONAL_MEASURE_WAIT,
                response_size: 1,
                data_points: &[point(0, "B", Unit::Ratio)],
            },
        ];
        assert_eq!(trigger_blocks(&SCHEMA).count(), 2);
    }

    #[test]
    fn test_check_rejects_index_out_of_bounds() {
        static SCHEMA: [CommandGroup; 1] = [CommandGroup {
            measurement_index: None,
            data_index: 0,
            wait: STANDARD_MEASURE_WAIT,
            response_size: 2,
            data_points: &[point(2, "Bad", Unit::Ratio)],
        }];
        assert_eq!(
            check(&SCHEMA),
            Err(GenerateError::SchemaInconsistency {
                group: 0,
                fault: SchemaFault::IndexOutOfBounds { index: 2, size: 2 },
            })
        );
    }

    #[test]
    fn test_check_rejects_duplicate_alias_across_groups() {
        static SCHEMA: [CommandGroup; 2] = [
            CommandGroup {
                measurement_index: None,
                data_index: 0,
                wait: STANDARD_MEASURE_WAIT,
                response_size: 1,
                data_points: &[point(0, "Same", Unit::Ratio)],
            },
            CommandGroup {
                measurement_index: Some(1),
                data_index: 0,
                wait: ADDITIONAL_MEASURE_WAIT,
                response_size: 1,
                data_points: &[point(0, "Same", Unit::DegC)],
            },
        ];
        assert_eq!(
            check(&SCHEMA),
            Err(GenerateError::SchemaInconsistency {
                group: 1,
                fault: SchemaFault::DuplicateAlias("Same"),
            })
        );
    }

    #[test]
    fn test_check_rejects_long_alias_and_bad_commands() {
        static LONG: [CommandGroup; 1] = [CommandGroup {
            measurement_index: None,
            data_index: 0,
            wait: STANDARD_MEASURE_WAIT,
            response_size: 1,
            data_points: &[point(0, "WayTooLong", Unit::Ratio)],
        }];
        assert!(matches!(
            check(&LONG),
            Err(GenerateError::SchemaInconsistency { fault: SchemaFault::AliasTooLong(_), .. })
        ));

        static BAD_CMD: [CommandGroup; 1] = [CommandGroup {
            measurement_index: Some(0),
            data_index: 0,
            wait: STANDARD_MEASURE_WAIT,
            response_size: 1,
            data_points: &[point(0, "X", Unit::Ratio)],
        }];
        assert_eq!(
            check(&BAD_CMD),
            Err(GenerateError::SchemaInconsistency {
                group: 0,
                fault: SchemaFault::InvalidCommandIndex,
            })
        );
    }

    #[test]
    fn test_sensor_variables_order_and_names() {
        let vars = sensor_variables(addr('b'), &SAP_FLOW_SCHEMA).unwrap();
        assert_eq!(vars.len(), 20);
        assert_eq!(vars[0].name(), "Sb_AlpOut");
        assert_eq!(vars[0].unit, Unit::Ratio);
        assert_eq!(vars[5].name(), "Sb_tMxTinn");
        assert_eq!(vars[5].unit, Unit::Seconds);
        assert_eq!(vars[6].name(), "Sb_TpDsOut");
        assert_eq!(vars[6].unit, Unit::DegC);
        assert_eq!(vars[19].name(), "Sb_tMxTUsI");
        assert!(vars.iter().all(|v| v.name().len() <= MAX_VAR_NAME_LEN));
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(Unit::Ratio.to_string(), "ratio");
        assert_eq!(Unit::Seconds.as_str(), "sec");
        assert_eq!(Unit::DegC.as_str(), "degC");
    }
}
